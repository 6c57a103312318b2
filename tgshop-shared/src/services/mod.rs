/// Transactional business operations
///
/// Each service runs its writes inside one
/// [`crate::db::unit_of_work::UnitOfWork`]: either every row it touches is
/// committed or none is.
///
/// - `registration`: account creation and referral credit
/// - `checkout`: balance-paid orders

pub mod checkout;
pub mod registration;
