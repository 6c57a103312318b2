/// Transactional unit of work
///
/// Every operation that writes more than one row runs inside a
/// [`UnitOfWork`]. Model functions accept any `sqlx::PgExecutor`, so the same
/// query runs on the pool for reads and on [`UnitOfWork::conn`] inside a unit.
///
/// Only [`UnitOfWork::commit`] makes the writes visible. Dropping the unit
/// (an early `return` or a `?` on any error) rolls the transaction back.
///
/// # Example
///
/// ```no_run
/// use tgshop_shared::db::unit_of_work::UnitOfWork;
/// use tgshop_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut uow = UnitOfWork::begin(&pool).await?;
/// let balance = User::lock_balance(uow.conn(), 7).await?;
/// if balance.unwrap_or(0) >= 100 {
///     User::debit(uow.conn(), 7, 100).await?;
///     uow.commit().await?;
/// }
/// // not committed: rolled back here
/// # Ok(())
/// # }
/// ```

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;

/// Open transaction that commits only on request
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl UnitOfWork {
    /// Acquires a connection and opens a READ COMMITTED transaction
    pub async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let tx = pool.begin().await?;
        debug!("Unit of work started");
        Ok(Self { tx })
    }

    /// Executor for queries that belong to this unit
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Commits every write made through [`UnitOfWork::conn`]
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Rolls back explicitly
    ///
    /// Equivalent to dropping the unit, but waits for the server to
    /// acknowledge the rollback.
    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
