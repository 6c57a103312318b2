/// Registration and referral credit
///
/// Registration is idempotent per Telegram ID: the first call creates the
/// user with the starting balance, every later call returns the stored row
/// untouched. A valid referral code used at registration credits the
/// referrer once and leaves them a notification, in the same transaction as
/// the new user row.
///
/// # Example
///
/// ```no_run
/// use tgshop_shared::services::registration::{register, Registration};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = register(&pool, Registration {
///     telegram_id: 555,
///     referral_code: Some("0A1B2C3D".to_string()),
///     ..Default::default()
/// }).await?;
///
/// if outcome.created {
///     println!("welcome, {}", outcome.user.display_name());
/// }
/// # Ok(())
/// # }
/// ```

use crate::{
    db::unit_of_work::UnitOfWork,
    models::{
        notification::{CreateNotification, Notification, NotificationType},
        user::{CreateUser, User},
    },
    referral,
};
use sqlx::PgPool;
use tracing::{info, warn};

/// Balance granted to every new user
pub const STARTING_BALANCE: i64 = 1000;

/// Amount credited to a referrer per referred user
pub const REFERRAL_BONUS: i64 = 100;

const REFERRAL_CODE_CONSTRAINT: &str = "users_referral_code_key";

/// Error type for registration
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The generated referral code is already taken
    #[error("Referral code collision on {0}")]
    ReferralCodeCollision(String),

    /// The account vanished between the conflicting insert and the re-read
    #[error("User with telegram_id {0} could not be loaded")]
    Inconsistent(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Registration input (profile fields as sent by Telegram)
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,

    /// Code of the inviting user, if any
    pub referral_code: Option<String>,
}

/// Result of [`register`]
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub user: User,

    /// `false` when the Telegram ID was already registered
    pub created: bool,
}

/// Registers a Telegram user, or returns the existing account
///
/// # Errors
///
/// - `ReferralCodeCollision` if the freshly generated code already exists
///   (no retry is attempted)
/// - `Database` for any other store failure; nothing is committed
pub async fn register(
    pool: &PgPool,
    data: Registration,
) -> Result<RegistrationOutcome, RegistrationError> {
    if let Some(user) = User::find_by_telegram_id(pool, data.telegram_id).await? {
        return Ok(RegistrationOutcome {
            user,
            created: false,
        });
    }

    let referral_code = referral::generate_referral_code(data.telegram_id);

    let mut uow = UnitOfWork::begin(pool).await?;

    let referrer = match data.referral_code.as_deref().and_then(referral::normalize) {
        Some(code) if !referral::is_well_formed(code) => {
            warn!(telegram_id = data.telegram_id, code, "Malformed referral code ignored");
            None
        }
        Some(code) => {
            let found = User::find_by_referral_code(uow.conn(), code).await?;
            if found.is_none() {
                warn!(telegram_id = data.telegram_id, code, "Unknown referral code ignored");
            }
            found
        }
        None => None,
    };

    let inserted = User::create_if_absent(
        uow.conn(),
        CreateUser {
            telegram_id: data.telegram_id,
            username: data.username,
            first_name: data.first_name,
            last_name: data.last_name,
            photo_url: data.photo_url,
            referral_code: referral_code.clone(),
            referred_by_id: referrer.as_ref().map(|r| r.id),
            balance: STARTING_BALANCE,
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some(REFERRAL_CODE_CONSTRAINT) =>
        {
            RegistrationError::ReferralCodeCollision(referral_code.clone())
        }
        other => RegistrationError::Database(other),
    })?;

    let Some(user) = inserted else {
        // A concurrent registration won; drop our unit and return theirs.
        uow.rollback().await?;
        let user = User::find_by_telegram_id(pool, data.telegram_id)
            .await?
            .ok_or(RegistrationError::Inconsistent(data.telegram_id))?;
        return Ok(RegistrationOutcome {
            user,
            created: false,
        });
    };

    if let Some(referrer) = referrer {
        User::credit(uow.conn(), referrer.id, REFERRAL_BONUS).await?;

        Notification::create(
            uow.conn(),
            CreateNotification {
                user_id: referrer.id,
                title: "New referral!".to_string(),
                message: format!(
                    "{} signed up with your referral link. +{}₽",
                    user.display_name(),
                    REFERRAL_BONUS
                ),
                kind: NotificationType::Success,
            },
        )
        .await?;
    }

    uow.commit().await?;

    info!(
        user_id = user.id,
        telegram_id = user.telegram_id,
        referred_by_id = ?user.referred_by_id,
        "User registered"
    );

    Ok(RegistrationOutcome {
        user,
        created: true,
    })
}
