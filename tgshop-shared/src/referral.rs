/// Referral code generation
///
/// A referral code is the first eight hex digits (upper-cased) of
/// `SHA-256(telegram_id || hex(8 random bytes))`. The random salt makes codes
/// unguessable from the Telegram ID; uniqueness is enforced by the
/// `users.referral_code` constraint, not here.
///
/// # Example
///
/// ```
/// use tgshop_shared::referral::{generate_referral_code, is_well_formed};
///
/// let code = generate_referral_code(555);
/// assert!(is_well_formed(&code));
/// ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a referral code
pub const REFERRAL_CODE_LEN: usize = 8;

/// Random salt length in bytes
const SALT_LEN: usize = 8;

/// Generates a fresh referral code for a Telegram user
pub fn generate_referral_code(telegram_id: i64) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    derive_code(telegram_id, &salt)
}

fn derive_code(telegram_id: i64, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(telegram_id.to_string().as_bytes());
    hasher.update(hex::encode(salt).as_bytes());

    hex::encode(hasher.finalize())
        .chars()
        .take(REFERRAL_CODE_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Checks the `[0-9A-F]{8}` shape of a code
pub fn is_well_formed(code: &str) -> bool {
    code.len() == REFERRAL_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}

/// Cleans up a code typed or pasted by a user
///
/// Returns `None` for blank input, which is treated as "no code".
pub fn normalize(code: &str) -> Option<&str> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
