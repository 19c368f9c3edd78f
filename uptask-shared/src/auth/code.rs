/// One-time code generation
///
/// Confirmation and password-reset codes are six decimal digits, short
/// enough to type from an email. Only the SHA-256 digest of a code is
/// persisted.
///
/// # Example
///
/// ```
/// use uptask_shared::auth::code::{generate_code, hash_code, is_well_formed};
///
/// let code = generate_code();
/// assert!(is_well_formed(&code));
/// assert_eq!(hash_code(&code).len(), 64);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in a code
pub const CODE_LENGTH: usize = 6;

/// Minutes a code stays redeemable
pub const CODE_TTL_MINUTES: i64 = 10;

/// Generates a random six-digit code (never starts with zero)
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Hex SHA-256 digest of a code
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks the shape of a user-submitted code before touching the store
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}
