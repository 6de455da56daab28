//! Shared constants for Themis components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default registrar HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:65533";

/// Emailed verification code lifetime (5 minutes)
pub const EMAIL_CODE_TTL_SECS: u64 = 300;

/// Picture challenge lifetime (5 minutes)
pub const PICTURE_CODE_TTL_SECS: u64 = 300;

/// Digits in an emailed verification code
pub const EMAIL_CODE_LENGTH: usize = 6;

/// Characters in a picture challenge answer
pub const PICTURE_CODE_LENGTH: usize = 5;

/// Session token validity (24 hours)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;

/// bcrypt work factor for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Custom epoch for snowflake identifiers: 2024-01-01T00:00:00Z, in ms
pub const SNOWFLAKE_EPOCH_MS: i64 = 1_704_067_200_000;

/// Redis key prefixes
pub mod cache_keys {
    /// Emailed code: email_code:{email}
    pub const EMAIL_CODE_PREFIX: &str = "email_code:";

    /// Picture challenge answer: picture_code:{username}
    pub const PICTURE_CODE_PREFIX: &str = "picture_code:";
}
