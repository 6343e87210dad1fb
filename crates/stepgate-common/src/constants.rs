//! Shared constants for Stepgate components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default Stepgate HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";

/// Default one-time code length
pub const DEFAULT_CODE_LENGTH: usize = 4;

/// Default login trigger count (1 = challenge every login)
pub const DEFAULT_LOGIN_TRIGGER_COUNT: u32 = 1;

/// Default one-time code validity (5 minutes)
pub const DEFAULT_CODE_TTL_SECS: u64 = 300;

/// Alphabet one-time codes are drawn from
pub const CODE_ALPHABET: &[u8] = b"0123456789";

/// Template context key the generated code is injected under.
/// Body templates must reference it as `{{code}}`.
pub const TEMPLATE_CODE_KEY: &str = "code";

/// Subject attribute names.
///
/// These match the attribute model of the external identity store, which
/// stores everything as strings.
pub mod attributes {
    /// Literal "true" disables step-up for the subject entirely
    pub const SKIP_STEP_UP: &str = "skip_mfa";

    /// Rolling login counter, stored as a decimal string
    pub const LOGIN_COUNT: &str = "number_of_login";
}

/// Redis key prefixes
pub mod redis_keys {
    /// Live one-time code: otp:{subject_id}
    pub const OTP_PREFIX: &str = "otp:";

    /// Synced subject record: subject:{subject_id}
    pub const SUBJECT_PREFIX: &str = "subject:";
}
