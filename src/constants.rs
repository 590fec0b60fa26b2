//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry policy constants
pub mod retry {
    /// Backoff multiplier applied per attempt
    pub const BACKOFF_MULTIPLIER: u32 = 2;

    /// Word detail lookup: retries after the first attempt
    pub const WORD_DETAILS_MAX_RETRIES: u32 = 3;

    /// Word detail lookup: first backoff delay (milliseconds)
    pub const WORD_DETAILS_INITIAL_DELAY_MS: u64 = 1000;

    /// Image lookup: retries after the first attempt
    pub const IMAGE_MAX_RETRIES: u32 = 2;

    /// Image lookup: first backoff delay (milliseconds)
    pub const IMAGE_INITIAL_DELAY_MS: u64 = 2000;
}

/// Quota cooldown constants
pub mod cooldown {
    /// How long AI calls stay paused after quota exhaustion (seconds)
    pub const DEFAULT_COOLDOWN_SECS: u64 = 15 * 60;
}

/// Generative-language service constants
pub mod gemini {
    /// REST endpoint root
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Text / JSON / chat model
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// Image generation model
    pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

    /// Environment variable consulted when no key is configured
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

    /// Transport timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
}

/// Notification display durations (milliseconds)
pub mod notify {
    pub const SHORT_DISPLAY_MS: u64 = 3000;
    pub const LONG_DISPLAY_MS: u64 = 6000;
}
