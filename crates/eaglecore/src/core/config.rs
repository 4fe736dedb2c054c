use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: eagles_view.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "eagles_view.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: eagles_view.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "eagles_view.log".to_string()));

/// Root folder for uploaded media (catalogues live in `{MEDIA_ROOT}/catalogues`)
/// Read from MEDIA_ROOT environment variable
/// Supports tilde (~) expansion for home directory
pub static MEDIA_ROOT: Lazy<String> = Lazy::new(|| {
    let raw = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
    shellexpand::tilde(&raw).into_owned()
});

/// Chat that receives registration and payment notifications.
/// Read from ADMIN_CHAT_ID environment variable; notifications are disabled when unset.
pub static ADMIN_CHAT_ID: Lazy<Option<i64>> = Lazy::new(|| {
    env::var("ADMIN_CHAT_ID")
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
});

/// Network configuration for the Telegram Bot API client
pub mod network {
    use super::Duration;

    /// Timeout for Bot API requests (in seconds)
    pub const TELEGRAM_TIMEOUT_SECS: u64 = 60;

    pub fn timeout() -> Duration {
        Duration::from_secs(TELEGRAM_TIMEOUT_SECS)
    }
}

/// Payment gateway configuration
pub mod payment {
    use super::{env, Duration, Lazy};

    /// Paystack secret key (sent as a bearer token)
    pub static PAYSTACK_SECRET_KEY: Lazy<String> =
        Lazy::new(|| env::var("PAYSTACK_SECRET_KEY").unwrap_or_else(|_| String::new()));

    /// Paystack API base URL, overridable for sandboxes and tests
    pub static PAYSTACK_BASE_URL: Lazy<String> =
        Lazy::new(|| env::var("PAYSTACK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()));

    /// Currency sent with every initialize call
    pub static CURRENCY: Lazy<String> = Lazy::new(|| env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "NGN".to_string()));

    pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

    /// Default timeout for gateway HTTP calls (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Prefix of every payment reference we generate
    pub const REFERENCE_PREFIX: &str = "EV";

    /// Channels offered on the Paystack checkout page
    pub const CHANNELS: [&str; 4] = ["card", "bank", "ussd", "bank_transfer"];

    /// Gateway call timeout
    /// Read from PAYSTACK_TIMEOUT_SECS, falls back to 30 seconds
    pub fn timeout() -> Duration {
        let secs = env::var("PAYSTACK_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}

/// Registration session configuration
pub mod session {
    use super::{env, Duration};

    /// Idle time after which an unfinished draft is discarded (in seconds)
    pub const DEFAULT_TTL_SECS: u64 = 3600; // 1 hour

    /// How often the sweeper purges expired drafts (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes

    /// Draft idle expiry, read from SESSION_TTL_SECS
    pub fn ttl() -> Duration {
        let secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TTL_SECS);
        Duration::from_secs(secs)
    }

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Catalogue upload configuration
pub mod catalogue {
    use super::Duration;

    /// Sub-folder of MEDIA_ROOT where catalogues are stored
    pub const DIR_NAME: &str = "catalogues";

    /// Timeout for fetching a catalogue from Telegram (in seconds)
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

    pub fn download_timeout() -> Duration {
        Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)
    }
}

/// Validation configuration
pub mod validation {
    /// Minimum trimmed length of a business name
    pub const MIN_NAME_CHARS: usize = 3;

    /// Minimum trimmed length of a description
    pub const MIN_DESCRIPTION_CHARS: usize = 10;

    /// Descriptions are cut to this many characters before storing
    pub const MAX_DESCRIPTION_CHARS: usize = 500;

    /// Only catalogues with this extension are accepted
    pub const CATALOGUE_EXTENSION: &str = "pdf";

    /// Summary screen shows at most this much of the description
    pub const SUMMARY_DESCRIPTION_CHARS: usize = 100;
}

/// Directory search configuration
pub mod search {
    /// Shortest accepted search query
    pub const MIN_QUERY_CHARS: usize = 2;

    /// Maximum number of providers shown for one query
    pub const MAX_RESULTS: usize = 5;
}
