use thiserror::Error;

/// Centralized error types for the application
///
/// Infrastructure failures end up here. Business outcomes (validation
/// rejections, duplicate registrations, gateway refusals) are modelled as
/// values by the registration and payment modules instead.
///
/// # Example
///
/// ```no_run
/// use eaglecore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking database task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Stored data that could not be interpreted
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
