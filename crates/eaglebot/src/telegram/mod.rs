//! Telegram bot integration and handlers

pub mod bot;
pub mod files;
pub mod notifications;
pub mod registration;
pub mod schema;
pub mod search;
pub mod types;

pub use teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use files::TelegramFiles;
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
