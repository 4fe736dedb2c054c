//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Payment configuration check at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the payment gateway configuration at application startup.
///
/// The secret itself is never printed, only whether it is present and
/// whether it looks like a live or a test key.
pub fn log_payment_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("💳 Payment Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let secret = config::payment::PAYSTACK_SECRET_KEY.as_str();
    if secret.is_empty() {
        log::error!("❌ PAYSTACK_SECRET_KEY: not set");
        log::error!("   Registrations will be saved but no payment link can be issued.");
    } else if secret.starts_with("sk_test_") {
        log::warn!("⚠️  PAYSTACK_SECRET_KEY: test key in use");
    } else {
        log::info!("✅ PAYSTACK_SECRET_KEY: configured");
    }

    log::info!("   Base URL: {}", config::payment::PAYSTACK_BASE_URL.as_str());
    log::info!("   Currency: {}", config::payment::CURRENCY.as_str());
    log::info!("   Timeout: {:?}", config::payment::timeout());

    match *config::ADMIN_CHAT_ID {
        Some(chat_id) => log::info!("   Admin notifications → chat {}", chat_id),
        None => log::warn!("⚠️  ADMIN_CHAT_ID not set, admin notifications disabled"),
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
