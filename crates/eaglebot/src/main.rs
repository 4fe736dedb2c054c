use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::{interval, sleep};

use eaglebot::cli::{Cli, Commands};
use eaglebot::telegram::{create_bot, schema, setup_bot_commands, Bot, HandlerDeps, TelegramFiles};
use eaglecore::core::{init_logger, log_payment_configuration};
use eaglecore::payment::{PaymentGateway, UnconfiguredGateway};
use eaglecore::storage::directory;
use eaglecore::{
    config, CatalogueStore, Directory, PaymentReconciler, PaystackClient, RegistrationService, SessionStore,
    VerifyOutcome,
};

/// Main entry point for the Eagles View bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present, before any config is read
    let _ = dotenv();

    // Log panics instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) => run_bot().await,
        Some(Commands::Approve { telegram_user_id }) => run_approve(telegram_user_id).await,
        Some(Commands::Suspend { telegram_user_id }) => run_suspend(telegram_user_id).await,
        Some(Commands::Verify { reference }) => run_verify(&reference).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

fn open_directory() -> Result<Directory> {
    Directory::open(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))
}

/// Gateway from PAYSTACK_* variables; without a key registrations still work
/// but no payment link is issued.
fn payment_gateway() -> Arc<dyn PaymentGateway> {
    match PaystackClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Paystack client unavailable: {}", e);
            Arc::new(UnconfiguredGateway)
        }
    }
}

/// Approve a provider: visible in search from now on
async fn run_approve(telegram_user_id: i64) -> Result<()> {
    let store = open_directory()?;
    let found = store
        .run(move |conn| {
            let approved = directory::set_provider_approval(conn, telegram_user_id, true)?;
            directory::set_provider_active(conn, telegram_user_id, true)?;
            Ok(approved)
        })
        .await?;

    if !found {
        return Err(anyhow::anyhow!("No provider registered by user {}", telegram_user_id));
    }
    log::info!("Provider of user {} approved", telegram_user_id);
    println!("✅ Provider of user {} approved", telegram_user_id);
    Ok(())
}

/// Suspend a provider: hidden from search, approval kept
async fn run_suspend(telegram_user_id: i64) -> Result<()> {
    let store = open_directory()?;
    let found = store
        .run(move |conn| Ok(directory::set_provider_active(conn, telegram_user_id, false)?))
        .await?;

    if !found {
        return Err(anyhow::anyhow!("No provider registered by user {}", telegram_user_id));
    }
    log::info!("Provider of user {} suspended", telegram_user_id);
    println!("⏸️  Provider of user {} suspended", telegram_user_id);
    Ok(())
}

/// Reconcile one payment with the gateway
async fn run_verify(reference: &str) -> Result<()> {
    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaystackClient::from_env()?);
    let reconciler = PaymentReconciler::new(open_directory()?, gateway);

    match reconciler.verify(reference).await? {
        VerifyOutcome::NotFound => println!("❌ No payment with reference {}", reference),
        VerifyOutcome::AlreadyVerified(payment) => {
            println!("✅ {} already verified at {:?}", payment.reference, payment.verified_at)
        }
        VerifyOutcome::Verified(payment) => println!(
            "🎉 {} verified, provider {} still needs approval",
            payment.reference, payment.provider_id
        ),
        VerifyOutcome::Failed(payment) => println!("❌ {} failed or was abandoned", payment.reference),
        VerifyOutcome::Pending { payment, gateway_error } => match gateway_error {
            Some(error) => println!("⏳ {} not checked: {}", payment.reference, error),
            None => println!("⏳ {} still pending", payment.reference),
        },
    }
    Ok(())
}

/// Waits until the Bot API answers getMe, retrying transient failures
async fn wait_for_bot_api(bot: &Bot) -> Result<()> {
    const STARTUP_MAX_RETRIES: u32 = 12;

    let mut attempt = 0;
    loop {
        match bot.get_me().await {
            Ok(me) => {
                log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);
                return Ok(());
            }
            Err(e) => {
                attempt += 1;
                if attempt >= STARTUP_MAX_RETRIES {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to Bot API after {} retries: {}",
                        attempt,
                        e
                    ));
                }
                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                    attempt,
                    STARTUP_MAX_RETRIES,
                    e
                );
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// Periodically drops registration drafts that went idle
fn spawn_session_sweeper(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut ticker = interval(config::session::sweep_interval());
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                log::info!("Session sweeper dropped {} expired registration(s)", purged);
            }
        }
    });
}

/// Run the Telegram bot
async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_payment_configuration();

    let bot = create_bot()?;
    wait_for_bot_api(&bot).await?;

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let store = open_directory()?;
    let gateway = payment_gateway();

    let sessions = SessionStore::from_env();
    spawn_session_sweeper(sessions.clone());

    let catalogues = Arc::new(CatalogueStore::new(&config::MEDIA_ROOT));
    let registration = RegistrationService::new(
        sessions,
        store.clone(),
        Arc::clone(&gateway),
        Arc::clone(&catalogues),
        Arc::new(TelegramFiles::new(bot.clone())?),
    );
    let reconciler = PaymentReconciler::new(store.clone(), gateway);
    let deps = HandlerDeps::new(registration, reconciler, store, catalogues);

    log::info!("📡 Ready to receive updates (long polling)");
    Dispatcher::builder(bot, schema(deps))
        .error_handler(LoggingErrorHandler::with_custom_text("An error has occurred in the dispatcher"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
