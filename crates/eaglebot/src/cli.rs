use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eaglebot")]
#[command(author, version, about = "Eagles View campus bot: provider registration and the Purple Board directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Approve a provider so it shows up in search
    Approve {
        /// Telegram user id of the provider's owner
        telegram_user_id: i64,
    },

    /// Hide a provider from search without deleting it
    Suspend {
        /// Telegram user id of the provider's owner
        telegram_user_id: i64,
    },

    /// Check a payment with the gateway and record the result
    Verify {
        /// Payment reference, e.g. EV-0A1B2C3D4E5F
        reference: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
