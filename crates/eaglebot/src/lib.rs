//! Eagles View bot - Telegram front end of the campus provider directory
//!
//! # Module Structure
//!
//! - `cli`: command line (run the bot, approve or suspend providers, verify payments)
//! - `telegram`: dispatcher schema, wizard adapter, notifications and search

pub mod cli;
pub mod telegram;
