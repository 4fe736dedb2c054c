//! Eagles View core - provider registration, payments and directory storage
//!
//! Everything here is independent of Telegram; the bot crate only translates
//! updates into wizard events and replies into messages.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, plan table and text helpers
//! - `storage`: SQLite pool, migrations, directory records, catalogue files
//! - `registration`: the registration wizard and its session store
//! - `payment`: Paystack client, payment references, verification

pub mod core;
pub mod payment;
pub mod registration;
pub mod storage;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, PaymentStatus, PlanTier};
pub use payment::{PaymentGateway, PaymentReconciler, PaystackClient, VerifyOutcome};
pub use registration::{Event, RegistrationService, Reply, SessionStore, Step};
pub use storage::{CatalogueStore, Directory, FileFetcher};
