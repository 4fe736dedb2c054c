//! Listing fee payments: Paystack client, references and verification

pub mod paystack;
pub mod reconciler;
pub mod reference;

pub use paystack::{GatewayError, GatewayStatus, PaymentGateway, PaystackClient, UnconfiguredGateway};
pub use reconciler::{PaymentReconciler, VerifyOutcome};
pub use reference::generate_reference;
