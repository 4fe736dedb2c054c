//! "I've paid" verification.
//!
//! Reconciles a local payment record with the gateway. A SUCCESS payment is
//! final: it is answered from the database without another gateway call.
//! Payment success never approves the provider; approval stays a separate
//! admin action.

use std::sync::Arc;

use crate::core::error::AppResult;
use crate::core::types::PaymentStatus;
use crate::payment::paystack::{GatewayStatus, PaymentGateway};
use crate::storage::db::Directory;
use crate::storage::directory::{self, Payment};

#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    /// No payment with this reference
    NotFound,
    AlreadyVerified(Payment),
    /// Gateway confirmed the payment just now
    Verified(Payment),
    /// Failed or abandoned at the gateway; the same checkout URL can be retried
    Failed(Payment),
    /// Not settled yet, or the gateway could not be asked. Status unchanged.
    Pending {
        payment: Payment,
        gateway_error: Option<String>,
    },
}

#[derive(Clone)]
pub struct PaymentReconciler {
    directory: Directory,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentReconciler {
    pub fn new(directory: Directory, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { directory, gateway }
    }

    async fn load(&self, reference: &str) -> AppResult<Option<Payment>> {
        let reference = reference.to_string();
        self.directory
            .run(move |conn| Ok(directory::get_payment(conn, &reference)?))
            .await
    }

    /// Stores the gateway's answer. `false` means the row was already SUCCESS.
    async fn store(&self, reference: &str, status: PaymentStatus, raw: serde_json::Value) -> AppResult<bool> {
        let reference = reference.to_string();
        self.directory
            .run(move |conn| directory::update_payment_status(conn, &reference, status, &raw))
            .await
    }

    pub async fn verify(&self, reference: &str) -> AppResult<VerifyOutcome> {
        let Some(payment) = self.load(reference).await? else {
            log::warn!("Verify: unknown payment reference {}", reference);
            return Ok(VerifyOutcome::NotFound);
        };

        if payment.status.is_terminal() {
            log::debug!("Verify: {} already verified, gateway not queried", reference);
            return Ok(VerifyOutcome::AlreadyVerified(payment));
        }

        let verification = match self.gateway.verify(reference).await {
            Ok(verification) => verification,
            Err(e) => {
                log::warn!("Verify: gateway error for {}: {}", reference, e);
                return Ok(VerifyOutcome::Pending {
                    payment,
                    gateway_error: Some(e.to_string()),
                });
            }
        };

        let new_status = match verification.status {
            GatewayStatus::Success => PaymentStatus::Success,
            GatewayStatus::Failed | GatewayStatus::Abandoned => PaymentStatus::Failed,
            GatewayStatus::Pending => {
                log::info!("Verify: {} still pending at gateway", reference);
                return Ok(VerifyOutcome::Pending {
                    payment,
                    gateway_error: None,
                });
            }
        };

        let updated = self.store(reference, new_status, verification.raw).await?;
        let current = self.load(reference).await?.unwrap_or(payment);

        if !updated {
            // A concurrent verify recorded SUCCESS first
            return Ok(VerifyOutcome::AlreadyVerified(current));
        }

        log::info!(
            "Verify: payment {} for provider {} is now {}",
            reference,
            current.provider_id,
            new_status
        );

        Ok(match new_status {
            PaymentStatus::Success => VerifyOutcome::Verified(current),
            _ => VerifyOutcome::Failed(current),
        })
    }
}
