//! Paystack payment gateway client.
//!
//! Only two endpoints are used:
//! - `POST /transaction/initialize` returns the checkout (authorization) URL
//! - `GET /transaction/verify/{reference}` reports the transaction status
//!
//! Every failure (transport, HTTP status, `"status": false` envelopes,
//! unexpected bodies) comes back as a `GatewayError` value. A payment that
//! fails is an expected branch of the conversation, not a crash.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::core::config;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("could not reach payment gateway: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment gateway returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("payment gateway declined the request: {0}")]
    Rejected(String),

    #[error("unexpected payment gateway response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeRequest {
    pub email: String,
    pub amount_minor: i64,
    pub reference: String,
    pub currency: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// Gateway's view of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Failed,
    Abandoned,
    /// Still in progress, or the gateway has no record yet
    Pending,
}

impl GatewayStatus {
    fn from_paystack(status: &str) -> Self {
        match status {
            "success" => GatewayStatus::Success,
            "failed" => GatewayStatus::Failed,
            "abandoned" => GatewayStatus::Abandoned,
            _ => GatewayStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub status: GatewayStatus,
    /// Response body as received, stored on the payment record
    pub raw: Value,
}

/// The two gateway operations the registration flow depends on
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: &InitializeRequest) -> Result<Authorization, GatewayError>;

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError>;
}

/// Stand-in used when no secret key is configured: every call fails with
/// `NotConfigured`, so registrations are still saved without a payment link.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn initialize(&self, _request: &InitializeRequest) -> Result<Authorization, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn verify(&self, _reference: &str) -> Result<Verification, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: Option<String>,
    reference: String,
}

pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

impl PaystackClient {
    pub fn new(base_url: &str, secret_key: SecretString, timeout: Duration) -> Result<Self, GatewayError> {
        if secret_key.expose_secret().trim().is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("eagles-view-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    /// Client configured from PAYSTACK_SECRET_KEY, PAYSTACK_BASE_URL and
    /// PAYSTACK_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(
            &config::payment::PAYSTACK_BASE_URL,
            SecretString::from(config::payment::PAYSTACK_SECRET_KEY.clone()),
            config::payment::timeout(),
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.secret_key.expose_secret())
    }

    /// Reads a body as JSON; non-JSON bodies become `Malformed` (or `Http`
    /// when the status was already an error).
    async fn read_body(response: reqwest::Response) -> Result<(reqwest::StatusCode, Value), GatewayError> {
        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok((status, body)),
            Err(_) if !status.is_success() => Err(GatewayError::Http {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            }),
            Err(e) => Err(GatewayError::Malformed(e.to_string())),
        }
    }
}

fn envelope_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string()
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, request: &InitializeRequest) -> Result<Authorization, GatewayError> {
        let url = format!("{}/transaction/initialize", self.base_url);
        let payload = json!({
            "email": request.email,
            "amount": request.amount_minor,
            "reference": request.reference,
            "currency": request.currency,
            "channels": config::payment::CHANNELS,
            "metadata": request.metadata,
        });

        log::debug!("Paystack: initialize {} ({} minor units)", request.reference, request.amount_minor);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .json(&payload)
            .send()
            .await?;
        let (status, body) = Self::read_body(response).await?;

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message: envelope_message(&body),
            });
        }

        let envelope: Envelope = serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        if !envelope.status {
            return Err(GatewayError::Rejected(envelope.message));
        }

        let data: InitializeData =
            serde_json::from_value(envelope.data).map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(Authorization {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
        let url = format!("{}/transaction/verify/{}", self.base_url, reference);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        // No transaction yet: the user has not opened the checkout page
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let raw = response.json::<Value>().await.unwrap_or(Value::Null);
            return Ok(Verification {
                status: GatewayStatus::Pending,
                raw,
            });
        }

        let (status, body) = Self::read_body(response).await?;

        if !status.is_success() {
            let message = envelope_message(&body);
            if message.to_lowercase().contains("not found") {
                return Ok(Verification {
                    status: GatewayStatus::Pending,
                    raw: body,
                });
            }
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope =
            serde_json::from_value(body.clone()).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        if !envelope.status {
            if envelope.message.to_lowercase().contains("not found") {
                return Ok(Verification {
                    status: GatewayStatus::Pending,
                    raw: body,
                });
            }
            return Err(GatewayError::Rejected(envelope.message));
        }

        let transaction_status = envelope
            .data
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Malformed("transaction status missing".to_string()))?;

        Ok(Verification {
            status: GatewayStatus::from_paystack(transaction_status),
            raw: envelope.data,
        })
    }
}
