//! Registration conversation driver.
//!
//! Glues the session store, the pure wizard and the finalize sequence:
//! duplicate check, category, provider, catalogue, payment reference,
//! gateway initialize, payment record.

use serde_json::json;
use std::sync::Arc;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::types::PlanTier;
use crate::payment::paystack::{InitializeRequest, PaymentGateway};
use crate::payment::reference::generate_reference;
use crate::registration::draft::{CompletedRegistration, RegistrationDraft};
use crate::registration::machine::{transition, Event, Output, Step};
use crate::registration::prompts::{self, Reply};
use crate::registration::session::{Session, SessionStore};
use crate::storage::catalogue::{CatalogueStore, FileFetcher};
use crate::storage::db::Directory;
use crate::storage::directory::{self, NewPayment, NewProvider, PaymentInsert, ProviderInsert};

const REFERENCE_ATTEMPTS: usize = 5;

const PAYMENT_NOT_RECORDED: &str = "the payment could not be recorded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The user already owns a provider record; nothing was created
    AlreadyRegistered,
    /// Provider saved and a PENDING payment created
    PaymentReady {
        provider_id: i64,
        plan: PlanTier,
        reference: String,
        authorization_url: String,
    },
    /// Provider saved, but the gateway refused or failed; no payment record
    PaymentUnavailable {
        provider_id: i64,
        plan: PlanTier,
        error: String,
    },
}

impl FinalizeOutcome {
    pub fn reply(&self) -> Reply {
        match self {
            FinalizeOutcome::AlreadyRegistered => prompts::already_registered(),
            FinalizeOutcome::PaymentReady {
                plan,
                reference,
                authorization_url,
                ..
            } => prompts::payment_ready(*plan, reference, authorization_url),
            FinalizeOutcome::PaymentUnavailable { plan, error, .. } => prompts::payment_unavailable(*plan, error),
        }
    }
}

/// What one event produced
#[derive(Debug, Clone)]
pub struct Handled {
    pub reply: Reply,
    /// Set when this event completed a registration
    pub finalized: Option<(CompletedRegistration, FinalizeOutcome)>,
}

impl Handled {
    fn reply(reply: Reply) -> Self {
        Self { reply, finalized: None }
    }
}

#[derive(Clone)]
pub struct RegistrationService {
    sessions: SessionStore,
    directory: Directory,
    gateway: Arc<dyn PaymentGateway>,
    catalogues: Arc<CatalogueStore>,
    files: Arc<dyn FileFetcher>,
    currency: String,
}

impl RegistrationService {
    pub fn new(
        sessions: SessionStore,
        directory: Directory,
        gateway: Arc<dyn PaymentGateway>,
        catalogues: Arc<CatalogueStore>,
        files: Arc<dyn FileFetcher>,
    ) -> Self {
        Self {
            sessions,
            directory,
            gateway,
            catalogues,
            files,
            currency: config::payment::CURRENCY.clone(),
        }
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Whether `user_id` is in the middle of a registration
    pub async fn is_active(&self, user_id: i64) -> bool {
        self.sessions.get(user_id).await.is_some()
    }

    /// Feeds one user event through the wizard and returns the answer.
    pub async fn handle(&self, user_id: i64, event: Event) -> AppResult<Handled> {
        let current = self.sessions.get(user_id).await;
        let (state, draft) = match current {
            Some(session) => (Some(session.step), session.draft),
            None => (None, Default::default()),
        };
        let previous_draft = draft.clone();

        let next = transition(state, event, draft);

        match next.output {
            Output::Ask(step) => {
                let reply = prompts::ask(step, &next.draft);
                self.store(user_id, step, next.draft).await;
                Ok(Handled::reply(reply))
            }
            Output::Rejected { step, error } => {
                log::debug!("Registration of user {}: {:?} rejected at {:?}", user_id, error, step);
                let reply = prompts::rejected(step, error, &next.draft);
                self.store(user_id, step, next.draft).await;
                Ok(Handled::reply(reply))
            }
            Output::Cancelled => {
                self.sessions.remove(user_id).await;
                log::info!("Registration of user {} cancelled", user_id);
                Ok(Handled::reply(prompts::cancelled()))
            }
            Output::NoRegistration => Ok(Handled::reply(prompts::session_expired())),
            Output::Finalize(registration) => {
                // Claim the session first: a second Confirm click finds nothing
                if self.sessions.take(user_id).await.is_none() {
                    return Ok(Handled::reply(prompts::session_expired()));
                }

                match self.finalize(user_id, &registration).await {
                    Ok(outcome) => Ok(Handled {
                        reply: outcome.reply(),
                        finalized: Some((registration, outcome)),
                    }),
                    Err(e) => {
                        log::error!("Registration of user {} could not be saved: {}", user_id, e);
                        // Nothing was stored, Confirm can be retried
                        self.store(user_id, Step::Confirm, previous_draft).await;
                        Ok(Handled::reply(prompts::registration_error()))
                    }
                }
            }
        }
    }

    async fn store(&self, user_id: i64, step: Step, draft: RegistrationDraft) {
        self.sessions.put(user_id, Session { step, draft }).await;
    }

    /// Persists a confirmed registration and starts its payment.
    ///
    /// An error means nothing was saved and the registration can be
    /// confirmed again. Once the provider row exists every later failure is
    /// reported as `PaymentUnavailable`.
    pub async fn finalize(&self, user_id: i64, registration: &CompletedRegistration) -> AppResult<FinalizeOutcome> {
        let saved = {
            let registration = registration.clone();
            self.directory
                .run(move |conn| {
                    directory::create_provider(
                        conn,
                        &registration.category_name,
                        &NewProvider {
                            telegram_user_id: user_id,
                            name: &registration.name,
                            description: &registration.description,
                            keywords: &registration.keywords,
                            category_id: None,
                            plan: registration.plan,
                            phone: registration.phone.as_deref(),
                            telegram_handle: registration.telegram_handle.as_deref(),
                            instagram_handle: registration.instagram_handle.as_deref(),
                            hall_of_residence: registration.hall_of_residence.as_deref(),
                            email: &registration.email,
                        },
                    )
                })
                .await?
        };

        let provider_id = match saved {
            ProviderInsert::Created(id) => id,
            ProviderInsert::AlreadyRegistered => {
                log::info!("User {} tried to register twice", user_id);
                return Ok(FinalizeOutcome::AlreadyRegistered);
            }
        };
        log::info!(
            "Provider {} '{}' created for user {} ({})",
            provider_id,
            registration.name,
            user_id,
            registration.plan
        );

        if let Some(catalogue) = &registration.catalogue {
            let outcome = self
                .catalogues
                .save(self.files.as_ref(), user_id, &catalogue.file_id, &catalogue.file_name)
                .await;
            if let Some(path) = outcome.path() {
                let path = path.to_string();
                if let Err(e) = self
                    .directory
                    .run(move |conn| Ok(directory::set_catalogue_path(conn, provider_id, &path)?))
                    .await
                {
                    log::warn!("Catalogue path of provider {} not stored: {}", provider_id, e);
                }
            }
        }

        match self.start_payment(user_id, provider_id, registration).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!("Payment of provider {} could not be recorded: {}", provider_id, e);
                Ok(FinalizeOutcome::PaymentUnavailable {
                    provider_id,
                    plan: registration.plan,
                    error: PAYMENT_NOT_RECORDED.to_string(),
                })
            }
        }
    }

    /// Initializes the gateway transaction and stores the PENDING payment.
    async fn start_payment(
        &self,
        user_id: i64,
        provider_id: i64,
        registration: &CompletedRegistration,
    ) -> AppResult<FinalizeOutcome> {
        let reference = self.unused_reference().await?;
        let plan = registration.plan;
        let request = InitializeRequest {
            email: registration.email.clone(),
            amount_minor: plan.price_minor(),
            reference: reference.clone(),
            currency: self.currency.clone(),
            metadata: json!({
                "provider_id": provider_id,
                "telegram_user_id": user_id,
                "business_name": registration.name,
                "plan": plan.as_str(),
            }),
        };

        let authorization = match self.gateway.initialize(&request).await {
            Ok(authorization) => authorization,
            Err(e) => {
                log::error!("Payment initialize for provider {} failed: {}", provider_id, e);
                return Ok(FinalizeOutcome::PaymentUnavailable {
                    provider_id,
                    plan,
                    error: e.to_string(),
                });
            }
        };

        let inserted = {
            let reference = reference.clone();
            let authorization_url = authorization.authorization_url.clone();
            let raw = json!({
                "authorization_url": authorization.authorization_url,
                "access_code": authorization.access_code,
                "reference": authorization.reference,
            });
            self.directory
                .run(move |conn| {
                    directory::insert_payment(
                        conn,
                        &NewPayment {
                            reference: &reference,
                            provider_id,
                            amount_minor: plan.price_minor(),
                            plan,
                            authorization_url: &authorization_url,
                            gateway_response: Some(&raw),
                        },
                    )
                })
                .await?
        };

        if inserted == PaymentInsert::DuplicateReference {
            return Err(AppError::Corrupt(format!("payment reference {} already stored", reference)));
        }

        log::info!("Payment {} created for provider {} ({})", reference, provider_id, plan.display_price());
        Ok(FinalizeOutcome::PaymentReady {
            provider_id,
            plan,
            reference,
            authorization_url: authorization.authorization_url,
        })
    }

    /// A fresh reference not yet used by any stored payment
    async fn unused_reference(&self) -> AppResult<String> {
        for _ in 0..REFERENCE_ATTEMPTS {
            let candidate = generate_reference();
            let check = candidate.clone();
            let taken = self
                .directory
                .run(move |conn| Ok(directory::payment_reference_exists(conn, &check)?))
                .await?;
            if !taken {
                return Ok(candidate);
            }
            log::warn!("Payment reference {} collided, generating another", candidate);
        }
        Err(AppError::Corrupt("could not generate an unused payment reference".to_string()))
    }
}
