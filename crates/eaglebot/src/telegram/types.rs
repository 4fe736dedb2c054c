//! Handler types and shared dependencies

use std::sync::Arc;
use teloxide::types::{Message, User};

use eaglecore::{CatalogueStore, Directory, PaymentReconciler, RegistrationService};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub registration: RegistrationService,
    pub reconciler: PaymentReconciler,
    pub directory: Directory,
    pub catalogues: Arc<CatalogueStore>,
}

impl HandlerDeps {
    pub fn new(
        registration: RegistrationService,
        reconciler: PaymentReconciler,
        directory: Directory,
        catalogues: Arc<CatalogueStore>,
    ) -> Self {
        Self {
            registration,
            reconciler,
            directory,
            catalogues,
        }
    }
}

/// Telegram user id as stored in the directory
pub fn user_id(user: &User) -> Option<i64> {
    i64::try_from(user.id.0).ok()
}

/// Sender of a message, if it has one we can key a session on
pub fn sender_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().and_then(user_id)
}

/// Shown to admins: "@handle (id)" or "First Name (id)"
pub fn describe_user(user: &User) -> String {
    match &user.username {
        Some(username) => format!("@{} ({})", username, user.id.0),
        None => format!("{} ({})", user.first_name, user.id.0),
    }
}
