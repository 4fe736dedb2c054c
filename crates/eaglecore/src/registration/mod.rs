//! Provider registration wizard
//!
//! - `machine`: pure `(state, event, draft) -> transition` function
//! - `validation`: field validators
//! - `draft`: the in-progress registration record
//! - `prompts`: replies rendered as MarkdownV2 text plus keyboards
//! - `callback`: button callback-data vocabulary
//! - `session`: per-user session store with idle expiry
//! - `service`: drives a session through the wizard and finalizes it

pub mod callback;
pub mod draft;
pub mod machine;
pub mod prompts;
pub mod service;
pub mod session;
pub mod validation;

pub use callback::CallbackAction;
pub use draft::{CatalogueFile, CompletedRegistration, RegistrationDraft};
pub use machine::{transition, Event, Output, Step, Transition};
pub use prompts::{Button, ButtonAction, Reply};
pub use service::{FinalizeOutcome, Handled, RegistrationService};
pub use session::{Session, SessionStore};
pub use validation::ValidationError;
