//! Registration wizard as a pure transition function.
//!
//! `transition(state, event, draft)` never performs IO. The caller owns the
//! session storage and turns the returned `Output` into messages, and it
//! runs the finalize sequence when the output is `Output::Finalize`.

use crate::core::types::PlanTier;
use crate::registration::draft::{CatalogueFile, CompletedRegistration, RegistrationDraft};
use crate::registration::validation::{
    normalize_handle, normalize_optional, parse_keywords, validate_catalogue_name, validate_description,
    validate_email, validate_name, ValidationError,
};

/// Wizard position. Each step waits for exactly one kind of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CollectName,
    CollectDescription,
    CollectKeywords,
    CollectPhone,
    CollectTelegram,
    CollectInstagram,
    CollectCatalogue,
    SelectPlan,
    CollectHall,
    CollectEmail,
    Confirm,
}

impl Step {
    pub fn is_skippable(self) -> bool {
        matches!(
            self,
            Step::CollectPhone
                | Step::CollectTelegram
                | Step::CollectInstagram
                | Step::CollectCatalogue
                | Step::CollectHall
        )
    }

    /// Next step once this one is answered or skipped. Plan selection is the
    /// only branch: the top tier is asked for a hall of residence.
    pub fn following(self, plan: Option<PlanTier>) -> Step {
        match self {
            Step::CollectName => Step::CollectDescription,
            Step::CollectDescription => Step::CollectKeywords,
            Step::CollectKeywords => Step::CollectPhone,
            Step::CollectPhone => Step::CollectTelegram,
            Step::CollectTelegram => Step::CollectInstagram,
            Step::CollectInstagram => Step::CollectCatalogue,
            Step::CollectCatalogue => Step::SelectPlan,
            Step::SelectPlan if plan.is_some_and(|p| p.is_top_tier()) => Step::CollectHall,
            Step::SelectPlan => Step::CollectEmail,
            Step::CollectHall => Step::CollectEmail,
            Step::CollectEmail | Step::Confirm => Step::Confirm,
        }
    }
}

/// User input, already translated from the messaging platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Text(String),
    Document { file_id: String, file_name: String },
    /// Skip button; carries the step it was shown for
    Skip(Step),
    SelectPlan(PlanTier),
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Ask the question of this step (first time, or again after a stale button)
    Ask(Step),
    /// Input refused; ask the same step again with the error
    Rejected { step: Step, error: ValidationError },
    /// Confirmed: persist this registration
    Finalize(CompletedRegistration),
    Cancelled,
    /// Event arrived while no registration is in progress
    NoRegistration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// `None` once the conversation has ended
    pub state: Option<Step>,
    pub draft: RegistrationDraft,
    pub output: Output,
}

impl Transition {
    fn ask(step: Step, draft: RegistrationDraft) -> Self {
        Self {
            state: Some(step),
            draft,
            output: Output::Ask(step),
        }
    }

    fn ended(output: Output) -> Self {
        Self {
            state: None,
            draft: RegistrationDraft::default(),
            output,
        }
    }
}

enum Rejection {
    Invalid(ValidationError),
    /// Button that belongs to another step
    Stale,
}

impl From<ValidationError> for Rejection {
    fn from(err: ValidationError) -> Self {
        Rejection::Invalid(err)
    }
}

pub fn transition(state: Option<Step>, event: Event, draft: RegistrationDraft) -> Transition {
    match (state, event) {
        (_, Event::Start) => Transition::ask(Step::CollectName, RegistrationDraft::default()),
        (_, Event::Cancel) => Transition::ended(Output::Cancelled),
        (None, _) => Transition {
            state: None,
            draft,
            output: Output::NoRegistration,
        },
        (Some(Step::Confirm), Event::Confirm) => match draft.complete() {
            Some(done) => Transition::ended(Output::Finalize(done)),
            None => {
                let missing = draft.first_missing_step().unwrap_or(Step::CollectName);
                Transition::ask(missing, draft)
            }
        },
        (Some(step), event) => {
            let mut updated = draft.clone();
            match apply(step, event, &mut updated) {
                Ok(next) => Transition::ask(next, updated),
                Err(Rejection::Invalid(error)) => Transition {
                    state: Some(step),
                    draft,
                    output: Output::Rejected { step, error },
                },
                Err(Rejection::Stale) => Transition::ask(step, draft),
            }
        }
    }
}

/// Writes the accepted answer of `step` into `draft` and returns the next
/// step. Rejected input leaves `draft` untouched.
fn apply(step: Step, event: Event, draft: &mut RegistrationDraft) -> Result<Step, Rejection> {
    match (step, event) {
        (Step::CollectName, Event::Text(text)) => {
            draft.name = Some(validate_name(&text)?);
        }
        (Step::CollectDescription, Event::Text(text)) => {
            draft.description = Some(validate_description(&text)?);
        }
        (Step::CollectKeywords, Event::Text(text)) => {
            let keywords = parse_keywords(&text)?;
            draft.keywords = keywords.list;
            draft.category_name = Some(keywords.category_name);
        }
        (Step::CollectPhone, Event::Text(text)) => {
            draft.phone = normalize_optional(&text);
        }
        (Step::CollectTelegram, Event::Text(text)) => {
            draft.telegram_handle = normalize_handle(&text);
        }
        (Step::CollectInstagram, Event::Text(text)) => {
            draft.instagram_handle = normalize_handle(&text);
        }
        (Step::CollectCatalogue, Event::Document { file_id, file_name }) => {
            validate_catalogue_name(&file_name)?;
            draft.catalogue = Some(CatalogueFile { file_id, file_name });
        }
        (Step::SelectPlan, Event::SelectPlan(plan)) => {
            draft.plan = Some(plan);
            if !plan.is_top_tier() {
                draft.hall_of_residence = None;
            }
        }
        (Step::CollectHall, Event::Text(text)) => {
            draft.hall_of_residence = normalize_optional(&text);
        }
        (Step::CollectEmail, Event::Text(text)) => {
            draft.email = Some(validate_email(&text)?);
        }
        (current, Event::Skip(target)) if current == target && current.is_skippable() => {
            clear_skipped(current, draft);
        }
        (_, Event::Skip(_) | Event::SelectPlan(_) | Event::Confirm | Event::Start | Event::Cancel) => {
            return Err(Rejection::Stale);
        }
        (Step::CollectCatalogue, Event::Text(_)) => return Err(ValidationError::ExpectedDocument.into()),
        (Step::SelectPlan | Step::Confirm, Event::Text(_) | Event::Document { .. }) => {
            return Err(ValidationError::UseButtons.into());
        }
        (_, Event::Document { .. }) => return Err(ValidationError::ExpectedText.into()),
    }

    Ok(step.following(draft.plan))
}

fn clear_skipped(step: Step, draft: &mut RegistrationDraft) {
    match step {
        Step::CollectPhone => draft.phone = None,
        Step::CollectTelegram => draft.telegram_handle = None,
        Step::CollectInstagram => draft.instagram_handle = None,
        Step::CollectCatalogue => draft.catalogue = None,
        Step::CollectHall => draft.hall_of_residence = None,
        _ => {}
    }
}
