//! Callback-data vocabulary of the registration, payment and directory
//! buttons.
//!
//! The strings are part of messages already sent to users, so they must stay
//! stable: a button rendered by an older process still has to parse.

use std::str::FromStr;

use crate::core::types::PlanTier;
use crate::payment::reference::is_well_formed;
use crate::registration::machine::{Event, Step};

const START: &str = "register_start";
const CONFIRM: &str = "confirm_registration";
const CANCEL: &str = "cancel_registration";
const MAIN_MENU: &str = "main_menu";
const SKIP_PREFIX: &str = "skip_";
const PLAN_PREFIX: &str = "plan_";
const VERIFY_PREFIX: &str = "verify_payment_";
const CATALOGUE_PREFIX: &str = "catalogue_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    StartRegistration,
    Skip(Step),
    SelectPlan(PlanTier),
    ConfirmRegistration,
    CancelRegistration,
    VerifyPayment(String),
    /// Send the stored catalogue of a provider
    ViewCatalogue(i64),
    MainMenu,
}

fn skip_suffix(step: Step) -> Option<&'static str> {
    match step {
        Step::CollectPhone => Some("phone"),
        Step::CollectTelegram => Some("telegram"),
        Step::CollectInstagram => Some("instagram"),
        Step::CollectCatalogue => Some("catalogue"),
        Step::CollectHall => Some("hall"),
        _ => None,
    }
}

fn step_for_skip(suffix: &str) -> Option<Step> {
    match suffix {
        "phone" => Some(Step::CollectPhone),
        "telegram" => Some(Step::CollectTelegram),
        "instagram" => Some(Step::CollectInstagram),
        "catalogue" => Some(Step::CollectCatalogue),
        "hall" => Some(Step::CollectHall),
        _ => None,
    }
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::StartRegistration => START.to_string(),
            CallbackAction::Skip(step) => {
                format!("{}{}", SKIP_PREFIX, skip_suffix(*step).unwrap_or("step"))
            }
            CallbackAction::SelectPlan(plan) => format!("{}{}", PLAN_PREFIX, plan.as_str()),
            CallbackAction::ConfirmRegistration => CONFIRM.to_string(),
            CallbackAction::CancelRegistration => CANCEL.to_string(),
            CallbackAction::VerifyPayment(reference) => format!("{}{}", VERIFY_PREFIX, reference),
            CallbackAction::ViewCatalogue(provider_id) => format!("{}{}", CATALOGUE_PREFIX, provider_id),
            CallbackAction::MainMenu => MAIN_MENU.to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            START => return Some(CallbackAction::StartRegistration),
            CONFIRM => return Some(CallbackAction::ConfirmRegistration),
            CANCEL => return Some(CallbackAction::CancelRegistration),
            MAIN_MENU => return Some(CallbackAction::MainMenu),
            _ => {}
        }

        if let Some(suffix) = data.strip_prefix(SKIP_PREFIX) {
            return step_for_skip(suffix).map(CallbackAction::Skip);
        }
        if let Some(plan) = data.strip_prefix(PLAN_PREFIX) {
            return PlanTier::from_str(plan).ok().map(CallbackAction::SelectPlan);
        }
        if let Some(reference) = data.strip_prefix(VERIFY_PREFIX) {
            if !is_well_formed(reference) {
                return None;
            }
            return Some(CallbackAction::VerifyPayment(reference.to_string()));
        }
        if let Some(id) = data.strip_prefix(CATALOGUE_PREFIX) {
            return id.parse::<i64>().ok().map(CallbackAction::ViewCatalogue);
        }
        None
    }

    /// Wizard event carried by this button, if it drives the wizard.
    pub fn to_event(&self) -> Option<Event> {
        match self {
            CallbackAction::StartRegistration => Some(Event::Start),
            CallbackAction::Skip(step) => Some(Event::Skip(*step)),
            CallbackAction::SelectPlan(plan) => Some(Event::SelectPlan(*plan)),
            CallbackAction::ConfirmRegistration => Some(Event::Confirm),
            CallbackAction::CancelRegistration => Some(Event::Cancel),
            CallbackAction::VerifyPayment(_) | CallbackAction::ViewCatalogue(_) | CallbackAction::MainMenu => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_vocabulary() {
        assert_eq!(CallbackAction::parse("register_start"), Some(CallbackAction::StartRegistration));
        assert_eq!(CallbackAction::parse("skip_phone"), Some(CallbackAction::Skip(Step::CollectPhone)));
        assert_eq!(CallbackAction::parse("skip_hall"), Some(CallbackAction::Skip(Step::CollectHall)));
        assert_eq!(
            CallbackAction::parse("plan_PREMIUM"),
            Some(CallbackAction::SelectPlan(PlanTier::Premium))
        );
        assert_eq!(
            CallbackAction::parse("confirm_registration"),
            Some(CallbackAction::ConfirmRegistration)
        );
        assert_eq!(
            CallbackAction::parse("cancel_registration"),
            Some(CallbackAction::CancelRegistration)
        );
        assert_eq!(
            CallbackAction::parse("verify_payment_EV-0A1B2C3D4E5F"),
            Some(CallbackAction::VerifyPayment("EV-0A1B2C3D4E5F".to_string()))
        );
        assert_eq!(CallbackAction::parse("catalogue_17"), Some(CallbackAction::ViewCatalogue(17)));
    }

    #[test]
    fn test_parse_rejects_unknown_data() {
        assert_eq!(CallbackAction::parse("skip_email"), None);
        assert_eq!(CallbackAction::parse("plan_GOLD"), None);
        assert_eq!(CallbackAction::parse("verify_payment_"), None);
        assert_eq!(CallbackAction::parse("verify_payment_EV-0a1b2c3d4e5f"), None);
        assert_eq!(CallbackAction::parse("verify_payment_'; DROP TABLE payments"), None);
        assert_eq!(CallbackAction::parse("catalogue_"), None);
        assert_eq!(CallbackAction::parse("catalogue_abc"), None);
        assert_eq!(CallbackAction::parse("section_news"), None);
    }

    #[test]
    fn test_encode_matches_parse() {
        let actions = [
            CallbackAction::StartRegistration,
            CallbackAction::Skip(Step::CollectCatalogue),
            CallbackAction::SelectPlan(PlanTier::Verified),
            CallbackAction::ConfirmRegistration,
            CallbackAction::CancelRegistration,
            CallbackAction::VerifyPayment("EV-00FF00FF00FF".to_string()),
            CallbackAction::ViewCatalogue(9),
            CallbackAction::MainMenu,
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(&action.encode()), Some(action.clone()));
        }
    }

    #[test]
    fn test_encoded_data_fits_telegram_limit() {
        let verify = CallbackAction::VerifyPayment("EV-0A1B2C3D4E5F".to_string()).encode();
        assert!(verify.len() <= 64);
    }

    #[test]
    fn test_to_event() {
        assert_eq!(CallbackAction::ConfirmRegistration.to_event(), Some(Event::Confirm));
        assert_eq!(
            CallbackAction::Skip(Step::CollectPhone).to_event(),
            Some(Event::Skip(Step::CollectPhone))
        );
        assert_eq!(CallbackAction::VerifyPayment("EV-A".to_string()).to_event(), None);
        assert_eq!(CallbackAction::ViewCatalogue(1).to_event(), None);
    }
}
