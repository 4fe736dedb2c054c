use crate::core::types::PlanTier;
use crate::registration::machine::Step;

/// Catalogue uploaded during the wizard. Only the platform's file id is
/// kept until the registration is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueFile {
    pub file_id: String,
    pub file_name: String,
}

/// In-progress registration for one user.
///
/// Optional fields left as `None` were skipped (or not reached yet).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub category_name: Option<String>,
    pub phone: Option<String>,
    pub telegram_handle: Option<String>,
    pub instagram_handle: Option<String>,
    pub catalogue: Option<CatalogueFile>,
    pub plan: Option<PlanTier>,
    pub hall_of_residence: Option<String>,
    pub email: Option<String>,
}

/// A draft with every required field present, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRegistration {
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub category_name: String,
    pub phone: Option<String>,
    pub telegram_handle: Option<String>,
    pub instagram_handle: Option<String>,
    pub catalogue: Option<CatalogueFile>,
    pub plan: PlanTier,
    pub hall_of_residence: Option<String>,
    pub email: String,
}

impl RegistrationDraft {
    /// First wizard step whose required answer is still missing.
    pub fn first_missing_step(&self) -> Option<Step> {
        if self.name.is_none() {
            Some(Step::CollectName)
        } else if self.description.is_none() {
            Some(Step::CollectDescription)
        } else if self.keywords.is_empty() || self.category_name.is_none() {
            Some(Step::CollectKeywords)
        } else if self.plan.is_none() {
            Some(Step::SelectPlan)
        } else if self.email.is_none() {
            Some(Step::CollectEmail)
        } else {
            None
        }
    }

    /// Freezes the draft. A hall of residence is only kept for the top tier.
    pub fn complete(&self) -> Option<CompletedRegistration> {
        let plan = self.plan?;
        if self.keywords.is_empty() {
            return None;
        }

        Some(CompletedRegistration {
            name: self.name.clone()?,
            description: self.description.clone()?,
            keywords: self.keywords.clone(),
            category_name: self.category_name.clone()?,
            phone: self.phone.clone(),
            telegram_handle: self.telegram_handle.clone(),
            instagram_handle: self.instagram_handle.clone(),
            catalogue: self.catalogue.clone(),
            plan,
            hall_of_residence: if plan.is_top_tier() {
                self.hall_of_residence.clone()
            } else {
                None
            },
            email: self.email.clone()?,
        })
    }
}
