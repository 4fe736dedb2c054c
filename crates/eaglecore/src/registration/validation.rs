//! Field validators for the registration wizard.
//!
//! Every validator is pure: it returns the normalized value to store or the
//! reason the input was refused. The `Display` text of a `ValidationError`
//! is what the user sees before the same question is asked again.

use thiserror::Error;

use crate::core::config::validation::{
    CATALOGUE_EXTENSION, MAX_DESCRIPTION_CHARS, MIN_DESCRIPTION_CHARS, MIN_NAME_CHARS,
};
use crate::core::utils::{title_case, truncate_chars};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("❌ Name too short. Please enter at least 3 characters.")]
    NameTooShort,

    #[error("❌ Description too short. Please enter at least 10 characters.")]
    DescriptionTooShort,

    #[error("❌ Please enter at least one keyword.")]
    NoKeywords,

    #[error("❌ Please upload a PDF file only.")]
    NotPdf,

    #[error("❌ Invalid email address. Please enter a valid email:")]
    InvalidEmail,

    #[error("❌ Please type your answer as a text message.")]
    ExpectedText,

    #[error("❌ Please upload your catalogue as a PDF document, or skip this step.")]
    ExpectedDocument,

    #[error("❌ Please choose one of the buttons below.")]
    UseButtons,
}

/// Keywords as stored on the provider plus the category derived from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub list: Vec<String>,
    pub category_name: String,
}

pub fn validate_name(input: &str) -> Result<String, ValidationError> {
    let name = input.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError::NameTooShort);
    }
    Ok(name.to_string())
}

/// Accepts at least 10 characters and keeps at most 500.
pub fn validate_description(input: &str) -> Result<String, ValidationError> {
    let description = input.trim();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooShort);
    }
    Ok(truncate_chars(description, MAX_DESCRIPTION_CHARS))
}

/// Splits on commas, trims and lower-cases every keyword and drops empty
/// ones. The first keyword, title-cased, names the category.
pub fn parse_keywords(input: &str) -> Result<Keywords, ValidationError> {
    let list: Vec<String> = input
        .split(',')
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect();

    let category_name = match list.first() {
        Some(first) => title_case(first),
        None => return Err(ValidationError::NoKeywords),
    };

    Ok(Keywords { list, category_name })
}

pub fn validate_catalogue_name(file_name: &str) -> Result<(), ValidationError> {
    let accepted = file_name
        .rsplit_once('.')
        .is_some_and(|(_, extension)| extension.eq_ignore_ascii_case(CATALOGUE_EXTENSION));

    if accepted {
        Ok(())
    } else {
        Err(ValidationError::NotPdf)
    }
}

/// Shape check only: exactly one "@" and a "." somewhere after it.
pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let email = input.trim();
    if email.matches('@').count() != 1 {
        return Err(ValidationError::InvalidEmail);
    }
    match email.rsplit_once('@') {
        Some((_, domain)) if domain.contains('.') => Ok(email.to_string()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// "@sarah", "sarah" and "@@sarah" all become "@sarah"; blank input is no handle.
pub fn normalize_handle(input: &str) -> Option<String> {
    let handle = input.trim().trim_start_matches('@').trim();
    if handle.is_empty() {
        None
    } else {
        Some(format!("@{}", handle))
    }
}

/// Free-text optional field (phone, hall of residence).
pub fn normalize_optional(input: &str) -> Option<String> {
    let value = input.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
