use crate::core::config::payment::REFERENCE_PREFIX;

const SUFFIX_LEN: usize = 12;

/// New payment reference: `EV-` followed by 12 upper-case hex characters
/// taken from a random v4 UUID.
///
/// Uniqueness against stored payments is still checked by the caller; the
/// UNIQUE constraint on `payments.reference` is the backstop.
pub fn generate_reference() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    let suffix: String = hex.chars().take(SUFFIX_LEN).collect();
    format!("{}-{}", REFERENCE_PREFIX, suffix.to_uppercase())
}

/// Whether `reference` looks like one we generated.
pub fn is_well_formed(reference: &str) -> bool {
    reference
        .strip_prefix(REFERENCE_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|suffix| {
            suffix.len() == SUFFIX_LEN
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        })
}
