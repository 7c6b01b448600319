//! Field validation rules for user-submitted content.
//!
//! All rules are local; a violation never issues a store write.

use crate::error::ValidationError;

/// Categories offered by the report form and by the suggestion wrapper.
pub const CATEGORIES: &[&str] = &[
    "Electronics",
    "Books",
    "Clothing",
    "Keys",
    "Wallets",
    "IDs",
    "Other",
];

pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MIN_LOCATION_LEN: usize = 3;

/// Validate an item report's fixed field set.
pub fn validate_report(
    title: &str,
    description: &str,
    category: &str,
    location: &str,
) -> Result<(), ValidationError> {
    if title.trim().chars().count() < MIN_TITLE_LEN {
        return Err(ValidationError::new(
            "title",
            format!("Title must be at least {MIN_TITLE_LEN} characters."),
        ));
    }
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(ValidationError::new(
            "description",
            format!("Description must be at least {MIN_DESCRIPTION_LEN} characters."),
        ));
    }
    if !CATEGORIES.contains(&category.trim()) {
        return Err(ValidationError::new("category", "Please select a category."));
    }
    if location.trim().chars().count() < MIN_LOCATION_LEN {
        return Err(ValidationError::new("location", "Location is required."));
    }
    Ok(())
}

/// Validate a chat message body: non-empty after trimming.
///
/// Returns the trimmed text so callers persist exactly what was checked.
pub fn validate_message_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("text", "Message is empty."));
    }
    Ok(trimmed)
}

/// The suggestion wrapper's caller-side contract: descriptions shorter than
/// the report minimum are rejected before any request is made.
pub fn validate_suggestion_input(description: &str) -> Result<(), ValidationError> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(ValidationError::new(
            "description",
            "Please enter a longer description to suggest a category.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_title_rejected() {
        let err = validate_report("ab", "a long enough description", "Keys", "Library").unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn short_description_rejected() {
        let err = validate_report("Keys", "too short", "Keys", "Library").unwrap_err();
        assert_eq!(err.field, "description");
    }

    #[test]
    fn category_must_be_from_the_fixed_list() {
        let err = validate_report("Keys", "a long enough description", "  ", "Library").unwrap_err();
        assert_eq!(err.field, "category");
        let err = validate_report("Keys", "a long enough description", "Gadgets", "Library").unwrap_err();
        assert_eq!(err.field, "category");
    }

    #[test]
    fn valid_report_passes() {
        assert!(validate_report("Keys", "a long enough description", "Keys", "Library").is_ok());
    }

    #[test]
    fn message_text_is_trimmed() {
        assert_eq!(validate_message_text("  hello \n").unwrap(), "hello");
        assert!(validate_message_text("   ").is_err());
    }

    #[test]
    fn suggestion_input_needs_ten_chars() {
        assert!(validate_suggestion_input("blue bag").is_err());
        assert!(validate_suggestion_input("a blue canvas messenger bag").is_ok());
    }
}
