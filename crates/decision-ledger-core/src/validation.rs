//! Entry validation: the checks a candidate must pass before it is sequenced.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default maximum category length in UTF-8 bytes.
pub const DEFAULT_MAX_CATEGORY_LEN: usize = 64;

/// Default maximum message length in UTF-8 bytes.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

/// Length bounds applied to every candidate entry.
///
/// Lengths are measured in UTF-8 bytes, which is also what the store
/// persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLimits {
    pub max_category_len: usize,
    pub max_message_len: usize,
}

impl EntryLimits {
    pub const fn new(max_category_len: usize, max_message_len: usize) -> Self {
        Self {
            max_category_len,
            max_message_len,
        }
    }
}

impl Default for EntryLimits {
    fn default() -> Self {
        Self {
            max_category_len: DEFAULT_MAX_CATEGORY_LEN,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

/// Validate a candidate `(category, message)` pair.
///
/// Both fields must be non-empty and within the configured limits. The
/// category is checked first, so a pair failing both reports the category.
pub fn validate_entry(
    category: &str,
    message: &str,
    limits: &EntryLimits,
) -> Result<(), ValidationError> {
    check_field("category", category, limits.max_category_len)?;
    check_field("message", message, limits.max_message_len)?;
    Ok(())
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.len() > max {
        return Err(ValidationError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_entry() {
        let limits = EntryLimits::default();
        assert!(validate_entry("bootstrap", "first on-chain log", &limits).is_ok());
    }

    #[test]
    fn test_empty_category() {
        let result = validate_entry("", "message", &EntryLimits::default());
        assert_eq!(result, Err(ValidationError::EmptyField { field: "category" }));
    }

    #[test]
    fn test_empty_message() {
        let result = validate_entry("category", "", &EntryLimits::default());
        assert_eq!(result, Err(ValidationError::EmptyField { field: "message" }));
    }

    #[test]
    fn test_category_reported_before_message() {
        let err = validate_entry("", "", &EntryLimits::default()).unwrap_err();
        assert_eq!(err.field(), "category");
    }

    #[test]
    fn test_limit_is_inclusive() {
        let limits = EntryLimits {
            max_category_len: 4,
            max_message_len: 8,
        };
        assert!(validate_entry("abcd", "12345678", &limits).is_ok());
        assert_eq!(
            validate_entry("abcde", "x", &limits),
            Err(ValidationError::FieldTooLong {
                field: "category",
                len: 5,
                max: 4
            })
        );
        assert_eq!(
            validate_entry("a", "123456789", &limits),
            Err(ValidationError::FieldTooLong {
                field: "message",
                len: 9,
                max: 8
            })
        );
    }

    #[test]
    fn test_length_counts_bytes() {
        let limits = EntryLimits {
            max_category_len: 4,
            max_message_len: 4,
        };
        // Two characters, six bytes.
        assert!(validate_entry("ok", "日本", &limits).is_err());
    }

    proptest! {
        #[test]
        fn test_non_empty_within_limits_accepted(
            category in "[a-z]{1,64}",
            message in "\\PC{1,200}",
        ) {
            prop_assume!(message.len() <= DEFAULT_MAX_MESSAGE_LEN);
            prop_assert!(validate_entry(&category, &message, &EntryLimits::default()).is_ok());
        }

        #[test]
        fn test_overlong_category_rejected(category in "[a-z]{65,100}") {
            let err = validate_entry(&category, "m", &EntryLimits::default()).unwrap_err();
            prop_assert_eq!(err.field(), "category");
        }
    }
}
