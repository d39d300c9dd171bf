//! Request validation
//!
//! Bodies derive [`validator::Validate`] and are checked before any service
//! touches storage. What the derive cannot express lives here: clock times,
//! phone numbers, and absent-vs-null fields. Lengths count characters.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// A failed rule carrying its `field: reason` message
pub fn rule_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Flatten errors to the first failure, fields taken in name order
pub fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    return match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("{}: is invalid ({})", field, err.code),
                    };
                }
            }
            ValidationErrorsKind::Struct(inner) => return describe(inner),
            ValidationErrorsKind::List(items) => {
                if let Some(inner) = items.values().next() {
                    return describe(inner);
                }
            }
        }
    }
    "Validation failed".to_string()
}

/// Trim an optional string, turning blank input into `None`
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `H:MM` or `HH:MM`, 24-hour clock
pub fn is_clock_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return false;
    }
    matches!((hours.parse::<u8>(), minutes.parse::<u8>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}

/// 7 to 30 characters of digits, spaces, `+`, `-` and parentheses
pub fn is_phone(value: &str) -> bool {
    let len = value.chars().count();
    (7..=30).contains(&len)
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
}

/// Distinguish an absent field from an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Note {
        #[validate(length(max = 5, message = "text: must be at most 5 characters"))]
        text: String,
        #[validate(range(min = 1, message = "count: must be positive"))]
        count: i64,
        #[validate(length(min = 1))]
        tags: Vec<String>,
    }

    #[test]
    fn test_describe_reports_first_field_message() {
        let note = Note {
            text: "much too long".into(),
            count: 0,
            tags: vec!["a".into()],
        };
        let errors = note.validate().unwrap_err();
        assert_eq!(describe(&errors), "count: must be positive");
    }

    #[test]
    fn test_describe_falls_back_to_code() {
        let note = Note {
            text: "ok".into(),
            count: 1,
            tags: vec![],
        };
        let errors = note.validate().unwrap_err();
        assert_eq!(describe(&errors), "tags: is invalid (length)");
    }

    #[test]
    fn test_lengths_count_chars() {
        let note = |text: String| Note {
            text,
            count: 1,
            tags: vec!["a".into()],
        };
        assert!(note("é".repeat(5)).validate().is_ok());
        assert!(note("é".repeat(6)).validate().is_err());
    }

    #[test]
    fn test_clock_time() {
        assert!(is_clock_time("09:00"));
        assert!(is_clock_time("9:30"));
        assert!(is_clock_time("23:59"));
        assert!(!is_clock_time("24:00"));
        assert!(!is_clock_time("12:60"));
        assert!(!is_clock_time("12:5"));
        assert!(!is_clock_time("noon"));
        assert!(!is_clock_time("123:00"));
    }

    #[test]
    fn test_phone() {
        assert!(is_phone("+1 (555) 123-4567"));
        assert!(!is_phone("12345"));
        assert!(!is_phone("call me maybe"));
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(trimmed(Some("  Austin ".into())), Some("Austin".into()));
        assert_eq!(trimmed(Some("   ".into())), None);
        assert_eq!(trimmed(None), None);
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        bio: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.bio, None);
        let null: Patch = serde_json::from_str(r#"{"bio":null}"#).unwrap();
        assert_eq!(null.bio, Some(None));
        let set: Patch = serde_json::from_str(r#"{"bio":"hi"}"#).unwrap();
        assert_eq!(set.bio, Some(Some("hi".into())));
    }
}
