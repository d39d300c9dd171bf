//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse an identifier supplied by a client (path segment, query value)
///
/// `what` names the identifier in the validation message, e.g. "tutor ID".
pub fn parse_id(what: &str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).map_err(|_| Error::validation(format!("Invalid {} format", what)))
}

/// Parse an identifier read back from a TEXT column
pub fn from_column(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Stored id '{}' is not a UUID: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_generated() {
        let id = generate();
        assert_eq!(parse_id("tutor ID", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id("tutor ID", "not-a-uuid").unwrap_err();
        assert!(matches!(err, Error::Validation(ref msg) if msg == "Invalid tutor ID format"));
    }

    #[test]
    fn test_from_column_is_internal_error() {
        assert!(matches!(from_column("xyz"), Err(Error::Internal(_))));
    }
}
