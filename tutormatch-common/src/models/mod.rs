//! Domain models
//!
//! Enumerations are stored as lowercase TEXT columns and serialized to the
//! same lowercase strings on the wire.

pub mod account;
pub mod enquiry;
pub mod review;
pub mod student;
pub mod tutor;

pub use account::{Account, AuthProvider, NewUser, Role, RoleProfile, User};
pub use enquiry::{Enquiry, EnquiryStats, EnquiryStatus, TimePreference};
pub use review::{ReviewStats, TutorReview, MAX_RATING, MAX_REVIEW_TEXT_CHARS, MIN_RATING};
pub use student::StudentProfile;
pub use tutor::{AvailabilitySlot, ContactMode, PreferredContact, TimeZoneSlot, TutorProfile};

use crate::Error;

/// Unrecognized text for a stored enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub type_name: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.type_name)
    }
}

impl std::error::Error for ParseEnumError {}

/// Enum values come back from our own columns; a bad one is corrupt data
impl From<ParseEnumError> for Error {
    fn from(err: ParseEnumError) -> Self {
        Error::Internal(err.to_string())
    }
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::models::ParseEnumError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::ParseEnumError {
                        type_name: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;

text_enum! {
    /// Skill level shared by tutor profiles, student profiles and enquiries
    ProficiencyLevel {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
        Expert => "expert",
        Master => "master",
    }
}

text_enum! {
    DayOfWeek {
        Mon => "mon",
        Tue => "tue",
        Wed => "wed",
        Thu => "thu",
        Fri => "fri",
        Sat => "sat",
        Sun => "sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_text_enum_round_trips_every_variant() {
        for level in ProficiencyLevel::ALL {
            assert_eq!(ProficiencyLevel::from_str(level.as_str()).unwrap(), *level);
        }
    }

    #[test]
    fn test_text_enum_rejects_unknown() {
        let err = DayOfWeek::from_str("funday").unwrap_err();
        assert_eq!(err.type_name, "DayOfWeek");
        assert_eq!(err.to_string(), "'funday' is not a valid DayOfWeek");
    }

    #[test]
    fn test_account_enums_parse_through_reexports() {
        // Expanded next to `crate::Result`, which must not shadow std's
        assert_eq!(Role::from_str("teacher").unwrap(), Role::Teacher);
        assert_eq!(AuthProvider::from_str("google").unwrap(), AuthProvider::Google);
        assert!(ContactMode::from_str("fax").is_err());
        assert_eq!(AuthProvider::Apple.to_string(), "apple");
    }

    #[test]
    fn test_text_enum_serde_uses_lowercase() {
        let json = serde_json::to_string(&DayOfWeek::Wed).unwrap();
        assert_eq!(json, "\"wed\"");
        let parsed: ProficiencyLevel = serde_json::from_str("\"master\"").unwrap();
        assert_eq!(parsed, ProficiencyLevel::Master);
    }
}
