//! Passkey identifier with validation
//!
//! Provides a validated [`PasskeyId`] newtype over a random UUID. The only
//! accepted textual form is the canonical hyphenated 36-character string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::FieldError;

/// Length of the canonical hyphenated form
const CANONICAL_LENGTH: usize = 36;

/// Unique passkey identifier
///
/// # Examples
///
/// ```
/// use passkeys_credential::core::PasskeyId;
///
/// let id = PasskeyId::new();
/// let parsed = PasskeyId::parse(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
///
/// // Simple (unhyphenated) and braced forms are rejected
/// assert!(PasskeyId::parse("67e5504410b1426f9247bb680e5fe0c8").is_err());
/// assert!(PasskeyId::parse("not-a-uuid").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasskeyId(Uuid);

impl PasskeyId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the canonical hyphenated form
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] on the `id` field if the value is not exactly
    /// 36 characters or is not a valid UUID.
    pub fn parse(value: &str) -> Result<Self, FieldError> {
        if value.len() != CANONICAL_LENGTH {
            return Err(FieldError::new(
                "id",
                format!("must be exactly {CANONICAL_LENGTH} characters"),
            ));
        }

        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| FieldError::new("id", format!("is not a valid identifier: {e}")))
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PasskeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PasskeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for PasskeyId {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for PasskeyId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<PasskeyId> for Uuid {
    fn from(id: PasskeyId) -> Self {
        id.0
    }
}

impl From<PasskeyId> for String {
    fn from(id: PasskeyId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PasskeyId {
    type Error = FieldError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_generated_ids_are_unique_v4() {
        let a = PasskeyId::new();
        let b = PasskeyId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_display_is_canonical() {
        let id = PasskeyId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(s.matches('-').count(), 4);
        assert_eq!(PasskeyId::parse(&s).unwrap(), id);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("67e5504410b1426f9247bb680e5fe0c8")]
    #[case("{67e55044-10b1-426f-9247-bb680e5fe0c8}")]
    #[case("urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8")]
    #[case("67e55044-10b1-426f-9247-bb680e5fe0cz")]
    fn test_rejects_non_canonical(#[case] input: &str) {
        let err = PasskeyId::parse(input).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_accepts_uppercase_hyphenated() {
        assert!(PasskeyId::parse("67E55044-10B1-426F-9247-BB680E5FE0C8").is_ok());
    }

    #[test]
    fn test_serde_round_trip_uses_string_form() {
        let id = PasskeyId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: PasskeyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<PasskeyId>("\"nope\"").is_err());
    }
}
