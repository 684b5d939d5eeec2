//! The persisted passkey record and its composite key

use std::fmt;

use chrono::{DateTime, Utc};

use super::PasskeyId;

/// Caller-defined payload attached to a passkey, opaque to the engine
pub type Reward = serde_json::Map<String, serde_json::Value>;

/// Composite identity of a passkey: the same `id` may exist independently
/// in two namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PasskeyKey {
    /// Identifier, unique within the namespace
    pub id: PasskeyId,
    /// Partition the identifier lives in
    pub namespace: String,
}

impl PasskeyKey {
    /// Create a composite key
    pub fn new(id: PasskeyId, namespace: impl Into<String>) -> Self {
        Self {
            id,
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for PasskeyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

/// A stored passkey
///
/// `encoded_secret` is always codec output and is never printed by `Debug`.
#[derive(Clone, PartialEq)]
pub struct Passkey {
    /// Identifier, immutable after creation
    pub id: PasskeyId,
    /// Namespace, part of the composite key
    pub namespace: String,
    /// Self-describing argon2id encoding of the secret
    pub encoded_secret: String,
    /// Optional payload
    pub reward: Option<Reward>,
    /// `None` means the passkey never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// `None` until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

impl Passkey {
    /// Composite key of this record
    pub fn key(&self) -> PasskeyKey {
        PasskeyKey::new(self.id, self.namespace.clone())
    }

    /// Whether the passkey is expired at `now`
    ///
    /// A passkey is live while `expires_at > now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passkey")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("encoded_secret", &"[REDACTED]")
            .field("reward", &self.reward)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
