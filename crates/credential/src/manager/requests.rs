//! Request and response shapes of the lifecycle service

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::Serialize;

use crate::core::{Passkey, Reward};

/// Issue a new passkey
#[derive(Debug, Clone)]
pub struct CreatePasskeyRequest {
    /// Required, at most 256 characters
    pub namespace: String,
    /// Required, 4 to 4096 characters
    pub secret: SecretString,
    /// Optional payload
    pub reward: Option<Reward>,
    /// Lifetime relative to now; may be negative
    pub expires_in: Option<Duration>,
}

impl CreatePasskeyRequest {
    /// Request with no reward and no expiry
    pub fn new(namespace: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            secret: SecretString::from(secret.into()),
            reward: None,
            expires_in: None,
        }
    }

    /// Attach a reward
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Set a lifetime
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }
}

/// Fetch a passkey, optionally verifying its secret
#[derive(Debug, Clone)]
pub struct ReadPasskeyRequest {
    /// Canonical hyphenated identifier
    pub id: String,
    /// Required
    pub namespace: String,
    /// Required only when `validate` is set; ignored otherwise
    pub secret: Option<SecretString>,
    /// Verify `secret` against the stored encoding
    pub validate: bool,
}

impl ReadPasskeyRequest {
    /// Read without verification
    pub fn new(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            secret: None,
            validate: false,
        }
    }

    /// Read and verify `secret`
    pub fn verified(
        id: impl Into<String>,
        namespace: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            secret: Some(SecretString::from(secret.into())),
            validate: true,
        }
    }
}

/// Rotate a passkey's secret and replace its reward and expiry
///
/// Absent `reward`/`expires_in` clear the stored values.
#[derive(Debug, Clone)]
pub struct UpdatePasskeyRequest {
    /// Canonical hyphenated identifier
    pub id: String,
    /// Required
    pub namespace: String,
    /// Always required
    pub secret: SecretString,
    /// Replacement payload
    pub reward: Option<Reward>,
    /// Replacement lifetime relative to now
    pub expires_in: Option<Duration>,
}

impl UpdatePasskeyRequest {
    /// Update that clears reward and expiry
    pub fn new(
        id: impl Into<String>,
        namespace: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            secret: SecretString::from(secret.into()),
            reward: None,
            expires_in: None,
        }
    }

    /// Replace the reward
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Replace the lifetime
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }
}

/// Revoke a passkey; same shape and rules as [`ReadPasskeyRequest`]
#[derive(Debug, Clone)]
pub struct DeletePasskeyRequest {
    /// Canonical hyphenated identifier
    pub id: String,
    /// Required
    pub namespace: String,
    /// Required only when `validate` is set; ignored otherwise
    pub secret: Option<SecretString>,
    /// Refuse to delete unless `secret` verifies
    pub validate: bool,
}

impl DeletePasskeyRequest {
    /// Delete without verification
    pub fn new(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            secret: None,
            validate: false,
        }
    }

    /// Delete only if `secret` verifies
    pub fn verified(
        id: impl Into<String>,
        namespace: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            secret: Some(SecretString::from(secret.into())),
            validate: true,
        }
    }
}

/// Passkey as returned to callers; never carries the encoded secret
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyResponse {
    /// Canonical identifier
    pub id: String,
    /// Namespace
    pub namespace: String,
    /// Payload
    pub reward: Option<Reward>,
    /// Absolute expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Passkey> for PasskeyResponse {
    fn from(passkey: Passkey) -> Self {
        Self {
            id: passkey.id.to_string(),
            namespace: passkey.namespace,
            reward: passkey.reward,
            expires_at: passkey.expires_at,
            created_at: passkey.created_at,
            updated_at: passkey.updated_at,
        }
    }
}

/// Response to [`CreatePasskeyRequest`]; a new passkey has no update time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePasskeyResponse {
    /// Canonical identifier
    pub id: String,
    /// Namespace
    pub namespace: String,
    /// Payload
    pub reward: Option<Reward>,
    /// Absolute expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<Passkey> for CreatePasskeyResponse {
    fn from(passkey: Passkey) -> Self {
        Self {
            id: passkey.id.to_string(),
            namespace: passkey.namespace,
            reward: passkey.reward,
            expires_at: passkey.expires_at,
            created_at: passkey.created_at,
        }
    }
}
