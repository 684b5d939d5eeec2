use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::core::{Passkey, PasskeyId, PasskeyKey, Reward, StoreResult};

/// A passkey about to be inserted
#[derive(Debug, Clone)]
pub struct NewPasskey {
    /// Freshly generated identifier
    pub id: PasskeyId,
    /// Target namespace
    pub namespace: String,
    /// Plaintext secret; hashed by the store before persisting
    pub secret: SecretString,
    /// Optional payload
    pub reward: Option<Reward>,
    /// Absolute expiry, if any
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub now: DateTime<Utc>,
}

impl NewPasskey {
    /// Composite key of the passkey
    pub fn key(&self) -> PasskeyKey {
        PasskeyKey::new(self.id, self.namespace.clone())
    }
}

/// Wholesale replacement of a passkey's mutable fields
#[derive(Debug, Clone)]
pub struct PasskeyUpdate {
    /// Passkey to update
    pub key: PasskeyKey,
    /// New plaintext secret; rotation is mandatory on every update
    pub secret: SecretString,
    /// Replaces the stored reward (`None` clears it)
    pub reward: Option<Reward>,
    /// Replaces the stored expiry (`None` clears it)
    pub expires_at: Option<DateTime<Utc>>,
    /// Becomes `updated_at`
    pub now: DateTime<Utc>,
}

/// Lookup by composite key with optional secret verification
#[derive(Debug, Clone)]
pub struct PasskeyLookup {
    /// Passkey to look up
    pub key: PasskeyKey,
    /// When present, must verify against the stored encoding
    pub secret: Option<SecretString>,
}

impl PasskeyLookup {
    /// Lookup without verification
    pub fn new(key: PasskeyKey) -> Self {
        Self { key, secret: None }
    }

    /// Lookup that also verifies `secret`
    pub fn verified(key: PasskeyKey, secret: SecretString) -> Self {
        Self {
            key,
            secret: Some(secret),
        }
    }
}

/// Persistence of passkeys keyed by `(id, namespace)`
///
/// Implementations hash secrets with their [`SecretCodec`](crate::utils::SecretCodec)
/// and never store plaintext.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasskeyStore: Send + Sync {
    /// Hash the secret and insert a new row
    ///
    /// A duplicate `(id, namespace)` is a backend error.
    async fn create(&self, passkey: &NewPasskey) -> StoreResult<Passkey>;

    /// Fetch a live (non-expired) row, verifying the secret if one is given
    async fn read(&self, lookup: &PasskeyLookup) -> StoreResult<Passkey>;

    /// Re-hash the secret and replace reward/expiry, preserving `created_at`
    ///
    /// Not-found is detected from the write itself, never from a prior read.
    async fn update(&self, update: &PasskeyUpdate) -> StoreResult<Passkey>;

    /// Delete atomically, rolling back if secret verification fails
    async fn delete(&self, lookup: &PasskeyLookup) -> StoreResult<Passkey>;

    /// Remove every row whose expiry is at or before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Check backend liveness
    async fn ping(&self) -> StoreResult<()>;
}
