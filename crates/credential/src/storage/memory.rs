//! In-memory passkey store
//!
//! Rows live in a `HashMap` behind a `parking_lot` lock. Argon2 work runs on
//! tokio's blocking pool. Deletion runs there too, inside a
//! [`MemoryTransaction`] that holds the write lock across delete, verify and
//! commit, so no runtime thread waits on the lock during a hash.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::spawn_blocking;

use super::{MemoryTransaction, check_secret, encode_secret, verify_secret};
use crate::core::{Passkey, PasskeyKey, StoreError, StoreResult};
use crate::traits::{NewPasskey, PasskeyLookup, PasskeyStore, PasskeyUpdate};
use crate::utils::SecretCodec;

type Rows = RwLock<HashMap<PasskeyKey, Passkey>>;

/// Process-local [`PasskeyStore`]
#[derive(Debug, Default)]
pub struct MemoryPasskeyStore {
    codec: SecretCodec,
    rows: Arc<Rows>,
}

impl MemoryPasskeyStore {
    /// Create an empty store hashing with `codec`
    pub fn new(codec: SecretCodec) -> Self {
        Self {
            codec,
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored rows, expired ones included
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Run `f` in a transaction: committed on `Ok`, rolled back otherwise
    ///
    /// Blocks the calling thread while the write lock is held.
    pub fn transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut MemoryTransaction<'_>) -> StoreResult<T>,
    {
        run_transaction(&self.rows, f)
    }
}

fn run_transaction<T, F>(rows: &Rows, f: F) -> StoreResult<T>
where
    F: FnOnce(&mut MemoryTransaction<'_>) -> StoreResult<T>,
{
    let mut tx = MemoryTransaction::begin(rows.write());
    match f(&mut tx) {
        Ok(value) => {
            tx.commit();
            Ok(value)
        }
        Err(e) => {
            tx.rollback();
            Err(e)
        }
    }
}

#[async_trait]
impl PasskeyStore for MemoryPasskeyStore {
    async fn create(&self, passkey: &NewPasskey) -> StoreResult<Passkey> {
        let encoded_secret = encode_secret(self.codec, &passkey.secret).await?;
        let key = passkey.key();

        let mut rows = self.rows.write();
        if rows.contains_key(&key) {
            return Err(StoreError::backend(
                "create",
                format!("duplicate key '{key}'"),
            ));
        }

        let record = Passkey {
            id: passkey.id,
            namespace: passkey.namespace.clone(),
            encoded_secret,
            reward: passkey.reward.clone(),
            expires_at: passkey.expires_at,
            created_at: passkey.now,
            updated_at: None,
        };
        rows.insert(key, record.clone());
        Ok(record)
    }

    async fn read(&self, lookup: &PasskeyLookup) -> StoreResult<Passkey> {
        let now = Utc::now();
        let passkey = self
            .rows
            .read()
            .get(&lookup.key)
            .filter(|p| !p.is_expired_at(now))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: lookup.key.clone(),
            })?;

        verify_secret(self.codec, &passkey, lookup.secret.as_ref()).await?;
        Ok(passkey)
    }

    async fn update(&self, update: &PasskeyUpdate) -> StoreResult<Passkey> {
        let encoded_secret = encode_secret(self.codec, &update.secret).await?;

        let mut rows = self.rows.write();
        let row = rows.get_mut(&update.key).ok_or_else(|| StoreError::NotFound {
            key: update.key.clone(),
        })?;

        row.encoded_secret = encoded_secret;
        row.reward = update.reward.clone();
        row.expires_at = update.expires_at;
        row.updated_at = Some(update.now);
        Ok(row.clone())
    }

    async fn delete(&self, lookup: &PasskeyLookup) -> StoreResult<Passkey> {
        let rows = Arc::clone(&self.rows);
        let codec = self.codec;
        let lookup = lookup.clone();

        spawn_blocking(move || {
            run_transaction(&rows, |tx| {
                let removed = tx.remove(&lookup.key).ok_or_else(|| StoreError::NotFound {
                    key: lookup.key.clone(),
                })?;
                check_secret(&codec, &removed, lookup.secret.as_ref())?;
                Ok(removed)
            })
        })
        .await
        .map_err(|e| StoreError::backend("delete", e))?
    }
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|_, p| !p.is_expired_at(now));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorKind, PasskeyId};
    use crate::utils::HashParams;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;

    fn store() -> MemoryPasskeyStore {
        MemoryPasskeyStore::new(SecretCodec::new(HashParams::insecure_fast()).unwrap())
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn new_passkey(namespace: &str, expires_at: Option<DateTime<Utc>>) -> NewPasskey {
        NewPasskey {
            id: PasskeyId::new(),
            namespace: namespace.into(),
            secret: secret("open-sesame"),
            reward: None,
            expires_at,
            now: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_secret() {
        let store = store();
        let created = store.create(&new_passkey("tenant-a", None)).await.unwrap();

        assert!(created.encoded_secret.starts_with("$argon2id$v=19$"));
        assert!(!created.encoded_secret.contains("open-sesame"));
        assert_eq!(created.updated_at, None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_backend_error() {
        let store = store();
        let passkey = new_passkey("tenant-a", None);
        store.create(&passkey).await.unwrap();

        let err = store.create(&passkey).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(matches!(err, StoreError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_same_id_in_two_namespaces() {
        let store = store();
        let a = new_passkey("tenant-a", None);
        let b = NewPasskey {
            namespace: "tenant-b".into(),
            ..a.clone()
        };
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();

        store.delete(&PasskeyLookup::new(a.key())).await.unwrap();
        assert!(store.read(&PasskeyLookup::new(b.key())).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_filters_expired_rows() {
        let store = store();
        let expired = new_passkey("tenant-a", Some(Utc::now() - Duration::seconds(5)));
        store.create(&expired).await.unwrap();

        let err = store.read(&PasskeyLookup::new(expired.key())).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_revives_expired_row() {
        let store = store();
        let expired = new_passkey("tenant-a", Some(Utc::now() - Duration::seconds(5)));
        store.create(&expired).await.unwrap();

        let update = PasskeyUpdate {
            key: expired.key(),
            secret: secret("new-secret"),
            reward: None,
            expires_at: Some(Utc::now() + Duration::minutes(5)),
            now: Utc::now(),
        };
        let updated = store.update(&update).await.unwrap();
        assert_eq!(updated.created_at, expired.now);

        let read = store
            .read(&PasskeyLookup::verified(expired.key(), secret("new-secret")))
            .await
            .unwrap();
        assert_eq!(read.expires_at, update.expires_at);
    }

    #[tokio::test]
    async fn test_transaction_runs_off_runtime_thread() {
        let store = store();
        let passkey = new_passkey("tenant-a", None);
        store.create(&passkey).await.unwrap();

        // The blocking delete needs the write lock; a read guard held here
        // must not stall this single-threaded runtime.
        let guard = store.rows.read();
        let lookup = PasskeyLookup::new(passkey.key());
        let delete = store.delete(&lookup);
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(20), delete).await;
        assert!(outcome.is_err());
        drop(guard);

        // Once started on the blocking pool, the delete runs to completion
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !store.is_empty() {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = store();
        let update = PasskeyUpdate {
            key: PasskeyKey::new(PasskeyId::new(), "tenant-a"),
            secret: secret("new-secret"),
            reward: None,
            expires_at: None,
            now: Utc::now(),
        };
        assert!(matches!(
            store.update(&update).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_verification_keeps_row() {
        let store = store();
        let passkey = new_passkey("tenant-a", None);
        store.create(&passkey).await.unwrap();

        let err = store
            .delete(&PasskeyLookup::verified(passkey.key(), secret("wrong-secret")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSecret { .. }));
        assert_eq!(store.len(), 1);

        let deleted = store
            .delete(&PasskeyLookup::verified(passkey.key(), secret("open-sesame")))
            .await
            .unwrap();
        assert_eq!(deleted.id, passkey.id);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = store();
        let now = Utc::now();
        store
            .create(&new_passkey("tenant-a", Some(now - Duration::minutes(1))))
            .await
            .unwrap();
        store
            .create(&new_passkey("tenant-a", Some(now + Duration::minutes(1))))
            .await
            .unwrap();
        store.create(&new_passkey("tenant-a", None)).await.unwrap();

        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.purge_expired(now).await.unwrap(), 0);
    }
}
