//! Passkey Manager - Central interface for passkey lifecycle operations
//!
//! Validates requests, computes timestamps, delegates to a [`PasskeyStore`]
//! and shapes responses.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::requests::{
    CreatePasskeyRequest, CreatePasskeyResponse, DeletePasskeyRequest, PasskeyResponse,
    ReadPasskeyRequest, UpdatePasskeyRequest,
};
use super::validation::{validate_create, validate_delete, validate_read, validate_update};
use crate::core::{ErrorKind, Operation, PasskeyError, PasskeyResult, StoreError};
use crate::traits::PasskeyStore;

/// Lifecycle service over a passkey store
#[derive(Clone)]
pub struct PasskeyManager {
    store: Arc<dyn PasskeyStore>,
}

impl std::fmt::Debug for PasskeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasskeyManager").finish_non_exhaustive()
    }
}

impl PasskeyManager {
    /// Create a manager over `store`
    ///
    /// # Examples
    ///
    /// ```
    /// use passkeys_credential::prelude::*;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let codec = SecretCodec::new(HashParams::default())?;
    /// let manager = PasskeyManager::new(Arc::new(MemoryPasskeyStore::new(codec)));
    ///
    /// let created = manager
    ///     .create(CreatePasskeyRequest::new("tenant-a", "open-sesame"))
    ///     .await?;
    /// let read = manager
    ///     .read(ReadPasskeyRequest::verified(&created.id, "tenant-a", "open-sesame"))
    ///     .await?;
    /// assert_eq!(read.id, created.id);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(store: Arc<dyn PasskeyStore>) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn PasskeyStore> {
        &self.store
    }

    /// Issue a new passkey with a fresh identifier
    ///
    /// # Errors
    ///
    /// - [`PasskeyError::InvalidRequest`] if the namespace or secret is out of bounds
    /// - [`PasskeyError::OperationFailed`] on any store or codec failure
    pub async fn create(
        &self,
        request: CreatePasskeyRequest,
    ) -> PasskeyResult<CreatePasskeyResponse> {
        let passkey = validate_create(&request, Utc::now()).inspect_err(log_rejected)?;

        info!(
            passkey_id = %passkey.id,
            namespace = %passkey.namespace,
            expires_at = ?passkey.expires_at,
            "Creating passkey"
        );

        let created = self
            .store
            .create(&passkey)
            .await
            .map_err(|e| failed(Operation::Create, e))?;

        info!(passkey_id = %created.id, "Passkey created");
        Ok(created.into())
    }

    /// Fetch a live passkey, verifying the secret when `validate` is set
    ///
    /// # Errors
    ///
    /// - [`PasskeyError::InvalidRequest`] on a malformed id, missing namespace,
    ///   or a missing secret while `validate` is set
    /// - [`PasskeyError::OperationFailed`] with kind [`ErrorKind::NotFound`] or
    ///   [`ErrorKind::InvalidSecret`], or any other store failure
    pub async fn read(&self, request: ReadPasskeyRequest) -> PasskeyResult<PasskeyResponse> {
        let lookup = validate_read(&request).inspect_err(log_rejected)?;

        debug!(
            passkey_id = %lookup.key.id,
            namespace = %lookup.key.namespace,
            verify = lookup.secret.is_some(),
            "Reading passkey"
        );

        let passkey = self
            .store
            .read(&lookup)
            .await
            .map_err(|e| failed(Operation::Read, e))?;

        Ok(passkey.into())
    }

    /// Rotate the secret and replace reward and expiry wholesale
    ///
    /// `created_at` is preserved and `updated_at` is set to now.
    ///
    /// # Errors
    ///
    /// - [`PasskeyError::InvalidRequest`] on a malformed id, missing namespace
    ///   or out-of-bounds secret
    /// - [`PasskeyError::OperationFailed`] with kind [`ErrorKind::NotFound`] if
    ///   no row matched, or any other store failure
    pub async fn update(&self, request: UpdatePasskeyRequest) -> PasskeyResult<PasskeyResponse> {
        let update = validate_update(&request, Utc::now()).inspect_err(log_rejected)?;

        info!(
            passkey_id = %update.key.id,
            namespace = %update.key.namespace,
            expires_at = ?update.expires_at,
            "Updating passkey"
        );

        let updated = self
            .store
            .update(&update)
            .await
            .map_err(|e| failed(Operation::Update, e))?;

        info!(passkey_id = %updated.id, "Passkey updated");
        Ok(updated.into())
    }

    /// Revoke a passkey
    ///
    /// With `validate` set, the deletion is rolled back unless the secret
    /// verifies.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub async fn delete(&self, request: DeletePasskeyRequest) -> PasskeyResult<PasskeyResponse> {
        let lookup = validate_delete(&request).inspect_err(log_rejected)?;

        info!(
            passkey_id = %lookup.key.id,
            namespace = %lookup.key.namespace,
            verify = lookup.secret.is_some(),
            "Deleting passkey"
        );

        let deleted = self
            .store
            .delete(&lookup)
            .await
            .map_err(|e| failed(Operation::Delete, e))?;

        info!(passkey_id = %deleted.id, "Passkey deleted");
        Ok(deleted.into())
    }

    /// Physically remove every expired passkey
    ///
    /// Returns the number of rows removed.
    pub async fn purge_expired(&self) -> PasskeyResult<u64> {
        let purged = self
            .store
            .purge_expired(Utc::now())
            .await
            .map_err(|e| failed(Operation::Purge, e))?;

        if purged > 0 {
            info!(purged, "Purged expired passkeys");
        }
        Ok(purged)
    }

    /// Check that the store is reachable
    pub async fn ping(&self) -> PasskeyResult<()> {
        self.store
            .ping()
            .await
            .map_err(|e| failed(Operation::Ping, e))
    }
}

fn log_rejected(err: &PasskeyError) {
    debug!(operation = %err.operation(), error = %err, "Rejected invalid request");
}

fn failed(operation: Operation, source: StoreError) -> PasskeyError {
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidSecret => {
            debug!(%operation, error = %source, "Passkey operation refused");
        }
        ErrorKind::DataIntegrity => {
            warn!(%operation, error = %source, "Stored passkey failed to decode");
        }
        ErrorKind::InvalidRequest | ErrorKind::Internal => {
            error!(%operation, error = %source, "Passkey operation failed");
        }
    }
    PasskeyError::OperationFailed { operation, source }
}
