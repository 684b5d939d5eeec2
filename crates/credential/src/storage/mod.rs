//! Passkey store backends
//!
//! - [`MemoryPasskeyStore`]: process-local, for tests and single-node use
//! - `PostgresPasskeyStore`: `sqlx`-backed, behind the `postgres` feature

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod transaction;

pub use memory::MemoryPasskeyStore;
#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresPasskeyStore};
pub use transaction::MemoryTransaction;

use secrecy::SecretString;
use tokio::task::spawn_blocking;

use crate::core::{Passkey, StoreError, StoreResult};
use crate::utils::SecretCodec;

/// Hash `secret` on the blocking pool
pub(crate) async fn encode_secret(codec: SecretCodec, secret: &SecretString) -> StoreResult<String> {
    let secret = secret.clone();
    let encoded = spawn_blocking(move || codec.encode(&secret))
        .await
        .map_err(|e| StoreError::backend("encode_secret", e))??;
    Ok(encoded)
}

/// Verify `secret` (if any) against a stored passkey on the blocking pool
pub(crate) async fn verify_secret(
    codec: SecretCodec,
    passkey: &Passkey,
    secret: Option<&SecretString>,
) -> StoreResult<()> {
    let Some(secret) = secret.cloned() else {
        return Ok(());
    };

    let passkey = passkey.clone();
    spawn_blocking(move || check_secret(&codec, &passkey, Some(&secret)))
        .await
        .map_err(|e| StoreError::backend("verify_secret", e))?
}

/// Blocking verification, shared by every backend so read and delete reject
/// mismatches identically.
pub(crate) fn check_secret(
    codec: &SecretCodec,
    passkey: &Passkey,
    secret: Option<&SecretString>,
) -> StoreResult<()> {
    let Some(secret) = secret else {
        return Ok(());
    };

    if codec.verify(secret, &passkey.encoded_secret)? {
        Ok(())
    } else {
        tracing::debug!(
            passkey_id = %passkey.id,
            namespace = %passkey.namespace,
            "secret verification failed"
        );
        Err(StoreError::InvalidSecret { key: passkey.key() })
    }
}
