//! Passkeys Credential - namespaced passkey lifecycle engine
//!
//! Issues, verifies, rotates and revokes passkeys: opaque secrets bound to an
//! identifier and a namespace, with an optional reward payload and expiry.
//!
//! # Features
//!
//! - **Argon2id secret codec** - self-describing encodings, constant-time verification
//! - **Namespaced identity** - `(id, namespace)` composite keys
//! - **Transactional delete** - verification failure rolls the delete back
//! - **Pluggable storage** - in-memory and PostgreSQL (`postgres` feature)
#![forbid(unsafe_code)]

/// Core types, errors, and identifiers
pub mod core;
/// Passkey manager - lifecycle service
pub mod manager;
/// Store backends
pub mod storage;
/// Core traits for storage
pub mod traits;
/// Utilities for hashing, time and field validation
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────
// Commonly-used types available directly as `passkeys_credential::TypeName`.

pub use crate::core::{
    CodecError, ErrorKind, FieldError, Operation, Passkey, PasskeyError, PasskeyId, PasskeyKey,
    PasskeyResult, Reward, SecretString, StoreError, StoreResult, ValidationErrors,
};
pub use crate::manager::{
    CreatePasskeyRequest, CreatePasskeyResponse, DeletePasskeyRequest, PasskeyManager,
    PasskeyResponse, ReadPasskeyRequest, UpdatePasskeyRequest,
};
pub use crate::storage::MemoryPasskeyStore;
#[cfg(feature = "postgres")]
pub use crate::storage::{PostgresConfig, PostgresPasskeyStore};
pub use crate::traits::{NewPasskey, PasskeyLookup, PasskeyStore, PasskeyUpdate};
pub use crate::utils::{HashParams, SecretCodec};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::core::{
        ErrorKind, Passkey, PasskeyError, PasskeyId, PasskeyKey, Reward, SecretString,
        StoreError,
    };

    pub use crate::manager::{
        CreatePasskeyRequest, CreatePasskeyResponse, DeletePasskeyRequest, PasskeyManager,
        PasskeyResponse, ReadPasskeyRequest, UpdatePasskeyRequest,
    };

    pub use crate::storage::MemoryPasskeyStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::{PostgresConfig, PostgresPasskeyStore};

    pub use crate::traits::PasskeyStore;

    pub use crate::utils::{HashParams, SecretCodec};
}
