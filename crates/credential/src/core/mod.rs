//! Core types for passkey management

mod error;
mod id;
mod passkey;

pub use error::{
    CodecError, ErrorKind, FieldError, Operation, PasskeyError, StoreError, ValidationErrors,
};
pub use id::PasskeyId;
pub use passkey::{Passkey, PasskeyKey, Reward};

/// Result alias for lifecycle operations
pub type PasskeyResult<T> = Result<T, PasskeyError>;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

// Re-exports from secrecy
pub use secrecy::SecretString;
