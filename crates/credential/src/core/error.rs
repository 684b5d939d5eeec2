//! Error types for passkey operations
//!
//! This module defines a three-tier error hierarchy:
//! - [`PasskeyError`]: Top-level error returned by the lifecycle service
//! - [`StoreError`]: Not found, secret mismatch, backend failures
//! - [`CodecError`]: Encoded secret parsing and hashing failures
//!
//! Callers branch on [`PasskeyError::kind`] instead of matching on messages.
//!
//! # Error Conversion Examples
//!
//! ```
//! use passkeys_credential::core::{CodecError, ErrorKind, StoreError};
//!
//! let codec_err = CodecError::MalformedEncoding {
//!     reason: "expected 6 fields, found 2".to_string(),
//! };
//! let store_err: StoreError = codec_err.into();
//! assert_eq!(store_err.kind(), ErrorKind::DataIntegrity);
//! ```

use std::fmt;

use thiserror::Error;

use super::passkey::PasskeyKey;

/// Coarse classification of a failure, independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request failed field validation before touching the store
    InvalidRequest,
    /// No live passkey matches the key
    NotFound,
    /// Supplied secret does not match the stored encoding
    InvalidSecret,
    /// Stored encoding cannot be parsed or uses an unsupported version
    DataIntegrity,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidSecret => "INVALID_SECRET",
            Self::DataIntegrity => "DATA_INTEGRITY",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Lifecycle operation an error was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Issue a new passkey
    Create,
    /// Fetch (and optionally verify) a passkey
    Read,
    /// Rotate the secret and replace payload/expiry
    Update,
    /// Revoke a passkey
    Delete,
    /// Remove expired rows
    Purge,
    /// Backend liveness probe
    Ping,
}

impl Operation {
    /// Lowercase operation name, as used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Purge => "purge",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level passkey error
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// Request failed validation; the store was not touched
    #[error("Invalid {operation} request: {errors}")]
    InvalidRequest {
        /// Operation that rejected the request
        operation: Operation,
        /// Every field error found in the request
        errors: ValidationErrors,
    },

    /// Store or codec failure during an operation
    #[error("Failed to {operation} passkey: {source}")]
    OperationFailed {
        /// Operation that failed
        operation: Operation,
        /// Underlying store error
        #[source]
        source: StoreError,
    },
}

impl PasskeyError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::OperationFailed { source, .. } => source.kind(),
        }
    }

    /// Operation the error was raised from
    pub fn operation(&self) -> Operation {
        match self {
            Self::InvalidRequest { operation, .. } | Self::OperationFailed { operation, .. } => {
                *operation
            }
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this is a secret mismatch
    pub fn is_invalid_secret(&self) -> bool {
        self.kind() == ErrorKind::InvalidSecret
    }

    /// Check if this is a validation failure
    pub fn is_invalid_request(&self) -> bool {
        self.kind() == ErrorKind::InvalidRequest
    }
}

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live row matches the composite key
    #[error("Passkey '{key}' not found")]
    NotFound {
        /// Composite key that was looked up
        key: PasskeyKey,
    },

    /// Supplied secret failed verification
    #[error("Secret does not match passkey '{key}'")]
    InvalidSecret {
        /// Composite key of the passkey
        key: PasskeyKey,
    },

    /// Secret codec failure
    #[error("Secret codec error: {source}")]
    Codec {
        /// Underlying codec error
        #[from]
        source: CodecError,
    },

    /// Backend failure (connection, constraint violation, row decoding)
    #[error("Storage operation '{operation}' failed: {reason}")]
    Backend {
        /// Backend operation that failed
        operation: String,
        /// Failure reason
        reason: String,
    },
}

impl StoreError {
    /// Create a backend error
    pub fn backend(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Backend {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidSecret { .. } => ErrorKind::InvalidSecret,
            Self::Codec { source } => source.kind(),
            Self::Backend { .. } => ErrorKind::Internal,
        }
    }
}

/// Secret codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Encoded secret could not be parsed
    #[error("Malformed encoded secret: {reason}")]
    MalformedEncoding {
        /// What was wrong with the encoding
        reason: String,
    },

    /// Encoded secret was produced by a different algorithm version
    #[error("Incompatible argon2 version {found} (expected {expected})")]
    IncompatibleVersion {
        /// Version embedded in the encoding
        found: u32,
        /// Version this codec produces
        expected: u32,
    },

    /// OS random generator failed to produce a salt
    #[error("Entropy source unavailable: {reason}")]
    EntropyUnavailable {
        /// Generator error
        reason: String,
    },

    /// Key derivation failed
    #[error("Key derivation failed: {reason}")]
    Hashing {
        /// Derivation error
        reason: String,
    },

    /// Cost parameters rejected before use
    #[error("Invalid hash parameters: {reason}")]
    InvalidParams {
        /// Which parameter is out of range
        reason: String,
    },
}

impl CodecError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedEncoding { .. } | Self::IncompatibleVersion { .. } => {
                ErrorKind::DataIntegrity
            }
            Self::EntropyUnavailable { .. } | Self::Hashing { .. } | Self::InvalidParams { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

/// A single rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Request field name
    pub field: &'static str,
    /// Human-readable rule that failed
    pub message: String,
}

impl FieldError {
    /// Create a field error
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All field errors found in one request, reported together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Record another field error
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// No field errors recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of field errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate field errors in the order they were found
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether a given field was rejected
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PasskeyId;

    fn key() -> PasskeyKey {
        PasskeyKey::new(PasskeyId::new(), "tenant-a")
    }

    #[test]
    fn test_store_error_kinds() {
        assert_eq!(StoreError::NotFound { key: key() }.kind(), ErrorKind::NotFound);
        assert_eq!(
            StoreError::InvalidSecret { key: key() }.kind(),
            ErrorKind::InvalidSecret
        );
        assert_eq!(
            StoreError::backend("insert", "duplicate key").kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_codec_errors_convert_into_store_errors() {
        let err: StoreError = CodecError::IncompatibleVersion {
            found: 16,
            expected: 19,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);

        let err: StoreError = CodecError::EntropyUnavailable {
            reason: "getrandom failed".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_passkey_error_keeps_store_kind() {
        let err = PasskeyError::OperationFailed {
            operation: Operation::Read,
            source: StoreError::NotFound { key: key() },
        };
        assert!(err.is_not_found());
        assert!(!err.is_invalid_secret());
        assert_eq!(err.operation(), Operation::Read);
        assert!(err.to_string().starts_with("Failed to read passkey"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let mut errors = ValidationErrors::default();
        errors.push(FieldError::new("namespace", "is required"));
        errors.push(FieldError::new("secret", "must be at least 4 characters"));

        let err = PasskeyError::InvalidRequest {
            operation: Operation::Create,
            errors,
        };
        assert!(err.is_invalid_request());
        assert_eq!(
            err.to_string(),
            "Invalid create request: namespace: is required; secret: must be at least 4 characters"
        );
    }

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(ErrorKind::NotFound.code(), "NOT_FOUND");
        assert_eq!(ErrorKind::InvalidSecret.to_string(), "INVALID_SECRET");
    }
}
