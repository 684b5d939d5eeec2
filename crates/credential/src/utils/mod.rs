//! Utility modules

pub mod crypto;
pub mod time;
pub mod validation;

// Re-export commonly used types and functions
pub use crypto::{ALGORITHM, HashParams, SecretCodec, VERSION};
pub use time::expires_at;
pub use validation::{
    validate_length, validate_namespace, validate_secret, validate_sql_identifier,
};
