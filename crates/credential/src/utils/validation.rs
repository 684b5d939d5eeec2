//! Field rules shared by every lifecycle request
//!
//! Lengths are counted in characters, not bytes.

use secrecy::{ExposeSecret, SecretString};

use crate::core::FieldError;

/// Maximum namespace length
pub const NAMESPACE_MAX_LENGTH: usize = 256;

/// Minimum secret length
pub const SECRET_MIN_LENGTH: usize = 4;

/// Maximum secret length
pub const SECRET_MAX_LENGTH: usize = 4096;

/// Validate a character count against inclusive bounds
///
/// # Examples
///
/// ```
/// use passkeys_credential::utils::validate_length;
///
/// assert!(validate_length("namespace", "tenant-a", 1, 256).is_ok());
/// assert!(validate_length("namespace", "", 1, 256).is_err());
/// ```
pub fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), FieldError> {
    let len = value.chars().count();

    if len == 0 && min > 0 {
        return Err(FieldError::new(field, "is required"));
    }
    if len < min {
        return Err(FieldError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    if len > max {
        return Err(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }

    Ok(())
}

/// Validate a namespace: required, at most 256 characters
pub fn validate_namespace(namespace: &str) -> Result<(), FieldError> {
    validate_length("namespace", namespace, 1, NAMESPACE_MAX_LENGTH)
}

/// Validate a secret: 4 to 4096 characters
pub fn validate_secret(secret: &SecretString) -> Result<(), FieldError> {
    validate_length(
        "secret",
        secret.expose_secret(),
        SECRET_MIN_LENGTH,
        SECRET_MAX_LENGTH,
    )
}

/// Maximum SQL identifier length (PostgreSQL's `NAMEDATALEN - 1`)
pub const SQL_IDENTIFIER_MAX_LENGTH: usize = 63;

/// Validate a schema or table name: ASCII letter or `_`, then letters,
/// digits or `_`
///
/// # Examples
///
/// ```
/// use passkeys_credential::utils::validate_sql_identifier;
///
/// assert!(validate_sql_identifier("table_name", "passkeys").is_ok());
/// assert!(validate_sql_identifier("table_name", "passkeys; DROP TABLE x").is_err());
/// ```
pub fn validate_sql_identifier(field: &'static str, value: &str) -> Result<(), FieldError> {
    validate_length(field, value, 1, SQL_IDENTIFIER_MAX_LENGTH)?;

    let mut chars = value.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_well || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FieldError::new(
            field,
            "must be a plain SQL identifier ([A-Za-z_][A-Za-z0-9_]*)",
        ));
    }

    Ok(())
}
