//! Time utilities for passkeys

use chrono::{DateTime, Duration, Utc};

use crate::core::FieldError;

/// Resolve a relative lifetime into an absolute expiry
///
/// `None` means the passkey never expires. Negative durations are allowed
/// and produce an already-expired passkey.
///
/// # Errors
///
/// Returns a [`FieldError`] on `expires_in` if `now + expires_in` is outside
/// the representable range.
pub fn expires_at(
    now: DateTime<Utc>,
    expires_in: Option<Duration>,
) -> Result<Option<DateTime<Utc>>, FieldError> {
    expires_in
        .map(|d| {
            now.checked_add_signed(d)
                .ok_or_else(|| FieldError::new("expires_in", "is out of range"))
        })
        .transpose()
}
