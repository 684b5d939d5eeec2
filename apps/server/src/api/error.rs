//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use passkeys_credential::{ErrorKind, PasskeyError};
use serde::Serialize;

/// Error returned by passkey handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Raised by the lifecycle service.
    #[error(transparent)]
    Passkey(#[from] PasskeyError),

    /// The request could not be decoded before reaching the service.
    #[error("{0}")]
    BadRequest(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// Classification shared with the service errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Passkey(e) => e.kind(),
            Self::BadRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidSecret => StatusCode::FORBIDDEN,
            ErrorKind::DataIntegrity | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Storage and codec details stay in the logs
        let message = match kind {
            ErrorKind::DataIntegrity | ErrorKind::Internal => "internal server error".to_owned(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            code: kind.code(),
            message,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passkeys_credential::{CodecError, Operation, StoreError};

    fn failed(source: StoreError) -> ApiError {
        ApiError::Passkey(PasskeyError::OperationFailed {
            operation: Operation::Read,
            source,
        })
    }

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            failed(StoreError::backend("read", "connection reset")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            failed(
                CodecError::IncompatibleVersion {
                    found: 16,
                    expected: 19
                }
                .into()
            )
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let response = failed(StoreError::backend("read", "password authentication failed"))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INTERNAL");
        assert_eq!(body["message"], "internal server error");
    }
}
