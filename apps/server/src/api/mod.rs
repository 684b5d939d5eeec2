//! HTTP API for the passkeys server.
//!
//! Provides endpoints for:
//! - Passkey lifecycle (create, read, update, delete)
//! - Health and readiness checks
//!
//! The plaintext secret travels in the `x-passkey-password` header, never in
//! a body or query string.

mod error;
mod passkeys;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use passkeys_credential::PasskeyManager;
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use passkeys::{CreatePasskeyBody, PASSWORD_HEADER, UpdatePasskeyBody, ValidateQuery};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lifecycle service behind every passkey route.
    pub manager: PasskeyManager,
}

impl AppState {
    /// State over `manager`.
    pub fn new(manager: PasskeyManager) -> Self {
        Self { manager }
    }
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Passkey lifecycle
        .route("/v1/passkeys", post(passkeys::create_passkey))
        .route(
            "/v1/passkeys/{namespace}/{id}",
            get(passkeys::read_passkey)
                .put(passkeys::update_passkey)
                .delete(passkeys::delete_passkey),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Readiness check endpoint; pings the store.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    match state.manager.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { ready: true })),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse { ready: false }),
        ),
    }
}

/// Health response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Readiness response.
#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use passkeys_credential::{
        HashParams, MemoryPasskeyStore, NewPasskey, Passkey, PasskeyLookup, PasskeyStore,
        PasskeyUpdate, SecretCodec, StoreError, StoreResult,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_app_state() -> AppState {
        let codec = SecretCodec::new(HashParams::insecure_fast()).unwrap();
        AppState::new(PasskeyManager::new(Arc::new(MemoryPasskeyStore::new(codec))))
    }

    /// Store whose backend is unreachable.
    struct DownStore;

    #[async_trait]
    impl PasskeyStore for DownStore {
        async fn create(&self, _: &NewPasskey) -> StoreResult<Passkey> {
            Err(StoreError::backend("create", "down"))
        }
        async fn read(&self, _: &PasskeyLookup) -> StoreResult<Passkey> {
            Err(StoreError::backend("read", "down"))
        }
        async fn update(&self, _: &PasskeyUpdate) -> StoreResult<Passkey> {
            Err(StoreError::backend("update", "down"))
        }
        async fn delete(&self, _: &PasskeyLookup) -> StoreResult<Passkey> {
            Err(StoreError::backend("delete", "down"))
        }
        async fn purge_expired(&self, _: chrono::DateTime<chrono::Utc>) -> StoreResult<u64> {
            Err(StoreError::backend("purge", "down"))
        }
        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::backend("ping", "down"))
        }
    }

    async fn get(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_endpoint() {
        assert_eq!(get(router(make_app_state()), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint() {
        assert_eq!(get(router(make_app_state()), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint_reports_unavailable_store() {
        let state = AppState::new(PasskeyManager::new(Arc::new(DownStore)));
        assert_eq!(
            get(router(state), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn unknown_route() {
        assert_eq!(
            get(router(make_app_state()), "/v1/passkeys/only-namespace").await,
            StatusCode::NOT_FOUND
        );
    }
}
