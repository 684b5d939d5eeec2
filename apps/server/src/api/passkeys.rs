//! Passkey lifecycle endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::Duration;
use passkeys_credential::{
    CreatePasskeyRequest, CreatePasskeyResponse, DeletePasskeyRequest, PasskeyResponse,
    ReadPasskeyRequest, Reward, UpdatePasskeyRequest,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use super::error::ApiError;

/// Header carrying the plaintext secret.
pub const PASSWORD_HEADER: &str = "x-passkey-password";

/// Body of `POST /v1/passkeys`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePasskeyBody {
    /// Namespace to issue under.
    pub namespace: String,
    /// Opaque payload returned on read.
    #[serde(default)]
    pub reward: Option<Reward>,
    /// Lifetime in seconds; negative values create an already expired passkey.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Body of `PUT /v1/passkeys/{namespace}/{id}`.
///
/// Absent fields clear the stored values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasskeyBody {
    /// Replacement payload.
    #[serde(default)]
    pub reward: Option<Reward>,
    /// Replacement lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Query string of read and delete.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateQuery {
    /// Verify the secret header before answering.
    #[serde(default)]
    pub validate: bool,
}

/// Issue a new passkey.
pub async fn create_passkey(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreatePasskeyBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePasskeyResponse>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    debug!(namespace = %body.namespace, "creating passkey via API");

    let request = CreatePasskeyRequest {
        namespace: body.namespace,
        secret: required_secret(&headers)?,
        reward: body.reward,
        expires_in: lifetime(body.expires_in)?,
    };

    let created = state.manager.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch a passkey, verifying the secret header when `validate=true`.
pub async fn read_passkey(
    State(state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    query: Result<Query<ValidateQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<PasskeyResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let request = ReadPasskeyRequest {
        id,
        namespace,
        secret: secret(&headers)?,
        validate: query.validate,
    };

    Ok(Json(state.manager.read(request).await?))
}

/// Rotate the secret and replace reward and expiry.
pub async fn update_passkey(
    State(state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Json<UpdatePasskeyBody>, JsonRejection>,
) -> Result<Json<PasskeyResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let request = UpdatePasskeyRequest {
        id,
        namespace,
        secret: required_secret(&headers)?,
        reward: body.reward,
        expires_in: lifetime(body.expires_in)?,
    };

    Ok(Json(state.manager.update(request).await?))
}

/// Revoke a passkey, verifying the secret header when `validate=true`.
pub async fn delete_passkey(
    State(state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    query: Result<Query<ValidateQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<PasskeyResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let request = DeletePasskeyRequest {
        id,
        namespace,
        secret: secret(&headers)?,
        validate: query.validate,
    };

    Ok(Json(state.manager.delete(request).await?))
}

fn secret(headers: &HeaderMap) -> Result<Option<SecretString>, ApiError> {
    headers
        .get(PASSWORD_HEADER)
        .map(|value| {
            value
                .to_str()
                .map(|s| SecretString::from(s.to_owned()))
                .map_err(|_| {
                    ApiError::BadRequest(format!("{PASSWORD_HEADER} header must be visible ASCII"))
                })
        })
        .transpose()
}

/// A missing header becomes an empty secret so the service reports it as a
/// field error alongside any others.
fn required_secret(headers: &HeaderMap) -> Result<SecretString, ApiError> {
    Ok(secret(headers)?.unwrap_or_else(|| SecretString::from(String::new())))
}

fn lifetime(seconds: Option<i64>) -> Result<Option<Duration>, ApiError> {
    seconds
        .map(|s| {
            Duration::try_seconds(s)
                .ok_or_else(|| ApiError::BadRequest(format!("expiresIn: {s} seconds is out of range")))
        })
        .transpose()
}
