//! End-to-end passkey lifecycle through the HTTP router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use passkeys_credential::{HashParams, MemoryPasskeyStore, PasskeyManager, SecretCodec};
use passkeys_server::api::{AppState, PASSWORD_HEADER, router};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let codec = SecretCodec::new(HashParams::insecure_fast()).unwrap();
    let store = Arc::new(MemoryPasskeyStore::new(codec));
    router(AppState::new(PasskeyManager::new(store)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    secret: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(secret) = secret {
        request = request.header(PASSWORD_HEADER, secret);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, namespace: &str, secret: &str, extra: Value) -> String {
    let mut body = json!({ "namespace": namespace });
    if let Value::Object(extra) = extra {
        body.as_object_mut().unwrap().extend(extra);
    }
    let (status, created) = send(app, Method::POST, "/v1/passkeys", Some(secret), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn create_then_read_returns_reward() {
    let app = app();
    let id = create(&app, "tenant-a", "open-sesame", json!({ "reward": { "type": "reward" } })).await;

    let (status, read) = send(&app, Method::GET, &format!("/v1/passkeys/tenant-a/{id}"), None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["id"], json!(id));
    assert_eq!(read["namespace"], "tenant-a");
    assert_eq!(read["reward"], json!({ "type": "reward" }));
    assert!(read["createdAt"].is_string());
    assert!(read.get("updatedAt").is_none());
    assert!(read.get("encodedSecret").is_none());
}

#[tokio::test]
async fn validated_read_checks_header() {
    let app = app();
    let id = create(&app, "tenant-a", "open-sesame", json!({})).await;
    let uri = format!("/v1/passkeys/tenant-a/{id}?validate=true");

    let (status, body) = send(&app, Method::GET, &uri, Some("close-sesame"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_SECRET");

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, _) = send(&app, Method::GET, &uri, Some("open-sesame"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_rotates_secret() {
    let app = app();
    let id = create(&app, "tenant-a", "old-secret", json!({ "reward": { "tier": 1 } })).await;
    let uri = format!("/v1/passkeys/tenant-a/{id}");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some("new-secret"),
        Some(json!({ "reward": { "tier": 2 }, "expiresIn": 3600 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["reward"], json!({ "tier": 2 }));
    assert!(updated["updatedAt"].is_string());
    assert!(updated["expiresAt"].is_string());

    let validated = format!("{uri}?validate=true");
    let (status, _) = send(&app, Method::GET, &validated, Some("old-secret"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, read) = send(&app, Method::GET, &validated, Some("new-secret"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["reward"], json!({ "tier": 2 }));
}

#[tokio::test]
async fn validated_delete_with_wrong_secret_keeps_passkey() {
    let app = app();
    let id = create(&app, "tenant-a", "open-sesame", json!({})).await;
    let uri = format!("/v1/passkeys/tenant-a/{id}");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{uri}?validate=true"),
        Some("close-sesame"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("{uri}?validate=true"),
        Some("open-sesame"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], json!(id));

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn expired_passkey_reads_as_not_found() {
    let app = app();
    let id = create(&app, "tenant-a", "open-sesame", json!({ "expiresIn": -60 })).await;

    let (status, _) = send(&app, Method::GET, &format!("/v1/passkeys/tenant-a/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let app = app();

    // Missing secret header and empty namespace are both reported
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/passkeys",
        None,
        Some(json!({ "namespace": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("namespace"), "{message}");
    assert!(message.contains("secret"), "{message}");

    // Body that is not JSON
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/passkeys")
        .header(PASSWORD_HEADER, "open-sesame")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/v1/passkeys/tenant-a/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn bad_validate_flag_is_a_bad_request() {
    let app = app();
    let id = create(&app, "tenant-a", "open-sesame", json!({})).await;
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/v1/passkeys/tenant-a/{id}?validate=maybe"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}
