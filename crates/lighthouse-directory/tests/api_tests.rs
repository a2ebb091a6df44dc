//! Integration tests for the directory API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lighthouse_directory::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    directory::{Directory, DirectoryPolicy},
    registry::MemoryStore,
};
use lighthouse_protocol::{
    listconns_message, register_message, Keypair, ListConnsPayload, LookupPayload, NodeId,
    RegisterPayload,
};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Test policy: wipe available, no freshness window so tests can use
/// small deterministic timestamps.
fn test_policy() -> DirectoryPolicy {
    DirectoryPolicy {
        max_skew_secs: 0,
        wipe_enabled: true,
        ..DirectoryPolicy::default()
    }
}

fn test_app_with_policy(policy: DirectoryPolicy) -> Router {
    let directory = Directory::new(Arc::new(MemoryStore::new()), policy);
    create_router_with_rate_limit(AppState::new(directory), RateLimitState::permissive())
}

fn test_app() -> Router {
    test_app_with_policy(test_policy())
}

fn signed_register(keypair: &Keypair, endpoint: &str, timestamp: u64) -> RegisterPayload {
    let endpoint = endpoint.parse().unwrap();
    let pubkey = keypair.public_key_base64();
    let signature = hex::encode(keypair.sign(&register_message(&endpoint, &pubkey, timestamp)));
    RegisterPayload {
        endpoint,
        pubkey,
        signature,
        timestamp,
    }
}

fn signed_listconns(keypair: &Keypair, id: NodeId, timestamp: u64) -> ListConnsPayload {
    let signature = hex::encode(keypair.sign(&listconns_message(&id, timestamp)));
    ListConnsPayload {
        id,
        signature,
        timestamp,
    }
}

fn lookup_payload(id: NodeId, client: &str, timestamp: u64) -> LookupPayload {
    LookupPayload {
        id,
        client: client.parse().unwrap(),
        timestamp,
    }
}

async fn post_json<T: serde::Serialize>(app: &Router, path: &str, payload: &T) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    get_with_headers(app, path, &[]).await
}

async fn get_with_headers(app: &Router, path: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["registrations"], 0);
}

#[tokio::test]
async fn test_register_then_lookup_resolves_endpoint() {
    let app = test_app();
    let keypair = Keypair::generate();

    let (status, json) = post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], keypair.node_id().to_string());
    assert_eq!(json["endpoint"], "10.0.0.1:9000");

    let (status, json) = post_json(
        &app,
        "/lookup",
        &lookup_payload(keypair.node_id(), "1.1.1.1:9999", 2),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["endpoint"], "10.0.0.1:9000");
}

#[tokio::test]
async fn test_reregister_is_last_write_wins() {
    let app = test_app();
    let keypair = Keypair::generate();

    post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;
    let (status, _) =
        post_json(&app, "/register", &signed_register(&keypair, "10.0.0.2:9001", 2)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = post_json(
        &app,
        "/lookup",
        &lookup_payload(keypair.node_id(), "1.1.1.1:9999", 3),
    )
    .await;
    assert_eq!(json["endpoint"], "10.0.0.2:9001");

    // One live registration, not two
    let (_, json) = get(&app, "/health").await;
    assert_eq!(json["registrations"], 1);
}

#[tokio::test]
async fn test_register_with_bad_signature_does_not_mutate() {
    let app = test_app();
    let keypair = Keypair::generate();

    post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;

    // Forged overwrite attempt: fresh timestamp, garbage signature
    let mut forged = signed_register(&keypair, "6.6.6.6:666", 2);
    forged.signature = hex::encode([0u8; 64]);
    let (status, json) = post_json(&app, "/register", &forged).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "UNAUTHORIZED");

    // The prior registration is untouched
    let (_, json) = post_json(
        &app,
        "/lookup",
        &lookup_payload(keypair.node_id(), "1.1.1.1:9999", 3),
    )
    .await;
    assert_eq!(json["endpoint"], "10.0.0.1:9000");

    // And the forgery did not consume timestamp 2 for the real owner
    let (status, _) =
        post_json(&app, "/register", &signed_register(&keypair, "10.0.0.2:9001", 2)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_with_malformed_encodings_is_invalid_input() {
    let app = test_app();
    let keypair = Keypair::generate();

    let mut payload = signed_register(&keypair, "10.0.0.1:9000", 1);
    payload.pubkey = "not base64!!!".into();
    let (status, json) = post_json(&app, "/register", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");

    let mut payload = signed_register(&keypair, "10.0.0.1:9000", 1);
    payload.signature = "zz".into();
    let (status, json) = post_json(&app, "/register", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_register_rejects_unknown_fields() {
    let app = test_app();

    let (status, _) = post_json(
        &app,
        "/register",
        &serde_json::json!({
            "endpoint": "10.0.0.1:9000",
            "pubkey": "aa",
            "signature": "bb",
            "timestamp": 1,
            "admin": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_rejects_malformed_endpoint() {
    let app = test_app();

    let (status, _) = post_json(
        &app,
        "/register",
        &serde_json::json!({
            "endpoint": "not an address",
            "pubkey": "aa",
            "signature": "bb",
            "timestamp": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_replayed_register_is_rejected() {
    let app = test_app();
    let keypair = Keypair::generate();
    let payload = signed_register(&keypair, "10.0.0.1:9000", 1);

    let (status, _) = post_json(&app, "/register", &payload).await;
    assert_eq!(status, StatusCode::OK);

    // Byte-for-byte replay: same signature, same timestamp
    let (status, json) = post_json(&app, "/register", &payload).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "STALE_TIMESTAMP");
}

#[tokio::test]
async fn test_replayed_listconns_is_rejected() {
    let app = test_app();
    let keypair = Keypair::generate();

    post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;
    let payload = signed_listconns(&keypair, keypair.node_id(), 2);

    let (status, _) = post_json(&app, "/listconns", &payload).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(&app, "/listconns", &payload).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "STALE_TIMESTAMP");
}

#[tokio::test]
async fn test_listconns_returns_history_most_recent_first() {
    let app = test_app();
    let keypair = Keypair::generate();
    let id = keypair.node_id();

    post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;
    post_json(&app, "/lookup", &lookup_payload(id, "1.1.1.1:1111", 2)).await;
    post_json(&app, "/lookup", &lookup_payload(id, "2.2.2.2:2222", 3)).await;

    let (status, json) = post_json(&app, "/listconns", &signed_listconns(&keypair, id, 4)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["peers"][0]["client"], "2.2.2.2:2222");
    assert_eq!(json["peers"][1]["client"], "1.1.1.1:1111");
}

#[tokio::test]
async fn test_listconns_requires_owner_signature() {
    let app = test_app();
    let owner = Keypair::generate();
    let intruder = Keypair::generate();

    post_json(&app, "/register", &signed_register(&owner, "10.0.0.1:9000", 1)).await;
    post_json(
        &app,
        "/lookup",
        &lookup_payload(owner.node_id(), "1.1.1.1:9999", 2),
    )
    .await;

    // Signed with the wrong key over the right message
    let (status, json) = post_json(
        &app,
        "/listconns",
        &signed_listconns(&intruder, owner.node_id(), 3),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_listconns_unknown_identity_is_not_found() {
    let app = test_app();
    let keypair = Keypair::generate();

    let (status, json) = post_json(
        &app,
        "/listconns",
        &signed_listconns(&keypair, keypair.node_id(), 1),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_lookup_unknown_identity_is_not_found() {
    let app = test_app();
    let id = Keypair::generate().node_id();

    let (status, json) = post_json(&app, "/lookup", &lookup_payload(id, "1.1.1.1:9999", 1)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_full_scenario_register_lookup_listconns_wipe() {
    let app = test_app();
    let keypair = Keypair::generate();
    let id = keypair.node_id();

    // Register A at 10.0.0.1:9000
    let (status, _) =
        post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;
    assert_eq!(status, StatusCode::OK);

    // Lookup from 1.1.1.1:9999 resolves it
    let (status, json) = post_json(&app, "/lookup", &lookup_payload(id, "1.1.1.1:9999", 2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["endpoint"], "10.0.0.1:9000");

    // listconns(A) shows exactly that one client
    let (status, json) = post_json(&app, "/listconns", &signed_listconns(&keypair, id, 3)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["peers"][0]["client"], "1.1.1.1:9999");

    // Wipe resets everything
    let (status, json) = get(&app, "/wipe").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "wiped");
    assert_eq!(json["registrations_removed"], 1);

    // Lookup now misses
    let (status, _) = post_json(&app, "/lookup", &lookup_payload(id, "1.1.1.1:9999", 4)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Replay state was reset too: the original register is accepted again
    let (status, _) =
        post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 1)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wipe_rejected_when_disabled() {
    let app = test_app_with_policy(DirectoryPolicy {
        max_skew_secs: 0,
        wipe_enabled: false,
        ..DirectoryPolicy::default()
    });

    let (status, json) = get(&app, "/wipe").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_wipe_requires_configured_admin_token() {
    let app = test_app_with_policy(DirectoryPolicy {
        max_skew_secs: 0,
        wipe_enabled: true,
        wipe_token: Some(SecretString::new("hunter2".into())),
        ..DirectoryPolicy::default()
    });

    let (status, _) = get(&app, "/wipe").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get_with_headers(&app, "/wipe", &[("x-admin-token", "wrong")]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = get_with_headers(&app, "/wipe", &[("x-admin-token", "hunter2")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "wiped");
}

#[tokio::test]
async fn test_stale_timestamp_outside_freshness_window() {
    let app = test_app_with_policy(DirectoryPolicy {
        max_skew_secs: 60,
        wipe_enabled: true,
        ..DirectoryPolicy::default()
    });
    let keypair = Keypair::generate();

    // Unix timestamp 111 is decades outside any sane window
    let (status, json) =
        post_json(&app, "/register", &signed_register(&keypair, "10.0.0.1:9000", 111)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "STALE_TIMESTAMP");
}

#[tokio::test]
async fn test_rate_limiting() {
    let directory = Directory::new(Arc::new(MemoryStore::new()), test_policy());
    let app = create_router_with_rate_limit(AppState::new(directory), RateLimitState::new(1));

    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
}
