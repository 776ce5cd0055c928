//! Component tests for the gated router: CORS, preflight, token checks and
//! the frontend bypass, exercised through the full middleware stack.

use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use access_gate::access_key::AccessKeyMinter;
use access_gate::config::GateConfig;
use access_gate::security::CipherProfile;
use access_gate::server::{self, GateState, UNAUTHORIZED_MESSAGE};

const SECRET: &str = "s3cr3t";

fn config(pairs: &[(&str, &str)]) -> GateConfig {
    let mut map: HashMap<String, String> = HashMap::new();
    map.insert("APP_KEY".into(), SECRET.into());
    map.insert("ACCESS_KEY_EXPIRE".into(), "9999".into());
    for (k, v) in pairs {
        map.insert(k.to_string(), v.to_string());
    }
    GateConfig::from_lookup(|k| map.get(k).cloned()).unwrap()
}

fn app(cfg: &GateConfig) -> Router {
    server::router(GateState::from_config(cfg).unwrap())
}

fn minter(key: &str, secret: &str) -> AccessKeyMinter {
    AccessKeyMinter::new(CipherProfile::Framework.build(key).unwrap(), secret)
}

fn get(path: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, headers, body)
}

fn assert_cors(headers: &axum::http::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-methods"], server::CORS_ALLOW_METHODS);
    assert!(headers["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .contains("Access-Key"));
}

#[tokio::test]
async fn preflight_short_circuits_before_token_logic() {
    let cfg = config(&[]);
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/secure-endpoint")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(app(&cfg), req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    assert_cors(&headers);
}

#[tokio::test]
async fn missing_token_is_unauthorized_with_cors() {
    let cfg = config(&[]);
    let (status, headers, body) = send(app(&cfg), get("/secure-endpoint", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_cors(&headers);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "message": UNAUTHORIZED_MESSAGE }));
}

#[tokio::test]
async fn fresh_token_is_admitted() {
    let cfg = config(&[]);
    let token = minter(SECRET, SECRET).mint().unwrap();
    let (status, headers, body) =
        send(app(&cfg), get("/secure-endpoint", &[("Access-Key", token.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Authorized");
}

#[tokio::test]
async fn admitted_caller_is_visible_to_handlers() {
    let cfg = config(&[]);
    let issued_at = Utc::now().timestamp() - 42;
    let token = minter(SECRET, SECRET).mint_at(issued_at).unwrap();
    let (status, _, body) = send(app(&cfg), get("/health", &[("access-key", token.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["caller"], "service");
    assert_eq!(json["issued_at"], issued_at);
}

#[tokio::test]
async fn every_rejection_looks_the_same() {
    let cfg = config(&[]);
    let now = Utc::now().timestamp();

    let stale = minter(SECRET, SECRET).mint_at(now - 20_000).unwrap();
    let future = minter(SECRET, SECRET).mint_at(now + 3_600).unwrap();
    let wrong_secret = minter(SECRET, "not-the-secret").mint_at(now).unwrap();
    let wrong_key = minter("other-key", SECRET).mint_at(now).unwrap();

    let (_, _, missing_body) = send(app(&cfg), get("/secure-endpoint", &[])).await;

    for token in [stale.as_str(), future.as_str(), wrong_secret.as_str(), wrong_key.as_str(), "garbage"] {
        let (status, _, body) =
            send(app(&cfg), get("/secure-endpoint", &[("access-key", token)])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, missing_body);
    }
}

#[tokio::test]
async fn end_to_end_window() {
    let cfg = config(&[]);
    let now = Utc::now().timestamp();
    let m = minter(SECRET, SECRET);

    // Minted 100s ago: inside the 9999s window.
    let recent = m.mint_at(now - 100).unwrap();
    let (status, _, _) = send(app(&cfg), get("/secure-endpoint", &[("access-key", recent.as_str())])).await;
    assert_eq!(status, StatusCode::OK);

    // Minted 20000s ago: outside.
    let old = m.mint_at(now - 20_000).unwrap();
    let (status, _, _) = send(app(&cfg), get("/secure-endpoint", &[("access-key", old.as_str())])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_paths_are_gated_too() {
    let cfg = config(&[]);
    let (status, _, _) = send(app(&cfg), get("/nope", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn required_origin_bypass() {
    let cfg = config(&[
        ("FRONTEND_BYPASS_ENABLED", "true"),
        ("FRONTEND_ALLOWED_ORIGINS", "http://a"),
        ("FRONTEND_REQUIRE_ORIGIN", "true"),
        ("FRONTEND_TRUST_BROWSER_AGENT", "true"),
    ]);

    let (status, _, _) = send(app(&cfg), get("/secure-endpoint", &[("origin", "http://b")])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(app(&cfg), get("/health", &[("origin", "http://a")])).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["caller"], "frontend");
}

#[tokio::test]
async fn bypass_disabled_ignores_frontend_headers() {
    let cfg = config(&[
        ("FRONTEND_ALLOWED_ORIGINS", "http://a"),
        ("FRONTEND_TRUST_BROWSER_AGENT", "true"),
    ]);
    let (status, _, _) = send(
        app(&cfg),
        get("/secure-endpoint", &[("origin", "http://a"), ("user-agent", "Mozilla/5.0")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn json_profile_gate() {
    let key = "base64:v9N+xLCNqMhbBWv1YNFLDpFDR9S1e62gHHfdIwYQHYs=";
    let cfg = config(&[("APP_KEY", key), ("APP_CIPHER_PROFILE", "json")]);
    let m = AccessKeyMinter::new(CipherProfile::Json.build(key).unwrap(), key);
    let token = m.mint().unwrap();
    let (status, _, _) = send(app(&cfg), get("/secure-endpoint", &[("access-key", token.as_str())])).await;
    assert_eq!(status, StatusCode::OK);
}
