mod middleware;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    middleware as axum_middleware, routing, Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::access_key::{AccessKeyValidator, FrontendPolicy};
use crate::config::GateConfig;
use crate::error::GateResult;

pub use middleware::{access_key_middleware, unauthorized, AuthenticatedCaller, UNAUTHORIZED_MESSAGE};

pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization, accept, origin, Cache-Control, X-Requested-With, Access-Key";
pub const CORS_ALLOW_METHODS: &str = "POST, HEAD, PATCH, OPTIONS, GET, PUT, DELETE";

/// Shared, read-only state for the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub validator: Arc<AccessKeyValidator>,
    pub frontend: Arc<FrontendPolicy>,
}

impl GateState {
    pub fn new(validator: AccessKeyValidator, frontend: FrontendPolicy) -> Self {
        Self {
            validator: Arc::new(validator),
            frontend: Arc::new(frontend),
        }
    }

    /// Build from configuration. Fails on unusable key material.
    pub fn from_config(config: &GateConfig) -> GateResult<Self> {
        let cipher = config.cipher_profile.build(&config.app_key)?;
        let validator = AccessKeyValidator::new(cipher, config.app_key.clone(), config.expire_secs);
        Ok(Self::new(validator, config.frontend.clone()))
    }
}

/// Wrap `routes` with the Access-Key gate and permissive CORS headers.
///
/// CORS headers land on every response, including 401 and the 204 sent for
/// `OPTIONS`.
pub fn gate(routes: Router<GateState>, state: GateState) -> Router {
    routes
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            access_key_middleware,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .with_state(state)
}

/// Demo service: every route sits behind the gate.
pub fn router(state: GateState) -> Router {
    let routes = Router::new()
        .route("/secure-endpoint", routing::get(secure_endpoint))
        .route("/health", routing::get(health));
    gate(routes, state)
}

pub async fn start_server(config: GateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = GateState::from_config(&config)?;
    let window_secs = state.validator.window_secs();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!(
        "Access gate listening on {} profile={} window={}s frontend_bypass={}",
        config.addr, config.cipher_profile, window_secs, config.frontend.enabled
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn secure_endpoint() -> Json<Value> {
    Json(json!({ "message": "Authorized" }))
}

async fn health(Extension(caller): Extension<AuthenticatedCaller>) -> Json<Value> {
    match caller {
        AuthenticatedCaller::AccessKey { issued_at } => {
            Json(json!({ "status": "ok", "caller": "service", "issued_at": issued_at }))
        }
        AuthenticatedCaller::Frontend(_) => Json(json!({ "status": "ok", "caller": "frontend" })),
    }
}
