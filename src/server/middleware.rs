use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::GateState;
use crate::access_key::{BypassRule, Decision, ACCESS_KEY_HEADER};

/// Body message for every rejected request.
pub const UNAUTHORIZED_MESSAGE: &str = "No service authorization";

/// Who got through the gate. Inserted into request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticatedCaller {
    AccessKey { issued_at: i64 },
    Frontend(BypassRule),
}

pub async fn access_key_middleware(
    State(state): State<GateState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if let Some(rule) = state.frontend.evaluate(req.headers()) {
        log::debug!("AUDIT frontend bypass method={} path={} rule={:?}", method, path, rule);
        req.extensions_mut().insert(AuthenticatedCaller::Frontend(rule));
        return next.run(req).await;
    }

    let decision = state.validator.validate(
        req.headers()
            .get(ACCESS_KEY_HEADER)
            .and_then(|v| v.to_str().ok()),
    );

    match decision {
        Decision::Admit { issued_at } => {
            req.extensions_mut()
                .insert(AuthenticatedCaller::AccessKey { issued_at });
            let response = next.run(req).await;
            log::debug!(
                "AUDIT service method={} path={} status={}",
                method, path, response.status().as_u16()
            );
            response
        }
        Decision::Reject(stage) => {
            log::warn!(
                "AUDIT DENIED method={} path={} stage={} reason={}",
                method, path, stage, stage.reason()
            );
            unauthorized()
        }
    }
}

/// The single response every failed check produces.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": UNAUTHORIZED_MESSAGE })),
    )
        .into_response()
}
