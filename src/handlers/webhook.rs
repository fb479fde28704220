use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::constant_time_eq;
use crate::errors::InboundError;
use crate::models::{InboundEvent, LogContext};
use crate::state::AppState;

/// Largest POST body buffered. Anything bigger is acknowledged without being
/// read.
pub const WEBHOOK_BODY_LIMIT: usize = 1024 * 1024;

/// The three handshake parameters. Meta sends `hub.mode` and friends; proxies
/// and some PHP-style frontends rewrite the dots to underscores, so both
/// spellings are accepted.
#[derive(Debug, Default, PartialEq)]
pub struct VerifyParams {
    pub mode: Option<String>,
    pub token: Option<String>,
    pub challenge: Option<String>,
}

impl VerifyParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            mode: pick(query, "hub_mode", "hub.mode"),
            token: pick(query, "hub_verify_token", "hub.verify_token"),
            challenge: pick(query, "hub_challenge", "hub.challenge"),
        }
    }

    /// The challenge to echo back, if the handshake is valid against the
    /// configured verify token. An empty challenge is still a challenge.
    pub fn verified_challenge(self, configured_token: &str) -> Option<String> {
        if self.mode.as_deref() != Some("subscribe") || configured_token.is_empty() {
            return None;
        }
        let token = self.token.unwrap_or_default();
        if !constant_time_eq(&token, configured_token) {
            return None;
        }
        self.challenge
    }
}

/// Underscore spelling wins when non-empty, then the dotted one; an empty
/// value is only used when nothing better exists.
fn pick(query: &HashMap<String, String>, underscore: &str, dotted: &str) -> Option<String> {
    match (query.get(underscore), query.get(dotted)) {
        (Some(value), _) if !value.is_empty() => Some(value.clone()),
        (_, Some(value)) if !value.is_empty() => Some(value.clone()),
        (first, second) => first.or(second).cloned(),
    }
}

// GET /webhook
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = VerifyParams::from_query(&query);

    state.log.append(
        "verify GET",
        Some(LogContext::Json(json!({
            "mode": params.mode,
            "token": params.token,
            "challenge": params.challenge,
        }))),
    );

    let verify_token = state.settings.credentials().verify_token;
    match params.verified_challenge(&verify_token) {
        Some(challenge) => {
            tracing::info!("WhatsApp webhook verified");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                challenge,
            )
                .into_response()
        }
        None => {
            tracing::warn!("WhatsApp webhook verification failed");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

// POST /webhook
//
// Always answers 200: the platform retries anything else, and a payload it
// shaped wrong once it will keep sending.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(reason = %rejection, "webhook body not read");
            state.log.append(
                "no value in POST",
                Some(LogContext::Text(rejection.body_text())),
            );
            return Json(json!({ "ok": true })).into_response();
        }
    };

    state.log.append(
        "incoming POST raw",
        Some(LogContext::Text(String::from_utf8_lossy(&body).into_owned())),
    );

    let event = match InboundEvent::parse(&body) {
        Ok(event) => event,
        Err(InboundError::MissingFrom) => {
            state.log.append("no from in message", None);
            return Json(json!({ "ok": true })).into_response();
        }
        Err(InboundError::Unparseable(reason)) => {
            tracing::warn!(reason = %reason, "unparseable webhook body");
            state.log.append("no value in POST", Some(LogContext::Text(reason)));
            return Json(json!({ "ok": true })).into_response();
        }
        Err(InboundError::MissingValue) => {
            state.log.append("no value in POST", None);
            return Json(json!({ "ok": true })).into_response();
        }
    };

    tracing::info!(from = %event.from, text = %event.text, "incoming WhatsApp message");

    let reply = event.reply_text();
    let sent = state.messaging.send_message(&event.from, &reply).await;

    state.log.append(
        "inbound->reply",
        Some(LogContext::Json(json!({
            "from": event.from,
            "text": event.text,
            "sent": sent,
        }))),
    );

    Json(json!({ "sent": sent })).into_response()
}
