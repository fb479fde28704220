use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use axum::response::Html;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::auth::{check_bearer, check_token};
use crate::errors::AppError;
use crate::models::{LogContext, SettingsUpdate};
use crate::state::AppState;

static ADMIN_HTML: &str = include_str!("../web/admin.html");

const DEFAULT_LOG_LINES: u64 = 300;
const DASHBOARD_LOG_LINES: usize = 5;

pub const SEND_OK_NOTICE: &str = "Message sent ✅";
pub const SEND_FAILED_NOTICE: &str = "Failed to send ❌ — check credentials & logs.";

pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_HTML)
}

/// Bodies are taken raw and decoded only after the bearer check, so an
/// unauthenticated caller always sees 401 whatever it sent.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

// POST /api/admin/send
#[derive(Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct NoticeResponse {
    ok: bool,
    notice: &'static str,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<NoticeResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;
    let body: SendRequest = parse_body(&body)?;

    let phone = body.phone.trim();
    let message = body.message.trim();

    let ok = if phone.is_empty() || message.is_empty() {
        false
    } else {
        state.messaging.send_message(phone, message).await
    };

    Ok(Json(NoticeResponse {
        ok,
        notice: if ok { SEND_OK_NOTICE } else { SEND_FAILED_NOTICE },
    }))
}

// GET /api/admin/settings
#[derive(Serialize)]
pub struct SettingsResponse {
    access_token: String,
    phone_number_id: String,
    verify_token: String,
    widget_send_enabled: bool,
    webhook_path: &'static str,
    ping_path: &'static str,
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SettingsResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    let creds = state.settings.credentials();
    Ok(Json(SettingsResponse {
        access_token: creds.access_token,
        phone_number_id: creds.phone_number_id,
        verify_token: creds.verify_token,
        widget_send_enabled: state.settings.widget_send_enabled(),
        webhook_path: "/webhook",
        ping_path: "/ping",
    }))
}

// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<NoticeResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;
    let body: SettingsUpdate = parse_body(&body)?;

    state.settings.apply(&body)?;
    tracing::info!("settings updated");

    Ok(Json(NoticeResponse {
        ok: true,
        notice: "Settings saved.",
    }))
}

// GET /api/admin/logs
#[derive(Deserialize)]
pub struct LogsQuery {
    pub lines: Option<i64>,
}

#[derive(Serialize)]
pub struct LogsResponse {
    lines: Vec<String>,
    size_bytes: u64,
    exists: bool,
}

/// `lines` is read as `abs(lines)`; `0` means the whole file.
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    let count = query
        .lines
        .map(i64::unsigned_abs)
        .unwrap_or(DEFAULT_LOG_LINES);
    let count = match usize::try_from(count) {
        Ok(0) | Err(_) => usize::MAX,
        Ok(n) => n,
    };

    Ok(Json(LogsResponse {
        lines: state.log.tail(count),
        size_bytes: state.log.size_bytes(),
        exists: state.log.exists(),
    }))
}

// POST /api/admin/logs/clear
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<NoticeResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    state.log.clear()?;
    tracing::info!("event log cleared");

    Ok(Json(NoticeResponse {
        ok: true,
        notice: "Logs cleared.",
    }))
}

// GET /api/admin/logs/events (SSE)
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
}

pub async fn log_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource can't set headers, so the token rides in the query.
    check_token(query.token.as_deref().unwrap_or(""), &state.config.admin_token)?;

    let live = BroadcastStream::new(state.log.subscribe())
        .filter_map(|result| result.ok())
        .map(|line| Ok::<_, Infallible>(Event::default().data(line).event("log_line")));

    let keepalive = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Ok(Sse::new(live.merge(keepalive)))
}

// GET /api/admin/dashboard
#[derive(Serialize)]
pub struct DashboardResponse {
    widget_send_enabled: bool,
    recent_lines: Vec<String>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;

    Ok(Json(DashboardResponse {
        widget_send_enabled: state.settings.widget_send_enabled(),
        recent_lines: state.log.tail(DASHBOARD_LOG_LINES),
    }))
}

// POST /api/admin/widget/send
#[derive(Serialize)]
pub struct WidgetResponse {
    success: bool,
    data: &'static str,
}

impl WidgetResponse {
    fn success(data: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }

    fn error(data: &'static str) -> Json<Self> {
        Json(Self {
            success: false,
            data,
        })
    }
}

pub async fn widget_send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WidgetResponse>, AppError> {
    check_bearer(&headers, &state.config.admin_token)?;
    let body: SendRequest = parse_body(&body)?;

    if !state.settings.widget_send_enabled() {
        return Ok(WidgetResponse::error(
            "Widget sending is disabled in settings.",
        ));
    }

    let phone = body.phone.trim();
    let message = body.message.trim();
    if phone.is_empty() || message.is_empty() {
        return Ok(WidgetResponse::error("Phone and message required."));
    }

    if state.messaging.send_message(phone, message).await {
        state.log.append(
            "widget quick send ok",
            Some(LogContext::Json(json!({ "phone": phone }))),
        );
        Ok(WidgetResponse::success("Message sent successfully ✅"))
    } else {
        state.log.append(
            "widget quick send failed",
            Some(LogContext::Json(json!({ "phone": phone }))),
        );
        Ok(WidgetResponse::error("Failed to send. Check settings & logs."))
    }
}
