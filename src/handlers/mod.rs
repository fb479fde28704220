pub mod admin;
pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(health::ping))
        .route(
            "/webhook",
            get(webhook::verify_webhook)
                .post(webhook::receive_webhook)
                .layer(DefaultBodyLimit::max(webhook::WEBHOOK_BODY_LIMIT)),
        )
        .route("/admin", get(admin::admin_page))
        .route("/api/admin/send", post(admin::send_message))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route("/api/admin/logs", get(admin::get_logs))
        .route("/api/admin/logs/clear", post(admin::clear_logs))
        .route("/api/admin/logs/events", get(admin::log_events))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/widget/send", post(admin::widget_send))
        .with_state(state)
}
