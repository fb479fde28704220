use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("log error: {0}")]
    Log(#[from] std::io::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Log(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Why an outbound send did not go through. The sender resolves every variant
/// to `false` after logging it.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("missing credentials")]
    ConfigurationMissing,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream rejected with status {status}")]
    UpstreamRejected { status: u16, body: String },
}

/// Why an inbound webhook payload produced no reply.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InboundError {
    #[error("unparseable body: {0}")]
    Unparseable(String),

    #[error("no value in POST")]
    MissingValue,

    #[error("no from in message")]
    MissingFrom,
}
