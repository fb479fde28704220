use axum::http::HeaderMap;

use crate::errors::AppError;

/// Byte comparison whose running time does not depend on where the inputs
/// first differ.
pub fn constant_time_eq(left: &str, right: &str) -> bool {
    let left = left.as_bytes();
    let right = right.as_bytes();
    let mut diff = left.len() ^ right.len();
    for index in 0..left.len().max(right.len()) {
        let l = left.get(index).copied().unwrap_or(0);
        let r = right.get(index).copied().unwrap_or(0);
        diff |= (l ^ r) as usize;
    }
    diff == 0
}

pub fn check_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    check_token(token, expected_token)
}

pub fn check_token(token: &str, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() || !constant_time_eq(token, expected_token) {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
