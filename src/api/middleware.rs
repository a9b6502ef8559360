//! API Middleware
//!
//! Caller identification and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the calling user's id
pub const REQUEST_USER_HEADER: &str = "X-Request-User-Id";

/// Request user from X-Request-User-Id header
#[derive(Debug, Clone, Copy)]
pub struct RequestUser {
    pub user_id: Uuid,
}

// =========================================================================
// Request User Middleware
// =========================================================================

/// Resolve the caller from `X-Request-User-Id`.
///
/// Every item route needs a caller, so a missing or malformed header rejects
/// the request before it reaches a handler.
pub async fn request_user_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = parse_request_user(request.headers())?;
    request.extensions_mut().insert(RequestUser { user_id });

    Ok(next.run(request).await)
}

fn parse_request_user(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(REQUEST_USER_HEADER)
        .ok_or_else(|| AppError::MissingHeader(REQUEST_USER_HEADER.to_string()))?;

    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| {
            AppError::InvalidRequest(format!("{REQUEST_USER_HEADER} must be a UUID"))
        })
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer abc".parse().unwrap());
        headers.insert("x-request-user-id", "user-123".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let user_id = masked.iter().find(|(k, _)| k == "x-request-user-id");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(user_id.unwrap().1, "user-123");
    }

    #[test]
    fn test_parse_request_user() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            parse_request_user(&headers),
            Err(AppError::MissingHeader(_))
        ));

        headers.insert(REQUEST_USER_HEADER, "not-a-uuid".parse().unwrap());
        assert!(matches!(
            parse_request_user(&headers),
            Err(AppError::InvalidRequest(_))
        ));

        headers.insert(REQUEST_USER_HEADER, id.to_string().parse().unwrap());
        assert_eq!(parse_request_user(&headers).unwrap(), id);
    }
}
