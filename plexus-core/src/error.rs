use http::StatusCode;

use crate::response::{json_response, IntoResponse, Response};

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    json_response(status, &body)
}

/// Error kinds produced by route resolution, middleware, dispatch, and the
/// bridge. Each variant corresponds to a row of the error-handling table:
/// registration errors are fatal at boot, request-time errors become
/// structured HTTP responses.
pub enum AppError {
    /// No route matched; no fallback configured.
    RouteNotFound(String),
    /// Registration-time: duplicate `(distributor, host, method, pattern)`.
    RouteConflict(String),
    /// Registration-time: pattern failed to compile.
    PatternSyntax(String),
    /// A shadow route chain revisited a `(module, closure_path)` pair.
    ShadowCycle(String),
    /// CSRF token missing or mismatched.
    CsrfMismatch(String),
    /// Rate limit exceeded; carries the fields callers need to build
    /// `Retry-After` and `X-RateLimit-*` headers.
    RateLimitExceeded {
        key: String,
        max_attempts: u64,
        retry_after: u64,
        reset_at: u64,
    },
    /// Command or bridge target not found.
    CommandNotFound(String),
    /// API gate or bridge allowlist rejected the caller.
    AccessDenied(String),
    /// Bridge call exceeded its timeout.
    BridgeTimeout,
    /// Generic unauthorized/forbidden/bad-request/internal buckets, kept for
    /// middleware and handlers that don't need a named spec error kind.
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
    Custom {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Custom { status, body } => json_response(status, &body),
            AppError::RateLimitExceeded {
                max_attempts,
                retry_after,
                reset_at,
                ..
            } => {
                let body = serde_json::json!({
                    "error": "Too Many Requests",
                    "max_attempts": max_attempts,
                    "retry_after": retry_after,
                });
                let mut resp = json_response(StatusCode::TOO_MANY_REQUESTS, &body);
                resp.headers_mut().insert(
                    "Retry-After",
                    http::HeaderValue::from_str(&retry_after.to_string())
                        .unwrap_or_else(|_| http::HeaderValue::from_static("1")),
                );
                crate::middleware::apply_rate_limit_headers(&mut resp, max_attempts, 0, reset_at);
                resp
            }
            AppError::CsrfMismatch(msg) => error_response(StatusCode::from_u16(419).unwrap(), msg),
            AppError::BridgeTimeout => error_response(StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            other => {
                let (status, message) = match other {
                    AppError::RouteNotFound(msg) => (StatusCode::NOT_FOUND, msg),
                    AppError::RouteConflict(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
                    AppError::PatternSyntax(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
                    AppError::ShadowCycle(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
                    AppError::CommandNotFound(msg) => (StatusCode::NOT_FOUND, msg),
                    AppError::AccessDenied(msg) => (StatusCode::FORBIDDEN, msg),
                    AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
                    AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
                    AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
                    AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
                    _ => unreachable!("handled above"),
                };
                error_response(status, message)
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::RouteNotFound(msg) => write!(f, "route not found: {msg}"),
            AppError::RouteConflict(msg) => write!(f, "route conflict: {msg}"),
            AppError::PatternSyntax(msg) => write!(f, "pattern syntax error: {msg}"),
            AppError::ShadowCycle(msg) => write!(f, "shadow route cycle: {msg}"),
            AppError::CsrfMismatch(msg) => write!(f, "csrf mismatch: {msg}"),
            AppError::RateLimitExceeded {
                key,
                max_attempts,
                retry_after,
                ..
            } => write!(
                f,
                "rate limit exceeded for '{key}': max {max_attempts}, retry after {retry_after}s"
            ),
            AppError::CommandNotFound(msg) => write!(f, "command not found: {msg}"),
            AppError::AccessDenied(msg) => write!(f, "access denied: {msg}"),
            AppError::BridgeTimeout => write!(f, "bridge call timed out"),
            AppError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
            AppError::Custom { status, body } => write!(f, "custom error ({status}): {body}"),
        }
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Generate `From<E> for AppError` implementations that map error types to
/// a specific `AppError` variant.
///
/// ```ignore
/// plexus_core::map_error! {
///     serde_json::Error => BadRequest,
/// }
/// ```
#[macro_export]
macro_rules! map_error {
    ( $( $err_ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$err_ty> for $crate::AppError {
                fn from(err: $err_ty) -> Self {
                    $crate::AppError::$variant(err.to_string())
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn route_not_found_is_404() {
        assert_eq!(status_of(AppError::RouteNotFound("x".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn csrf_mismatch_is_419() {
        assert_eq!(
            status_of(AppError::CsrfMismatch("bad token".into())),
            StatusCode::from_u16(419).unwrap()
        );
    }

    #[test]
    fn rate_limit_exceeded_is_429_with_retry_after_header() {
        let err = AppError::RateLimitExceeded {
            key: "ip:1.1.1.1".into(),
            max_attempts: 3,
            retry_after: 42,
            reset_at: 1_700_000_042,
        };
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "42");
        assert_eq!(resp.headers().get("X-RateLimit-Limit").unwrap(), "3");
        assert_eq!(resp.headers().get("X-RateLimit-Remaining").unwrap(), "0");
        assert_eq!(resp.headers().get("X-RateLimit-Reset").unwrap(), "1700000042");
    }

    #[test]
    fn access_denied_is_403() {
        assert_eq!(status_of(AppError::AccessDenied("no".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bridge_timeout_is_504() {
        assert_eq!(status_of(AppError::BridgeTimeout), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn custom_status_and_body_round_trip() {
        let body = serde_json::json!({"detail": "teapot"});
        let err = AppError::Custom {
            status: StatusCode::IM_A_TEAPOT,
            body: body.clone(),
        };
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn app_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let app_err: AppError = io_err.into();
        match app_err {
            AppError::Internal(msg) => assert!(msg.contains("file missing")),
            other => panic!("expected Internal, got {other}"),
        }
    }
}
