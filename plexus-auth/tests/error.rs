use plexus_auth::error::SecurityError;

use http::StatusCode;
use plexus_core::IntoResponse;

fn error_parts(err: SecurityError) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let json: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
    (status, json)
}

#[test]
fn missing_auth_header_401() {
    let (status, body) = error_parts(SecurityError::MissingAuthHeader);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn invalid_auth_scheme_401() {
    let (status, body) = error_parts(SecurityError::InvalidAuthScheme);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn invalid_token_401() {
    let (status, body) = error_parts(SecurityError::InvalidToken("bad sig".into()));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn token_expired_401() {
    let (status, body) = error_parts(SecurityError::TokenExpired);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn unknown_key_id_401() {
    let (status, body) = error_parts(SecurityError::UnknownKeyId("kid-123".into()));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn jwks_fetch_error_401() {
    let (status, body) = error_parts(SecurityError::JwksFetchError("timeout".into()));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn validation_failed_401() {
    let (status, body) = error_parts(SecurityError::ValidationFailed("bad issuer".into()));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[test]
fn display_formatting() {
    assert_eq!(
        SecurityError::MissingAuthHeader.to_string(),
        "Missing Authorization header"
    );
    assert_eq!(
        SecurityError::InvalidAuthScheme.to_string(),
        "Invalid authorization scheme"
    );
    assert_eq!(
        SecurityError::InvalidToken("x".into()).to_string(),
        "Invalid token: x"
    );
    assert_eq!(SecurityError::TokenExpired.to_string(), "Token expired");
    assert_eq!(
        SecurityError::UnknownKeyId("k".into()).to_string(),
        "Unknown signing key: k"
    );
    assert_eq!(
        SecurityError::JwksFetchError("e".into()).to_string(),
        "JWKS fetch error: e"
    );
    assert_eq!(
        SecurityError::ValidationFailed("v".into()).to_string(),
        "Token validation failed: v"
    );
}

#[test]
fn into_app_error() {
    let sec_err = SecurityError::InvalidToken("bad".into());
    let app_err: plexus_core::AppError = sec_err.into();
    match app_err {
        plexus_core::AppError::Unauthorized(msg) => {
            assert_eq!(msg, "Unauthorized");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[test]
fn json_body_format() {
    let (_, body) = error_parts(SecurityError::TokenExpired);
    assert!(body.is_object());
    assert!(body.get("error").is_some());
    assert!(body.get("error").unwrap().is_string());
}
