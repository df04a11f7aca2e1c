//! A minimal HTTP response vocabulary shared by middleware, dispatch, and
//! error handling. Plexus does not depend on a full web framework — routes
//! are resolved by the custom pattern compiler in [`crate::routing`], not a
//! router type, so only the response half of the `http` crate is needed.

use bytes::Bytes;
use http::StatusCode;

/// The response type produced by handlers, middleware, and errors.
pub type Response = http::Response<Bytes>;

/// Converts a value into a [`Response`].
///
/// Mirrors Axum's `IntoResponse`, scoped down to what Plexus needs: status
/// codes, JSON bodies, and raw bytes.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for (StatusCode, serde_json::Value) {
    fn into_response(self) -> Response {
        json_response(self.0, &self.1)
    }
}

impl IntoResponse for (StatusCode, &str) {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(self.0)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Bytes::from(self.1.to_string()))
            .expect("static response parts are always valid")
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(self)
            .body(Bytes::new())
            .expect("status-only response is always valid")
    }
}

/// Build a `200 OK` response with the given bytes as the body.
pub fn ok_bytes(body: impl Into<Bytes>) -> Response {
    http::Response::builder()
        .status(StatusCode::OK)
        .body(body.into())
        .expect("ok response is always valid")
}

/// Build a JSON response with the given status code.
pub fn json_response(status: StatusCode, value: &serde_json::Value) -> Response {
    let body = serde_json::to_vec(value).unwrap_or_default();
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body))
        .expect("json response is always valid")
}
