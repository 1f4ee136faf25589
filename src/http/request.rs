//! Request identification and path decoding.
//!
//! Every request gets an `x-request-id` (UUID v4) before it reaches the
//! trace layer; an id sent by the client is kept.

use std::borrow::Cow;

use axum::http::{HeaderMap, HeaderValue, Request, Uri};
use percent_encoding::percent_decode_str;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates random UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request id header, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// The request path with percent-escapes decoded; `None` when the result is
/// not valid UTF-8.
pub fn decoded_path(uri: &Uri) -> Option<Cow<'_, str>> {
    percent_decode_str(uri.path()).decode_utf8().ok()
}
