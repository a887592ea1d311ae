//! Request correlation for calls made against the portal backend.
//!
//! Every logical request carries one `x-request-id`; failover attempts for the
//! same request reuse it so backend logs can be stitched together.

use reqwest::header::{HeaderMap, HeaderValue};

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Insert the request ID unless the caller already supplied one.
pub fn inject_request_id(headers: &mut HeaderMap, request_id: &str) {
    if headers.contains_key(REQUEST_ID_HEADER) {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}
