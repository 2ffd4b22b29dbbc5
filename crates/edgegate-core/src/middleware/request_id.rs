//! Request ID middleware
//!
//! Assigns every request an identifier, taken from an incoming
//! `x-request-id` header when present, and echoes it on the response.

use super::layer::{BoxedNext, MiddlewareLayer, ResponseFuture};
use crate::request::Request;
use http::HeaderValue;
use std::fmt;
use uuid::Uuid;

/// Header carrying the request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier of a single request, stored in the request context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware layer that assigns request identifiers
#[derive(Clone, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl MiddlewareLayer for RequestIdLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> ResponseFuture {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| RequestId(v.to_string()))
            .unwrap_or_default();

        req.ctx_mut().extensions_mut().insert(request_id.clone());

        Box::pin(async move {
            let mut response = next(req).await;
            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}
