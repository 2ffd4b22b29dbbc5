//! Request types for the gateway

use crate::context::RequestContext;
use crate::env::Env;
use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};
use std::sync::Arc;

/// HTTP Request wrapper
///
/// Provides access to the parts of an incoming request, the shared
/// [`Env`] and the per-request [`RequestContext`].
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) env: Arc<Env>,
    pub(crate) ctx: RequestContext,
}

impl Request {
    /// Create a new request from parts
    pub fn new(parts: Parts, body: Bytes, env: Arc<Env>, ctx: RequestContext) -> Self {
        Self {
            parts,
            body: Some(body),
            env,
            ctx,
        }
    }

    /// Build a request from an `http::Request` with a buffered body
    pub fn from_http(req: http::Request<Bytes>, env: Arc<Env>, ctx: RequestContext) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body, env, ctx)
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Take the body bytes (can only be called once)
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Gateway environment
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Per-request context
    pub fn ctx(&self) -> &RequestContext {
        &self.ctx
    }

    /// Mutable per-request context
    pub fn ctx_mut(&mut self) -> &mut RequestContext {
        &mut self.ctx
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("ctx", &self.ctx)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http() {
        let http_req = http::Request::builder()
            .method(Method::GET)
            .uri("/ipfs/bafyexample/readme.txt?format=raw")
            .header("host", "gateway.example")
            .body(Bytes::from_static(b"payload"))
            .unwrap();

        let mut req = Request::from_http(http_req, Arc::new(Env::new()), RequestContext::default());
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/ipfs/bafyexample/readme.txt");
        assert_eq!(req.query_string(), Some("format=raw"));
        assert_eq!(req.headers().get("host").unwrap(), "gateway.example");
        assert!(!req.env().egress_tracking_enabled);

        assert_eq!(req.take_body(), Some(Bytes::from_static(b"payload")));
        assert_eq!(req.take_body(), None);
    }
}
