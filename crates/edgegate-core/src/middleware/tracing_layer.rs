//! Tracing middleware
//!
//! Logs request method, path, request_id, content identifier, status code,
//! and duration for each request. Supports custom fields that are included
//! in the completion event.

use super::layer::{BoxedNext, MiddlewareLayer, ResponseFuture};
use super::request_id::RequestId;
use crate::request::Request;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware layer that creates tracing spans for requests
///
/// This layer creates an `http_request` span for each request containing:
/// - HTTP method
/// - Request path
/// - Request ID (if [`RequestIdLayer`](super::RequestIdLayer) runs first)
/// - Content identifier, when already resolved or recorded on the span by a
///   CID-resolving stage running inside this one
/// - Response status code
/// - Request duration
///
/// # Example
///
/// ```rust,ignore
/// use edgegate_core::middleware::{LayerStack, RequestIdLayer, TracingLayer};
///
/// let mut stack = LayerStack::new();
/// stack.push(Box::new(RequestIdLayer::new()));
/// stack.push(Box::new(TracingLayer::new().with_field("service", "edge-gateway")));
/// ```
#[derive(Clone)]
pub struct TracingLayer {
    level: Level,
    custom_fields: Vec<(String, String)>,
}

impl TracingLayer {
    /// Create a new TracingLayer with default INFO level
    pub fn new() -> Self {
        Self {
            level: Level::INFO,
            custom_fields: Vec::new(),
        }
    }

    /// Create a TracingLayer with a specific log level
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            custom_fields: Vec::new(),
        }
    }

    /// Add a custom field to every completion event
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push((key.into(), value.into()));
        self
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

fn format_fields(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

impl MiddlewareLayer for TracingLayer {
    fn call(&self, req: Request, next: BoxedNext) -> ResponseFuture {
        let level = self.level;
        let method = req.method().to_string();
        let path = req.path().to_string();
        let fields = format_fields(&self.custom_fields);

        let request_id = req
            .ctx()
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let cid = req.ctx().data_cid().map(|cid| cid.to_string());

        Box::pin(async move {
            let start = Instant::now();

            let span = info_span!(
                "http_request",
                method = %method,
                path = %path,
                request_id = %request_id,
                cid = tracing::field::Empty,
                status = tracing::field::Empty,
                duration_ms = tracing::field::Empty,
                error = tracing::field::Empty,
            );

            if let Some(cid) = &cid {
                span.record("cid", cid.as_str());
            }

            // Inner stages resolve the CID synchronously inside `next`
            let inner = {
                let _enter = span.enter();
                next(req)
            };
            let response = inner.instrument(span.clone()).await;

            let duration_ms = start.elapsed().as_millis() as u64;
            let status = response.status();
            let status_code = status.as_u16();

            span.record("status", status_code);
            span.record("duration_ms", duration_ms);
            if status.is_client_error() || status.is_server_error() {
                span.record("error", true);
            }

            let _enter = span.enter();
            if status.is_success() {
                match level {
                    Level::TRACE => tracing::trace!(status = %status_code, duration_ms, fields = %fields, "Request completed"),
                    Level::DEBUG => tracing::debug!(status = %status_code, duration_ms, fields = %fields, "Request completed"),
                    Level::INFO => tracing::info!(status = %status_code, duration_ms, fields = %fields, "Request completed"),
                    Level::WARN => tracing::warn!(status = %status_code, duration_ms, fields = %fields, "Request completed"),
                    Level::ERROR => tracing::error!(status = %status_code, duration_ms, fields = %fields, "Request completed"),
                }
            } else {
                tracing::warn!(
                    status = %status_code,
                    duration_ms,
                    fields = %fields,
                    error = true,
                    "Request failed"
                );
            }

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::env::Env;
    use crate::handler::handler_fn;
    use crate::middleware::layer::LayerStack;
    use crate::middleware::request_id::RequestIdLayer;
    use crate::ContentId;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    fn create_test_request(method: Method, path: &str) -> Request {
        let req = http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap();
        Request::from_http(req, Arc::new(Env::new()), RequestContext::default())
    }

    #[test]
    fn test_tracing_layer_creation() {
        let layer = TracingLayer::new();
        assert_eq!(layer.level, Level::INFO);
        assert!(layer.custom_fields.is_empty());

        let layer = TracingLayer::with_level(Level::DEBUG);
        assert_eq!(layer.level, Level::DEBUG);
    }

    #[test]
    fn test_tracing_layer_with_custom_fields() {
        let layer = TracingLayer::new()
            .with_field("service", "edge")
            .with_field("region", "eu-west");

        assert_eq!(layer.custom_fields.len(), 2);
        assert_eq!(format_fields(&layer.custom_fields), "service=edge region=eu-west");
    }

    /// A test subscriber that captures span fields for verification
    #[derive(Clone, Default)]
    struct SpanFieldCapture {
        captured: Arc<Mutex<Vec<CapturedSpan>>>,
    }

    #[derive(Debug, Clone)]
    struct CapturedSpan {
        name: String,
        fields: HashMap<String, String>,
    }

    impl SpanFieldCapture {
        fn spans(&self) -> Vec<CapturedSpan> {
            self.captured.lock().unwrap().clone()
        }
    }

    impl<S> tracing_subscriber::Layer<S> for SpanFieldCapture
    where
        S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut fields = HashMap::new();
            attrs.record(&mut FieldVisitor { fields: &mut fields });
            self.captured.lock().unwrap().push(CapturedSpan {
                name: attrs.metadata().name().to_string(),
                fields,
            });
        }

        fn on_record(
            &self,
            _id: &tracing::span::Id,
            values: &tracing::span::Record<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut captured = self.captured.lock().unwrap();
            if let Some(last) = captured.last_mut() {
                values.record(&mut FieldVisitor { fields: &mut last.fields });
            }
        }
    }

    struct FieldVisitor<'a> {
        fields: &'a mut HashMap<String, String>,
    }

    impl<'a> tracing::field::Visit for FieldVisitor<'a> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.fields.insert(field.name().to_string(), format!("{:?}", value));
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.fields.insert(field.name().to_string(), value.to_string());
        }

        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            self.fields.insert(field.name().to_string(), value.to_string());
        }

        fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    #[tokio::test]
    async fn test_span_carries_content_identifier() {
        let capture = SpanFieldCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut stack = LayerStack::new();
        stack.push(Box::new(TracingLayer::new()));

        let mut req = create_test_request(Method::GET, "/ipfs/bafy");
        let cid = ContentId::parse("bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi").unwrap();
        req.ctx_mut().set_data_cid(cid.clone());

        stack.execute(req, handler_fn(|_req: Request| async { "ok" })).await;

        let spans = capture.spans();
        let span = spans.iter().find(|s| s.name == "http_request").unwrap();
        assert_eq!(span.fields.get("cid").unwrap(), cid.as_str());
        assert_eq!(span.fields.get("status").unwrap(), "200");
    }

    // Every request span carries method, path, request id, status and
    // duration; failures are flagged.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_tracing_span_completeness(
            method_idx in 0usize..3usize,
            path in "/[a-z]{1,10}(/[a-z]{1,10})?",
            status_code in 200u16..600u16,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let capture = SpanFieldCapture::default();
                let subscriber = tracing_subscriber::registry().with(capture.clone());
                let _guard = tracing::subscriber::set_default(subscriber);

                let mut stack = LayerStack::new();
                stack.push(Box::new(RequestIdLayer::new()));
                stack.push(Box::new(TracingLayer::new()));

                let methods = [Method::GET, Method::HEAD, Method::OPTIONS];
                let method = methods[method_idx].clone();
                let response_status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::OK);

                let handler = handler_fn(move |_req: Request| async move { response_status });
                let response = stack.execute(create_test_request(method.clone(), &path), handler).await;
                prop_assert_eq!(response.status(), response_status);

                let spans = capture.spans();
                let span = spans.iter().find(|s| s.name == "http_request");
                prop_assert!(span.is_some(), "Should have created an http_request span");
                let span = span.unwrap();

                prop_assert_eq!(span.fields.get("method").map(String::as_str), Some(method.as_str()));
                prop_assert_eq!(span.fields.get("path"), Some(&path));
                prop_assert!(span.fields.get("request_id").map(|id| id != "unknown").unwrap_or(false));
                prop_assert_eq!(span.fields.get("status"), Some(&status_code.to_string()));
                prop_assert!(span.fields.contains_key("duration_ms"));

                let flagged = span.fields.get("error").map(|v| v == "true").unwrap_or(false);
                prop_assert_eq!(flagged, status_code >= 400);
                Ok(())
            });
            result?;
        }
    }
}
