//! Egress tracking middleware

use super::counting::{CountingBody, EgressSignal};
use super::recorder::EgressRecorder;
use super::EgressState;
use edgegate_core::middleware::{BoxedNext, MiddlewareLayer, ResponseFuture};
use edgegate_core::{Body, ContentId, Request, Response};

/// Measures body bytes delivered for successful retrievals
///
/// Must run after the stages that resolve the content identifier and attach
/// the accounting collaborator. For each request:
///
/// 1. Tracking disabled in [`Env`](edgegate_core::Env): the request passes
///    straight through.
/// 2. The inner response is not 2xx or carries no body: returned untouched.
/// 3. Otherwise the body is wrapped in a [`CountingBody`] and a deferred task
///    is registered that records the total once the client has consumed the
///    whole body. Errored or abandoned bodies record nothing.
///
/// The response is never delayed: recording happens after the body ends, on
/// the request's background registrar.
///
/// # Example
///
/// ```rust,ignore
/// use edgegate_extras::{AccountingLayer, ContentIdLayer, EgressTrackerLayer};
///
/// let mut stack = LayerStack::new();
/// stack.push(Box::new(ContentIdLayer::new()));
/// stack.push(Box::new(AccountingLayer::new(accounting)));
/// stack.push(Box::new(EgressTrackerLayer::new()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct EgressTrackerLayer;

impl EgressTrackerLayer {
    pub fn new() -> Self {
        Self
    }
}

impl MiddlewareLayer for EgressTrackerLayer {
    fn call(&self, req: Request, next: BoxedNext) -> ResponseFuture {
        if !req.env().egress_tracking_enabled {
            tracing::trace!(state = ?EgressState::Disabled, "Egress tracking off");
            return next(req);
        }

        let cid = req.ctx().data_cid().cloned();
        let accounting = req.ctx().accounting();
        let tasks = req.ctx().tasks().clone();

        Box::pin(async move {
            let response = next(req).await;

            if !response.status().is_success() || response.body().is_absent() {
                tracing::trace!(
                    state = ?EgressState::Skipped,
                    status = %response.status().as_u16(),
                    "Response not eligible for egress tracking"
                );
                return response;
            }

            let (cid, accounting) = match (cid, accounting) {
                (Some(cid), Some(accounting)) => (cid, accounting),
                (None, _) => {
                    tracing::warn!("No content identifier on request, egress not tracked");
                    return response;
                }
                (Some(cid), None) => {
                    tracing::warn!(cid = %cid, "No accounting collaborator attached, egress not tracked");
                    return response;
                }
            };

            let (response, signal) = wrap_response(response);
            tracing::trace!(state = ?EgressState::Tracking, cid = %cid, "Counting response body");
            let recorder = EgressRecorder::new(accounting);
            tasks.wait_until(async move {
                let state = track_egress(signal, recorder, cid).await;
                tracing::trace!(state = ?state, "Egress tracking finished");
            });
            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

/// Swap the body for a counting wrapper, keeping status, headers and extensions
fn wrap_response(response: Response) -> (Response, EgressSignal) {
    let (parts, body) = response.into_parts();
    let (counting, signal) = CountingBody::new(body);
    (Response::from_parts(parts, Body::new(counting)), signal)
}

/// Wait for the stream to end and record its total if it completed
pub async fn track_egress(signal: EgressSignal, recorder: EgressRecorder, cid: ContentId) -> EgressState {
    let outcome = signal.outcome().await;
    match outcome.completed_bytes() {
        Some(bytes) => recorder.record(&cid, bytes).await,
        None => {
            tracing::debug!(cid = %cid, outcome = ?outcome, "Stream did not complete, egress not recorded");
            EgressState::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::MemoryAccounting;
    use edgegate_core::{handler_fn, BackgroundTasks, Env, LayerStack, RequestContext};
    use bytes::Bytes;
    use http::{header, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;

    const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    fn request(env: Env, accounting: &Arc<MemoryAccounting>, tasks: &BackgroundTasks) -> Request {
        let req = http::Request::builder()
            .uri(format!("/ipfs/{}", CID))
            .body(Bytes::new())
            .unwrap();
        let mut req = Request::from_http(req, Arc::new(env), RequestContext::new(tasks.clone()));
        req.ctx_mut().set_data_cid(ContentId::parse(CID).unwrap());
        req.ctx_mut().set_accounting(accounting.clone());
        req
    }

    fn tracked() -> LayerStack {
        let mut stack = LayerStack::new();
        stack.push(Box::new(EgressTrackerLayer::new()));
        stack
    }

    #[tokio::test]
    async fn test_headers_and_status_preserved() {
        let accounting = Arc::new(MemoryAccounting::new());
        let tasks = BackgroundTasks::new();
        let handler = handler_fn(|_req: Request| async {
            let mut headers = http::HeaderMap::new();
            headers.insert(header::ETAG, http::HeaderValue::from_static("\"bafy\""));
            (StatusCode::OK, headers, "Hello, World!")
        });

        let env = Env::new().with_egress_tracking(true);
        let response = tracked().execute(request(env, &accounting, &tasks), handler).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::ETAG).unwrap(), "\"bafy\"");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello, World!");
        tasks.wait_idle().await;
        assert_eq!(accounting.total_bytes(CID), 13);
    }

    #[tokio::test]
    async fn test_absent_body_is_skipped() {
        let accounting = Arc::new(MemoryAccounting::new());
        let tasks = BackgroundTasks::new();
        let handler = handler_fn(|_req: Request| async { StatusCode::NO_CONTENT });

        let env = Env::new().with_egress_tracking(true);
        let response = tracked().execute(request(env, &accounting, &tasks), handler).await;
        assert!(response.body().is_absent());
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn test_no_deferred_task_when_disabled() {
        let accounting = Arc::new(MemoryAccounting::new());
        let tasks = BackgroundTasks::new();
        let handler = handler_fn(|_req: Request| async { "Hello, World!" });

        let response = tracked().execute(request(Env::new(), &accounting, &tasks), handler).await;
        assert_eq!(tasks.pending(), 0);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello, World!");
        tasks.wait_idle().await;
        assert_eq!(accounting.calls(), 0);
    }

    #[derive(Clone, Default)]
    struct WarningCapture {
        messages: Arc<std::sync::Mutex<Vec<String>>>,
    }

    struct MessageVisitor<'a>(&'a mut String);

    impl tracing::field::Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                let mut message = String::new();
                event.record(&mut MessageVisitor(&mut message));
                self.messages.lock().unwrap().push(message);
            }
        }
    }

    #[tokio::test]
    async fn test_missing_cid_warns_and_passes_through() {
        use tracing_subscriber::layer::SubscriberExt;

        let capture = WarningCapture::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

        let accounting = Arc::new(MemoryAccounting::new());
        let tasks = BackgroundTasks::new();
        let req = http::Request::builder().uri("/health").body(Bytes::new()).unwrap();
        let env = Arc::new(Env::new().with_egress_tracking(true));
        let mut req = Request::from_http(req, env, RequestContext::new(tasks.clone()));
        req.ctx_mut().set_accounting(accounting.clone());

        let handler = handler_fn(|_req: Request| async { "Hello, World!" });
        let response = tracked().execute(req, handler).await;
        assert_eq!(tasks.pending(), 0);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello, World!");
        assert_eq!(accounting.calls(), 0);
        assert_eq!(
            *capture.messages.lock().unwrap(),
            vec!["No content identifier on request, egress not tracked".to_string()]
        );
    }

    #[tokio::test]
    async fn test_track_egress_states() {
        let accounting = Arc::new(MemoryAccounting::new());
        let recorder = EgressRecorder::new(accounting.clone());
        let cid = ContentId::parse(CID).unwrap();

        let (body, signal) = CountingBody::new(Body::from_bytes("abc"));
        let _ = body.collect().await.unwrap();
        assert_eq!(track_egress(signal, recorder.clone(), cid.clone()).await, EgressState::Recorded);

        let (body, signal) = CountingBody::new(Body::from_bytes("abc"));
        drop(body);
        assert_eq!(track_egress(signal, recorder, cid).await, EgressState::Skipped);
        assert_eq!(accounting.calls(), 1);
    }
}
