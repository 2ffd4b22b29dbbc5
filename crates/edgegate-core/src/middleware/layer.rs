//! Middleware composition
//!
//! A [`LayerStack`] is an ordered list of [`MiddlewareLayer`] stages. It is
//! folded right-to-left around a terminal handler, so the first layer pushed
//! is the outermost: it sees the request first and the response last.

use crate::request::Request;
use crate::response::Response;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// Future returned by every stage of the pipeline
pub type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A boxed next function for middleware chains
pub type BoxedNext = Arc<dyn Fn(Request) -> ResponseFuture + Send + Sync>;

/// Trait for middleware stages
///
/// A stage receives the request and the rest of the chain as `next`. It may
/// inspect or augment the request context, short-circuit with its own
/// response, or call `next` and transform what comes back.
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(&self, req: Request, next: BoxedNext) -> ResponseFuture;

    /// Clone this middleware into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A stack of middleware layers
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// Create a new empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a middleware layer to the stack
    ///
    /// Layers are executed in the order they are added (outermost first).
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Add a middleware layer to the beginning of the stack
    ///
    /// This layer will be executed first (outermost).
    pub fn prepend(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.insert(0, layer);
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Compose the stack around `handler` into a single handler
    ///
    /// The fold happens once; the returned handler can serve any number of
    /// requests.
    pub fn into_handler(&self, handler: BoxedNext) -> BoxedNext {
        // Build the chain from inside out
        let mut next = handler;
        for layer in self.layers.iter().rev() {
            let layer: Arc<dyn MiddlewareLayer> = Arc::from(layer.clone_box());
            let current_next = next;
            next = Arc::new(move |req: Request| layer.call(req, current_next.clone()));
        }
        next
    }

    /// Execute the middleware stack with a final handler
    pub fn execute(&self, req: Request, handler: BoxedNext) -> ResponseFuture {
        if self.layers.is_empty() {
            return handler(req);
        }
        self.into_handler(handler)(req)
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStack")
            .field("layers", &self.layers.len())
            .finish()
    }
}

/// Tower service over a composed pipeline
pub struct PipelineService {
    handler: BoxedNext,
}

impl PipelineService {
    pub fn new(handler: BoxedNext) -> Self {
        Self { handler }
    }
}

impl Clone for PipelineService {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl Service<Request> for PipelineService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let fut = (self.handler)(req);
        Box::pin(async move { Ok(fut.await) })
    }
}
