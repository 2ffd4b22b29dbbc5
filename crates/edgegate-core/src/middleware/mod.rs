//! Middleware infrastructure for the gateway
//!
//! Middleware stages implement [`MiddlewareLayer`] and are composed by a
//! [`LayerStack`] around a terminal content handler. The order in which
//! stages are pushed is part of the contract: later stages may depend on
//! context fields written by earlier ones.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgegate_core::middleware::{LayerStack, RequestIdLayer, TracingLayer};
//! use edgegate_core::handler_fn;
//!
//! let mut stack = LayerStack::new();
//! stack.push(Box::new(RequestIdLayer::new()));
//! stack.push(Box::new(TracingLayer::new()));
//!
//! let pipeline = stack.into_handler(handler_fn(|_req| async { "hello" }));
//! ```

mod layer;
mod request_id;
mod tracing_layer;

pub use layer::{BoxedNext, LayerStack, MiddlewareLayer, PipelineService, ResponseFuture};
pub use request_id::{RequestId, RequestIdLayer, REQUEST_ID_HEADER};
pub use tracing_layer::TracingLayer;
