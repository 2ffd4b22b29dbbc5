//! # Edgegate Core
//!
//! Core library providing the foundational types for the edgegate gateway:
//! the per-request context, the streaming response body, the middleware
//! composition engine and the HTTP server that drives a composed pipeline.
//!
//! This crate is not meant to be used directly. Use `edgegate` instead.

mod accounting;
mod body;
mod cid;
mod context;
mod env;
mod error;
mod handler;
mod logging;
pub mod middleware;
mod request;
mod response;
mod server;
mod tasks;

// Public API
pub use accounting::{AccountingError, UsageAccounting, UsageRecord};
pub use body::{Body, BoxError};
pub use cid::{CidError, CidVersion, ContentId};
pub use context::RequestContext;
pub use env::{Env, Profile};
pub use error::{apply_error_profile, ApiError, Result};
pub use handler::handler_fn;
pub use logging::{init_tracing, init_tracing_with};
pub use middleware::{
    BoxedNext, LayerStack, MiddlewareLayer, PipelineService, RequestId, RequestIdLayer,
    ResponseFuture, TracingLayer,
};
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use server::Server;
pub use tasks::BackgroundTasks;
