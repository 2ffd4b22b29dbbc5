//! Terminal content handlers
//!
//! The innermost stage of a pipeline is a plain async function from
//! [`Request`] to anything implementing [`IntoResponse`]. Content resolution
//! lives behind this contract.

use crate::middleware::{BoxedNext, ResponseFuture};
use crate::request::Request;
use crate::response::IntoResponse;
use std::future::Future;
use std::sync::Arc;

/// Adapt an async function into a terminal [`BoxedNext`] handler
///
/// # Example
///
/// ```rust,ignore
/// use edgegate_core::{handler_fn, ApiError, Request};
///
/// let handler = handler_fn(|req: Request| async move {
///     match req.ctx().data_cid() {
///         Some(cid) => Ok(format!("serving {}", cid)),
///         None => Err(ApiError::not_found("no content identifier")),
///     }
/// });
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> BoxedNext
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |req: Request| {
        let fut = f(req);
        Box::pin(async move { fut.await.into_response() }) as ResponseFuture
    })
}
