//! HTTP server implementation
//!
//! Drives a composed pipeline over HTTP/1. Request bodies are buffered before
//! the request enters the pipeline; response bodies are streamed to the
//! client frame by frame.

use crate::body::BoxError;
use crate::context::RequestContext;
use crate::env::Env;
use crate::error::{apply_error_profile, ApiError};
use crate::middleware::{BoxedNext, PipelineService};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::tasks::BackgroundTasks;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

/// HTTP server for a composed pipeline
pub struct Server {
    env: Arc<Env>,
    service: PipelineService,
    tasks: BackgroundTasks,
}

impl Server {
    pub fn new(env: Arc<Env>, handler: BoxedNext, tasks: BackgroundTasks) -> Self {
        Self {
            env,
            service: PipelineService::new(handler),
            tasks,
        }
    }

    /// Bind `addr` and serve until the process exits
    pub async fn run(self, addr: &str) -> Result<(), BoxError> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, std::future::pending()).await
    }

    /// Serve connections from `listener` until `shutdown` resolves
    ///
    /// After shutdown no new connections are accepted, and the call returns
    /// once all deferred work registered by requests has finished.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        info!(addr = %listener.local_addr()?, "Edge gateway listening");
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => break,
            };
            let io = TokioIo::new(stream);
            let env = self.env.clone();
            let pipeline = self.service.clone();
            let tasks = self.tasks.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let env = env.clone();
                    let pipeline = pipeline.clone();
                    let tasks = tasks.clone();
                    async move {
                        let response = handle_request(env, pipeline, tasks, req, remote_addr).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }

        info!(pending = self.tasks.pending(), "Shutting down, draining deferred tasks");
        self.tasks.wait_idle().await;
        Ok(())
    }
}

/// Handle a single HTTP request
async fn handle_request(
    env: Arc<Env>,
    pipeline: PipelineService,
    tasks: BackgroundTasks,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let response = ApiError::bad_request("Failed to read request body")
                .with_internal(err.to_string())
                .into_response();
            let response = apply_error_profile(response, env.profile);
            log_request(&method, &path, response.status(), start);
            return response;
        }
    };

    let mut ctx = RequestContext::new(tasks);
    ctx.extensions_mut().insert(remote_addr);

    let profile = env.profile;
    let response = match pipeline.oneshot(Request::new(parts, body, env, ctx)).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let response = apply_error_profile(response, profile);
    log_request(&method, &path, response.status(), start);
    response
}

/// Log that the response head is ready; the body may still be streaming
fn log_request(method: &http::Method, path: &str, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Response failed"
        );
    } else {
        debug!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Response ready"
        );
    }
}
