//! Gateway application builder

use edgegate_core::middleware::{BoxedNext, LayerStack, MiddlewareLayer, ResponseFuture};
use edgegate_core::{
    apply_error_profile, handler_fn, init_tracing, AccountingError, ApiError, BackgroundTasks,
    BoxError, Env, IntoResponse, Request, RequestIdLayer, Server, TracingLayer, UsageAccounting,
};
use edgegate_extras::{AccountingLayer, ContentIdLayer, EgressTrackerLayer, MemoryAccounting};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Edge gateway builder
///
/// Holds the environment, an ordered middleware stack and the terminal
/// content handler. Layers run in the order they are added (outermost
/// first).
///
/// # Example
///
/// ```rust,ignore
/// use edgegate::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), BoxError> {
///     let env = Env::new().with_egress_tracking(true);
///     let accounting = default_accounting(&env)?;
///
///     Gateway::new(env)
///         .retrieval_pipeline(accounting)
///         .handler(|req: Request| async move { serve_content(req).await })
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct Gateway {
    env: Env,
    layers: LayerStack,
    handler: Option<BoxedNext>,
    tasks: BackgroundTasks,
}

impl Gateway {
    /// Create a gateway for `env`, initializing tracing if not already done
    pub fn new(env: Env) -> Self {
        init_tracing();

        Self {
            env,
            layers: LayerStack::new(),
            handler: None,
            tasks: BackgroundTasks::new(),
        }
    }

    /// Create a gateway configured from `.env` and the process environment
    #[cfg(feature = "config")]
    pub fn from_env() -> Result<Self, edgegate_extras::ConfigError> {
        edgegate_extras::load_dotenv();
        let env = edgegate_extras::env_from_process()?;
        Ok(Self::new(env))
    }

    /// Add a middleware layer
    ///
    /// The first layer added is the first to see the request and the last to
    /// see the response.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: MiddlewareLayer,
    {
        self.layers.push(Box::new(layer));
        self
    }

    /// Add the standard retrieval stages in their required order
    ///
    /// Request id, request tracing, content identifier resolution, the
    /// accounting collaborator and finally egress tracking, which depends
    /// on the two stages resolving the CID and the collaborator. Requests
    /// rejected for a malformed CID are still traced.
    pub fn retrieval_pipeline(self, accounting: Arc<dyn UsageAccounting>) -> Self {
        self.layer(RequestIdLayer::new())
            .layer(TracingLayer::new())
            .layer(ContentIdLayer::new())
            .layer(AccountingLayer::new(accounting))
            .layer(EgressTrackerLayer::new())
    }

    /// Set the terminal content handler
    pub fn handler<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        self.handler = Some(handler_fn(f));
        self
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Get the layer stack (for testing)
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Registrar for work deferred past the response
    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Compose the layers around the handler
    ///
    /// Without a handler every request that reaches the end of the stack is
    /// answered with `404 Not Found`. Error responses are rendered for the
    /// profile of each request's [`Env`].
    pub fn into_service(self) -> BoxedNext {
        let pipeline = self.compose();
        Arc::new(move |req: Request| {
            let profile = req.env().profile;
            let response = pipeline(req);
            Box::pin(async move { apply_error_profile(response.await, profile) }) as ResponseFuture
        })
    }

    /// Build the HTTP server for this gateway
    pub fn into_server(self) -> Server {
        let env = Arc::new(self.env.clone());
        let tasks = self.tasks.clone();
        Server::new(env, self.compose(), tasks)
    }

    fn compose(self) -> BoxedNext {
        let handler = self.handler.unwrap_or_else(|| {
            handler_fn(|_req: Request| async { ApiError::not_found("No content handler configured") })
        });
        self.layers.into_handler(handler)
    }

    /// Serve on `addr` until the process exits
    pub async fn run(self, addr: &str) -> Result<(), BoxError> {
        self.into_server().run(addr).await
    }

    /// Serve on `addr` until `shutdown` resolves, then wait for deferred work
    pub async fn run_until<F>(self, addr: &str, shutdown: F) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        self.into_server().serve(listener, shutdown).await
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new(Env::default())
    }
}

/// Pick the accounting collaborator for `env`
///
/// With an accounting service URL configured and the `http-accounting`
/// feature enabled, records are sent to that service. Otherwise they are
/// kept in process.
pub fn default_accounting(env: &Env) -> Result<Arc<dyn UsageAccounting>, AccountingError> {
    match env.accounting_service_url.as_deref() {
        #[cfg(feature = "http-accounting")]
        Some(url) => {
            tracing::info!(url = %url, "Sending usage records to accounting service");
            Ok(Arc::new(edgegate_extras::HttpAccounting::new(url)?))
        }
        #[cfg(not(feature = "http-accounting"))]
        Some(url) => {
            tracing::warn!(
                url = %url,
                "Accounting service configured but the http-accounting feature is disabled, keeping records in memory"
            );
            Ok(Arc::new(MemoryAccounting::new()))
        }
        None => Ok(Arc::new(MemoryAccounting::new())),
    }
}
