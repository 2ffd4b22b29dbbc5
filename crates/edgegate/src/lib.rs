//! # Edgegate
//!
//! Edge gateway for content-addressed retrieval. Requests pass through an
//! ordered stack of middleware before reaching a content handler, and the
//! bytes of every successful streamed response are counted and reported to
//! an accounting service once the client has received them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edgegate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let gateway = Gateway::from_env()?;
//!     let accounting = default_accounting(gateway.env())?;
//!
//!     gateway
//!         .retrieval_pipeline(accounting)
//!         .handler(|req: Request| async move {
//!             match req.ctx().data_cid() {
//!                 Some(cid) => Ok(format!("content for {}", cid)),
//!                 None => Err(ApiError::not_found("Not an /ipfs/ path")),
//!             }
//!         })
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `config` - Configuration from environment variables and `.env` files (default)
//! - `http-accounting` - Send usage records to a remote accounting service
//! - `full` - All optional features enabled

mod gateway;

// Re-export core functionality
pub use edgegate_core::*;

pub use gateway::{default_accounting, Gateway};

// Re-export extras
pub use edgegate_extras::{accounting, content_id, egress};
pub use edgegate_extras::{
    AccountingLayer, ContentIdLayer, ContentPath, CountingBody, EgressRecorder, EgressSignal,
    EgressState, EgressTrackerLayer, MemoryAccounting, StreamOutcome,
};

#[cfg(feature = "http-accounting")]
pub use edgegate_extras::HttpAccounting;

#[cfg(feature = "config")]
pub use edgegate_extras::config;
#[cfg(feature = "config")]
pub use edgegate_extras::{env_from_process, load_dotenv, ConfigError};

/// Prelude module - import everything you need with `use edgegate::prelude::*`
pub mod prelude {
    pub use crate::gateway::{default_accounting, Gateway};

    pub use edgegate_core::{
        // Error handling
        ApiError,
        BackgroundTasks,
        Body,
        BoxError,
        ContentId,
        Env,
        // Response types
        IntoResponse,
        LayerStack,
        MiddlewareLayer,
        Request,
        RequestContext,
        RequestIdLayer,
        Response,
        Result,
        TracingLayer,
        UsageAccounting,
    };

    pub use edgegate_extras::{
        AccountingLayer, ContentIdLayer, EgressTrackerLayer, MemoryAccounting,
    };

    #[cfg(feature = "config")]
    pub use edgegate_extras::ConfigError;

    // Re-export commonly used external crates
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}
