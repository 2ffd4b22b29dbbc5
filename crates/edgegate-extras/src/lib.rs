//! # edgegate-extras
//!
//! Gateway middleware and collaborators built on `edgegate-core`.
//!
//! ## Features
//!
//! - `config` - Environment configuration with `.env` file support (default)
//! - `http-accounting` - [`HttpAccounting`] client for a remote accounting service
//! - `full` - All features enabled
//!
//! ## Middleware
//!
//! A typical retrieval pipeline resolves the content identifier, attaches the
//! accounting collaborator and then tracks egress:
//!
//! ```rust,ignore
//! use edgegate_extras::{AccountingLayer, ContentIdLayer, EgressTrackerLayer, MemoryAccounting};
//!
//! let mut stack = LayerStack::new();
//! stack.push(Box::new(ContentIdLayer::new()));
//! stack.push(Box::new(AccountingLayer::new(Arc::new(MemoryAccounting::new()))));
//! stack.push(Box::new(EgressTrackerLayer::new()));
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod accounting;
pub mod content_id;
pub mod egress;

// Configuration management module
#[cfg(feature = "config")]
pub mod config;

pub use accounting::{AccountingLayer, MemoryAccounting};
#[cfg(feature = "http-accounting")]
pub use accounting::HttpAccounting;
pub use content_id::{ContentIdLayer, ContentPath};
pub use egress::{CountingBody, EgressRecorder, EgressSignal, EgressState, EgressTrackerLayer, StreamOutcome};

#[cfg(feature = "config")]
pub use config::{env_from_process, load_dotenv, ConfigError};
