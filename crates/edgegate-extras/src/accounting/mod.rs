//! Usage accounting collaborators
//!
//! [`AccountingLayer`] attaches a shared [`UsageAccounting`] implementation to
//! every request so later stages, the egress tracker in particular, can
//! report usage without knowing which backend is in use.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryAccounting`]: keeps records in process. Useful in development
//!   and for asserting on recorded usage in tests.
//! - [`HttpAccounting`]: POSTs each record as JSON to an accounting service
//!   (feature `http-accounting`).

mod memory;

#[cfg(feature = "http-accounting")]
mod service;

#[cfg(feature = "http-accounting")]
pub use service::HttpAccounting;
pub use memory::MemoryAccounting;

use edgegate_core::middleware::{BoxedNext, MiddlewareLayer, ResponseFuture};
use edgegate_core::{Request, UsageAccounting};
use std::sync::Arc;

/// Middleware that attaches an accounting collaborator to each request
///
/// # Example
///
/// ```rust,ignore
/// use edgegate_extras::{AccountingLayer, MemoryAccounting};
/// use std::sync::Arc;
///
/// let accounting = Arc::new(MemoryAccounting::new());
/// stack.push(Box::new(AccountingLayer::new(accounting.clone())));
/// ```
#[derive(Clone)]
pub struct AccountingLayer {
    accounting: Arc<dyn UsageAccounting>,
}

impl AccountingLayer {
    pub fn new(accounting: Arc<dyn UsageAccounting>) -> Self {
        Self { accounting }
    }
}

impl std::fmt::Debug for AccountingLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountingLayer").finish_non_exhaustive()
    }
}

impl MiddlewareLayer for AccountingLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> ResponseFuture {
        req.ctx_mut().set_accounting(self.accounting.clone());
        next(req)
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}
