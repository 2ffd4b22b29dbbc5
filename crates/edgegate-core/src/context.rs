//! Per-request context
//!
//! A [`RequestContext`] is created when a request enters the pipeline and is
//! filled in by successive middleware stages. It is owned by exactly one
//! [`Request`](crate::Request) and dropped with it.

use crate::accounting::UsageAccounting;
use crate::cid::ContentId;
use crate::tasks::BackgroundTasks;
use http::Extensions;
use std::future::Future;
use std::sync::Arc;

/// Mutable per-request bag of fields set by middleware
pub struct RequestContext {
    data_cid: Option<ContentId>,
    accounting: Option<Arc<dyn UsageAccounting>>,
    tasks: BackgroundTasks,
    extensions: Extensions,
}

impl RequestContext {
    /// Create an empty context scheduling deferred work on `tasks`
    pub fn new(tasks: BackgroundTasks) -> Self {
        Self {
            data_cid: None,
            accounting: None,
            tasks,
            extensions: Extensions::new(),
        }
    }

    /// Content identifier being served, once resolved
    pub fn data_cid(&self) -> Option<&ContentId> {
        self.data_cid.as_ref()
    }

    pub fn set_data_cid(&mut self, cid: ContentId) {
        self.data_cid = Some(cid);
    }

    /// Accounting collaborator attached to this request
    pub fn accounting(&self) -> Option<Arc<dyn UsageAccounting>> {
        self.accounting.clone()
    }

    pub fn set_accounting(&mut self, accounting: Arc<dyn UsageAccounting>) {
        self.accounting = Some(accounting);
    }

    /// Schedule work to run after the response is returned
    pub fn wait_until<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.wait_until(task);
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Additional typed fields
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(BackgroundTasks::new())
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("data_cid", &self.data_cid)
            .field("accounting", &self.accounting.is_some())
            .field("tasks", &self.tasks)
            .finish()
    }
}
