//! Egress usage recorder

use super::EgressState;
use edgegate_core::{ContentId, UsageAccounting};
use std::sync::Arc;
use std::time::SystemTime;

/// Reports a single egress usage record per qualifying response
///
/// Recording is best-effort: a failing collaborator is logged once and the
/// failure is discarded. Nothing is retried.
#[derive(Clone)]
pub struct EgressRecorder {
    accounting: Arc<dyn UsageAccounting>,
}

impl EgressRecorder {
    pub fn new(accounting: Arc<dyn UsageAccounting>) -> Self {
        Self { accounting }
    }

    /// Record `total_bytes` delivered for `content_id`
    ///
    /// A zero total is not a billable delivery and is not sent.
    pub async fn record(&self, content_id: &ContentId, total_bytes: u64) -> EgressState {
        if total_bytes == 0 {
            return EgressState::Skipped;
        }

        match self
            .accounting
            .record(content_id, total_bytes, SystemTime::now())
            .await
        {
            Ok(()) => {
                tracing::debug!(cid = %content_id, bytes = total_bytes, "Egress recorded");
                EgressState::Recorded
            }
            Err(err) => {
                tracing::error!(
                    cid = %content_id,
                    bytes = total_bytes,
                    error = %err,
                    "Failed to record egress"
                );
                EgressState::FailedSilently
            }
        }
    }
}

impl std::fmt::Debug for EgressRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EgressRecorder").finish_non_exhaustive()
    }
}
