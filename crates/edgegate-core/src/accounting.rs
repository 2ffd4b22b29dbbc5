//! Usage accounting collaborator contract

use crate::cid::ContentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors reported by an accounting collaborator
///
/// These never reach a client; the egress path logs and discards them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountingError {
    /// The service received the record and refused it
    #[error("accounting service rejected the record: {0}")]
    Rejected(String),
    /// The record could not be delivered
    #[error("accounting transport failed: {0}")]
    Transport(String),
    /// The collaborator is not available
    #[error("accounting service unavailable: {0}")]
    Unavailable(String),
}

/// A single egress usage record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Content identifier the bytes are attributed to
    pub cid: String,
    /// Bytes delivered
    pub bytes: u64,
    /// Milliseconds since the unix epoch when the stream completed
    pub served_at_ms: u64,
}

impl UsageRecord {
    pub fn new(content_id: &ContentId, bytes: u64, timestamp: SystemTime) -> Self {
        let served_at_ms = timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            cid: content_id.to_string(),
            bytes,
            served_at_ms,
        }
    }
}

/// External capability that stores egress usage
#[async_trait]
pub trait UsageAccounting: Send + Sync + 'static {
    /// Record `bytes` delivered for `content_id` at `timestamp`
    async fn record(
        &self,
        content_id: &ContentId,
        bytes: u64,
        timestamp: SystemTime,
    ) -> Result<(), AccountingError>;
}
