//! In-process accounting backend

use async_trait::async_trait;
use edgegate_core::{AccountingError, ContentId, UsageAccounting, UsageRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::SystemTime;

/// Accounting backend that keeps every record in memory
///
/// Every call to [`record`](UsageAccounting::record) is counted, including
/// failed ones, so tests can assert that nothing was retried.
#[derive(Debug, Default)]
pub struct MemoryAccounting {
    records: RwLock<Vec<UsageRecord>>,
    calls: AtomicUsize,
    failure: Option<String>,
}

impl MemoryAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that rejects every record with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Snapshot of the records accepted so far
    pub fn records(&self) -> Vec<UsageRecord> {
        match self.records.read() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of record attempts, successful or not
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sum of accepted bytes attributed to `cid`
    pub fn total_bytes(&self, cid: &str) -> u64 {
        self.records()
            .iter()
            .filter(|record| record.cid == cid)
            .map(|record| record.bytes)
            .sum()
    }
}

#[async_trait]
impl UsageAccounting for MemoryAccounting {
    async fn record(
        &self,
        content_id: &ContentId,
        bytes: u64,
        timestamp: SystemTime,
    ) -> Result<(), AccountingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(AccountingError::Unavailable(message.clone()));
        }

        let record = UsageRecord::new(content_id, bytes, timestamp);
        match self.records.write() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}
