//! Egress accounting for streamed responses
//!
//! Every byte of a successful retrieval that actually reaches the client is
//! counted and attributed to the content identifier being served, without
//! buffering the response or delaying delivery.
//!
//! The pieces:
//!
//! - [`CountingBody`]: transparent body decorator that counts bytes and
//!   resolves an [`EgressSignal`] exactly once.
//! - [`EgressRecorder`]: best-effort reporting of one usage record to the
//!   accounting collaborator.
//! - [`EgressTrackerLayer`]: the middleware deciding when to count and
//!   scheduling the recorder after the stream ends.
//!
//! Exactly one record is produced per fully consumed, tracking-enabled, 2xx,
//! non-empty response. Disabled tracking, other statuses, zero-byte bodies
//! and streams that error or are abandoned produce none.

mod counting;
mod layer;
mod recorder;

pub use counting::{CountingBody, EgressSignal, StreamOutcome};
pub use layer::{track_egress, EgressTrackerLayer};
pub use recorder::EgressRecorder;

/// Per-request egress tracking state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgressState {
    /// Tracking is switched off
    Disabled,
    /// Response was not eligible or the stream did not complete
    Skipped,
    /// Body is wrapped and being counted
    Tracking,
    /// Usage record accepted by the collaborator
    Recorded,
    /// Collaborator failed; logged and discarded
    FailedSilently,
}
