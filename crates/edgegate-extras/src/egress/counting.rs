//! Byte-counting body wrapper
//!
//! [`CountingBody`] forwards every frame of the inner body untouched while
//! adding the length of each data frame to a running total. The paired
//! [`EgressSignal`] resolves exactly once with the [`StreamOutcome`]:
//! completion with the final total, failure, or interruption when the body
//! is dropped before it ended.

use bytes::Buf;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;

/// How a counted stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The stream reached its end; `bytes` is the exact total delivered
    Completed { bytes: u64 },
    /// The inner body yielded an error after `bytes` were forwarded
    Failed { bytes: u64 },
    /// The body was dropped before reaching its end
    Interrupted { bytes: u64 },
}

impl StreamOutcome {
    /// Total bytes of a fully consumed stream, `None` otherwise
    pub fn completed_bytes(&self) -> Option<u64> {
        match self {
            Self::Completed { bytes } => Some(*bytes),
            Self::Failed { .. } | Self::Interrupted { .. } => None,
        }
    }
}

/// Receiving half of a [`CountingBody`]'s completion signal
#[derive(Debug)]
pub struct EgressSignal {
    rx: oneshot::Receiver<StreamOutcome>,
}

impl EgressSignal {
    /// Wait for the body to finish, fail or be dropped
    pub async fn outcome(self) -> StreamOutcome {
        // The sender is always resolved before it drops, so a closed
        // channel can only mean the body vanished without running Drop.
        self.rx.await.unwrap_or(StreamOutcome::Interrupted { bytes: 0 })
    }
}

pin_project! {
    /// Transparent body decorator that counts delivered bytes
    pub struct CountingBody<B> {
        #[pin]
        inner: B,
        bytes: u64,
        signal: Option<oneshot::Sender<StreamOutcome>>,
    }

    impl<B> PinnedDrop for CountingBody<B> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(tx) = this.signal.take() {
                let _ = tx.send(StreamOutcome::Interrupted { bytes: *this.bytes });
            }
        }
    }
}

impl<B> CountingBody<B> {
    /// Wrap `inner`, returning the wrapper and its completion signal
    pub fn new(inner: B) -> (Self, EgressSignal) {
        let (tx, rx) = oneshot::channel();
        let body = Self {
            inner,
            bytes: 0,
            signal: Some(tx),
        };
        (body, EgressSignal { rx })
    }

    /// Bytes forwarded so far
    pub fn bytes_so_far(&self) -> u64 {
        self.bytes
    }
}

fn finish(signal: &mut Option<oneshot::Sender<StreamOutcome>>, outcome: StreamOutcome) {
    if let Some(tx) = signal.take() {
        let _ = tx.send(outcome);
    }
}

impl<B> Body for CountingBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    *this.bytes += data.remaining() as u64;
                }
                // Transports may stop polling once the inner body reports
                // its end, so completion is settled here as well.
                if this.inner.is_end_stream() {
                    finish(this.signal, StreamOutcome::Completed { bytes: *this.bytes });
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(err)) => {
                finish(this.signal, StreamOutcome::Failed { bytes: *this.bytes });
                Poll::Ready(Some(Err(err)))
            }
            None => {
                finish(this.signal, StreamOutcome::Completed { bytes: *this.bytes });
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
