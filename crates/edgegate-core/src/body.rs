//! Streaming response bodies
//!
//! [`Body`] is the body type carried by every [`Response`](crate::Response)
//! in the pipeline. It is a one-pass sequence of byte frames whose total
//! length is generally not known up front. A body may also be *absent*,
//! which is how a response that carries no body at all is represented.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgegate_core::Body;
//! use futures_util::stream;
//! use bytes::Bytes;
//!
//! let chunks = stream::iter(vec![
//!     Ok::<_, std::io::Error>(Bytes::from("chunk 1")),
//!     Ok(Bytes::from("chunk 2")),
//! ]);
//! let body = Body::from_stream(chunks);
//! ```

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http_body::{Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Boxed error type carried by body streams
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP body used by gateway responses
pub struct Body {
    kind: Kind,
}

enum Kind {
    Absent,
    Boxed(UnsyncBoxBody<Bytes, BoxError>),
}

impl Body {
    /// A response with no body at all
    pub fn empty() -> Self {
        Self { kind: Kind::Absent }
    }

    /// A body holding a single in-memory chunk
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Full::new(bytes.into()))
    }

    /// Wrap any `http_body::Body` producing `Bytes`
    pub fn new<B>(body: B) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            kind: Kind::Boxed(body.map_err(Into::into).boxed_unsync()),
        }
    }

    /// Build a body from a stream of byte chunks
    ///
    /// Errors yielded by the stream are passed to the consumer as-is.
    pub fn from_stream<S, D, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<D, E>> + Send + 'static,
        D: Into<Bytes>,
        E: Into<BoxError> + 'static,
    {
        let frames = stream
            .map_ok(|chunk| Frame::data(chunk.into()))
            .map_err(Into::into);
        Self {
            kind: Kind::Boxed(StreamBody::new(frames).boxed_unsync()),
        }
    }

    /// Whether the response carries no body
    pub fn is_absent(&self) -> bool {
        matches!(self.kind, Kind::Absent)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from_bytes(s)
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Self::from_bytes(v)
    }
}

impl http_body::Body for Body {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Absent => Poll::Ready(None),
            Kind::Boxed(body) => Pin::new(body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Absent => true,
            Kind::Boxed(body) => body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Absent => SizeHint::with_exact(0),
            Kind::Boxed(body) => body.size_hint(),
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Kind::Absent => f.write_str("Body(absent)"),
            Kind::Boxed(_) => f.write_str("Body(streaming)"),
        }
    }
}
