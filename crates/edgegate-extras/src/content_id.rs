//! Content identifier resolution from the request path
//!
//! Requests of the form `/ipfs/<cid>[/<path>]` have their identifier
//! validated and stored on the request context as the data CID. The
//! remainder of the path, if any, is kept as a [`ContentPath`] extension.

use edgegate_core::middleware::{BoxedNext, MiddlewareLayer, ResponseFuture};
use edgegate_core::{ApiError, ContentId, IntoResponse, Request};

const IPFS_PREFIX: &str = "/ipfs/";

/// Path inside the content named by the data CID, without a leading slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath(pub String);

impl ContentPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware that resolves the data CID from `/ipfs/<cid>` paths
///
/// Paths outside the `/ipfs/` namespace pass through without a CID. A
/// malformed identifier short-circuits with `400 Bad Request`.
#[derive(Clone, Debug, Default)]
pub struct ContentIdLayer;

impl ContentIdLayer {
    pub fn new() -> Self {
        Self
    }
}

/// Split an `/ipfs/` path into its identifier and the remaining path
pub fn split_ipfs_path(path: &str) -> Option<(&str, Option<&str>)> {
    let rest = path.strip_prefix(IPFS_PREFIX)?;
    match rest.split_once('/') {
        Some((cid, remainder)) if !remainder.is_empty() => Some((cid, Some(remainder))),
        Some((cid, _)) => Some((cid, None)),
        None => Some((rest, None)),
    }
}

impl MiddlewareLayer for ContentIdLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> ResponseFuture {
        let Some((raw, remainder)) = split_ipfs_path(req.path()) else {
            return next(req);
        };

        let cid = match ContentId::parse(raw) {
            Ok(cid) => cid,
            Err(err) => {
                tracing::debug!(cid = %raw, error = %err, "Rejecting malformed content identifier");
                let response = ApiError::from(err).into_response();
                return Box::pin(async move { response });
            }
        };

        tracing::Span::current().record("cid", cid.as_str());
        let remainder = remainder.map(|r| ContentPath(r.to_string()));
        if let Some(remainder) = remainder {
            req.ctx_mut().extensions_mut().insert(remainder);
        }
        req.ctx_mut().set_data_cid(cid);
        next(req)
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}
