//! Accounting backend backed by a remote HTTP service

use async_trait::async_trait;
use edgegate_core::{AccountingError, ContentId, UsageAccounting, UsageRecord};
use std::time::{Duration, SystemTime};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Accounting backend that POSTs each usage record as JSON
///
/// The body is a serialized [`UsageRecord`]. Any 2xx status counts as
/// accepted; other statuses map to [`AccountingError::Rejected`] and
/// connection or timeout failures to [`AccountingError::Transport`].
///
/// # Example
///
/// ```rust,ignore
/// use edgegate_extras::HttpAccounting;
///
/// let accounting = HttpAccounting::new("https://accounting.internal/usage")?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpAccounting {
    url: String,
    client: reqwest::Client,
}

impl HttpAccounting {
    /// Create a client for `url` with the default request timeout
    pub fn new(url: impl Into<String>) -> Result<Self, AccountingError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, AccountingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AccountingError::Transport(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl UsageAccounting for HttpAccounting {
    async fn record(
        &self,
        content_id: &ContentId,
        bytes: u64,
        timestamp: SystemTime,
    ) -> Result<(), AccountingError> {
        let record = UsageRecord::new(content_id, bytes, timestamp);

        let response = self
            .client
            .post(&self.url)
            .json(&record)
            .send()
            .await
            .map_err(|e| AccountingError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AccountingError::Rejected(format!(
                "accounting service returned status {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    /// Serve one connection answering every request with `status`,
    /// forwarding received bodies to the returned channel
    async fn accounting_service(status: u16) -> (SocketAddr, mpsc::UnboundedReceiver<Bytes>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                let tx = tx.clone();
                async move {
                    let body = req.into_body().collect().await.unwrap().to_bytes();
                    let _ = tx.send(body);
                    let response = hyper::Response::builder()
                        .status(status)
                        .body(Full::new(Bytes::new()))
                        .unwrap();
                    Ok::<_, Infallible>(response)
                }
            });
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });

        (addr, rx)
    }

    #[tokio::test]
    async fn test_posts_usage_record() {
        let (addr, mut received) = accounting_service(204).await;
        let accounting = HttpAccounting::new(format!("http://{}/usage", addr)).unwrap();
        let cid = ContentId::parse(CID).unwrap();

        accounting.record(&cid, 13, SystemTime::now()).await.unwrap();

        let body = received.recv().await.unwrap();
        let record: UsageRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.cid, CID);
        assert_eq!(record.bytes, 13);
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let (addr, _received) = accounting_service(503).await;
        let accounting = HttpAccounting::new(format!("http://{}/usage", addr)).unwrap();
        let cid = ContentId::parse(CID).unwrap();

        let err = accounting.record(&cid, 13, SystemTime::now()).await.unwrap_err();
        assert!(matches!(err, AccountingError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let accounting =
            HttpAccounting::with_timeout(format!("http://{}/usage", addr), Duration::from_secs(2)).unwrap();
        let cid = ContentId::parse(CID).unwrap();

        let err = accounting.record(&cid, 13, SystemTime::now()).await.unwrap_err();
        assert!(matches!(err, AccountingError::Transport(_)));
    }
}
