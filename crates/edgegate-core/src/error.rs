//! Error types for the gateway

use crate::body::Body;
use crate::cid::CidError;
use crate::env::Profile;
use crate::response::{IntoResponse, Response};
use http::{header, HeaderValue, StatusCode};
use serde::Serialize;
use std::fmt;

/// Result type alias for gateway operations
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Standard API error type
///
/// Rendered as a JSON error response without internal details. The
/// details are added back by [`apply_error_profile`] once the request's
/// [`Profile`] is known, and never for production.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Internal details (hidden in production)
    pub(crate) internal: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            internal: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Create a 502 Bad Gateway error
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "bad_gateway", message)
    }

    /// Create a 503 Service Unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", message)
    }

    /// Add internal details (for logging, hidden from response in prod)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    /// Internal details, if any
    pub fn internal_details(&self) -> Option<&str> {
        self.internal.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON representation of API error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    fn from_error(err: ApiError, profile: Profile) -> Self {
        let detail = if profile.show_error_details() {
            err.internal
        } else {
            None
        };
        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message: err.message,
                detail,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        if let Some(internal) = &self.internal {
            tracing::debug!(status = %status.as_u16(), error_type = %self.error_type, internal = %internal, "Error response");
        }

        let mut response = render(&self, Profile::Production);
        response.extensions_mut().insert(self);
        response
    }
}

fn render(err: &ApiError, profile: Profile) -> Response {
    let error_response = ErrorResponse::from_error(err.clone(), profile);
    let body = serde_json::to_vec(&error_response).unwrap_or_else(|_| {
        br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
    });

    let mut response = http::Response::new(Body::from_bytes(body));
    *response.status_mut() = err.status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Render error responses for the deployment `profile`
///
/// Error responses are masked when built. Outside production, a response
/// produced from an [`ApiError`] carrying internal details is rendered again
/// with its `detail` field. Other responses are returned unchanged.
pub fn apply_error_profile(response: Response, profile: Profile) -> Response {
    if !profile.show_error_details() {
        return response;
    }
    let err = match response.extensions().get::<ApiError>() {
        Some(err) if err.internal.is_some() => err.clone(),
        _ => return response,
    };

    let (parts, _) = response.into_parts();
    let (mut rendered, body) = render(&err, profile).into_parts();
    rendered.headers = parts.headers;
    rendered.extensions = parts.extensions;
    Response::from_parts(rendered, body)
}

// Conversion from common error types
impl From<CidError> for ApiError {
    fn from(err: CidError) -> Self {
        ApiError::bad_request(format!("Invalid content identifier: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal("I/O error").with_internal(err.to_string())
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        ApiError::internal("HTTP error").with_internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_error_constructors() {
        assert_eq!(ApiError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::internal("x").status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::bad_gateway("x").status, StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::service_unavailable("x").status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_display() {
        let err = ApiError::not_found("no such block");
        assert_eq!(err.to_string(), "not_found: no such block");
    }

    #[test]
    fn test_cid_error_maps_to_bad_request() {
        let err: ApiError = CidError::Empty.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("content identifier"));
    }

    #[test]
    fn test_detail_masked_in_production() {
        let err = ApiError::internal("boom").with_internal("stack detail");
        let masked = ErrorResponse::from_error(err.clone(), Profile::Production);
        assert!(masked.error.detail.is_none());

        let shown = ErrorResponse::from_error(err, Profile::Development);
        assert_eq!(shown.error.detail.as_deref(), Some("stack detail"));
    }

    #[tokio::test]
    async fn test_into_response_renders_json() {
        let response = ApiError::not_found("missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "not_found");
        assert_eq!(json["error"]["message"], "missing");
    }

    async fn body_text(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_into_response_never_renders_detail() {
        let response = ApiError::internal("boom").with_internal("secret").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_text(response).await.contains("secret"));
    }

    #[tokio::test]
    async fn test_production_profile_keeps_detail_hidden() {
        let response = ApiError::internal("boom").with_internal("secret").into_response();
        let response = apply_error_profile(response, Profile::Production);

        let text = body_text(response).await;
        assert!(text.contains("boom"));
        assert!(!text.contains("secret"));
    }

    #[tokio::test]
    async fn test_development_profile_shows_detail() {
        let mut response = ApiError::internal("boom").with_internal("secret").into_response();
        response
            .headers_mut()
            .insert("x-request-id", HeaderValue::from_static("abc"));
        let response = apply_error_profile(response, Profile::Development);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc");
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"]["detail"], "secret");
    }

    #[tokio::test]
    async fn test_non_error_response_untouched() {
        let response = apply_error_profile("plain".into_response(), Profile::Development);
        assert_eq!(body_text(response).await, "plain");
    }
}
