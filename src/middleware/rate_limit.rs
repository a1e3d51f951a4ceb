use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum::Json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};

use crate::error::ErrorBody;

/// Type alias for the public governor layer (IP-based rate limiting)
pub type PublicGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Create a GovernorLayer for unauthenticated routes (per IP address)
/// - 100 requests per minute per IP
pub fn create_public_governor() -> PublicGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(1200) // One token every 1.2s (~50 per minute refill)
            .burst_size(100)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

/// Map governor rejections onto the standard error envelope.
pub fn rate_limit_error_handler(error: GovernorError) -> Response {
    let (status, message) = match error {
        GovernorError::TooManyRequests { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.".to_string(),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to identify client for rate limiting".to_string(),
        ),
        GovernorError::Other { msg, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            msg.unwrap_or_else(|| "Rate limiting failed".to_string()),
        ),
    };

    let body = ErrorBody {
        status: if status.is_server_error() { "error" } else { "fail" },
        message,
        stack: None,
    };

    (status, Json(body)).into_response()
}

/// Middleware to log rate limiting and request details
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "RATE LIMITED - Request rejected due to too many requests"
        );
    } else if status.is_client_error() || status.is_server_error() {
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "Request failed"
        );
    } else {
        tracing::debug!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "Request completed"
        );
    }

    response
}
