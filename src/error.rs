use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Closed error taxonomy for the service. Mirrors spec.md §7: client
/// input errors, rate limiting, upstream adapter failures (never
/// surfaced as the response status; the orchestrator records these
/// under `sources.errors` instead), and unexpected bugs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    /// An adapter's HTTP call returned non-2xx or the body couldn't be
    /// parsed. Never escalated to a request-level error status; the
    /// orchestrator catches this per-source and records it.
    #[error("{api}: {message}")]
    Api { api: String, message: String },

    #[error("{api}: invalid JSON response: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// Upstream AI proxy failed (out-of-core contract, §6).
    #[error("upstream AI service error: {0}")]
    UpstreamAi(String),

    /// The AI proxy endpoints are out-of-core (§1, §6): the route exists
    /// and documents its contract, but doesn't call a generative model.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Any unexpected failure not covered by the above. Logged
    /// server-side with detail; never returned to the client verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UpstreamAi(_) => StatusCode::BAD_GATEWAY,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::Api { .. } | AppError::ApiJson { .. } | AppError::HttpClientInit(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg) => msg.clone(),
            AppError::RateLimited => "rate limit exceeded".to_string(),
            AppError::NotFound => "not found".to_string(),
            AppError::MethodNotAllowed => "method not allowed".to_string(),
            AppError::UpstreamAi(_) => "upstream AI service error".to_string(),
            AppError::NotImplemented(msg) => msg.clone(),
            // Adapter-internal and bug variants never leak detail to the client.
            AppError::Api { .. } | AppError::ApiJson { .. } | AppError::HttpClientInit(_) => {
                "internal error".to_string()
            }
            AppError::Internal(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            AppError::Internal(_) | AppError::Api { .. } | AppError::ApiJson { .. }
        ) {
            tracing::error!(error = %self, "unhandled request failure");
        }

        let status = self.status();
        let mut response = (status, Json(json!({ "error": self.client_message() }))).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from_static("60"));
        }
        response
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Api {
            api: "http".to_string(),
            message: err.to_string(),
        }
    }
}
