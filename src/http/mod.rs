//! HTTP surface (spec §6): router assembly, CORS, security headers, and
//! the per-IP rate limiter middleware. Route handlers live in
//! `handlers.rs`; this module wires them together.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Method, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;
use crate::orchestrator::AppContext;
use crate::rate_limit::RateLimiter;

/// Everything a request handler needs, shared behind an `Arc` across the
/// whole process.
pub struct AppState {
    pub ctx: AppContext,
    pub rate_limiter: RateLimiter,
    pub config: Config,
    pub suggest_corpus: Vec<String>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let ctx = AppContext::new()?;
        let suggest_corpus = crate::suggest::corpus_terms(&ctx.guidelines, &ctx.clinical_questions);
        let rate_limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window);
        Ok(Self { ctx, rate_limiter, config, suggest_corpus })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/search", get(handlers::search))
        .route("/api/mesh", get(handlers::mesh))
        .route("/api/suggest", get(handlers::suggest))
        .route("/api/cq/list", get(handlers::cq_list))
        .route("/api/cq/evidence", get(handlers::cq_evidence))
        .route("/api/translate", get(handlers::translate))
        .route("/api/ai/parse", post(handlers::ai_parse))
        .route("/api/ai/summary", post(handlers::ai_summary))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Three allow-listed origins plus the `null` origin a `file://` page
/// sends as `Origin`.
fn cors_layer(config: &Config) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .chain(std::iter::once(HeaderValue::from_static("null")))
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
    response
}

/// Fixed 60-requests/60-second window per client IP (spec §5, §8
/// invariant 8). `ConnectInfo` requires the router to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
async fn rate_limit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if state.rate_limiter.check(addr.ip()) {
        Ok(next.run(req).await)
    } else {
        Err(AppError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()).expect("test AppState builds without network access"))
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        let mut req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        req.extensions_mut().insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 1234))));
        req
    }

    #[tokio::test]
    async fn healthz_is_always_ok_and_carries_security_headers() {
        let router = build_router(test_state());
        let response = router.oneshot(request("GET", "/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(response.headers().get("X-Content-Type-Options").unwrap(), "nosniff");
    }

    #[tokio::test]
    async fn unknown_path_returns_404() {
        let router = build_router(test_state());
        let response = router.oneshot(request("GET", "/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_only_path_rejects_get_with_405() {
        let router = build_router(test_state());
        let response = router.oneshot(request("GET", "/api/ai/parse")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn translate_without_text_is_400() {
        let router = build_router(test_state());
        let response = router.oneshot(request("GET", "/api/translate")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sixty_first_request_from_same_ip_is_rate_limited() {
        let state = test_state();
        for _ in 0..60 {
            let router = build_router(state.clone());
            let response = router.oneshot(request("GET", "/healthz")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let router = build_router(state.clone());
        let response = router.oneshot(request("GET", "/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
        assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(response.headers().get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(
            response.headers().get("Referrer-Policy").unwrap(),
            "strict-origin-when-cross-origin"
        );
    }
}
