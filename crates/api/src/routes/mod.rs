pub mod geo;
pub mod payments;
pub mod quota;
pub mod subscriptions;
pub mod trial;
pub mod users;

use axum::{routing::get, Json, Router};
use http::HeaderValue;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// API version
    pub version: &'static str,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn is_origin_allowed(origin_str: &str, cors_config: &config::CorsConfig) -> bool {
    if cors_config.exact_matches.iter().any(|o| o == origin_str) {
        return true;
    }

    if let Some(remainder) = origin_str.strip_prefix("http://localhost") {
        if remainder.is_empty() || remainder.starts_with(':') {
            return true;
        }
    }

    if let Some(remainder) = origin_str.strip_prefix("http://127.0.0.1") {
        if remainder.is_empty() || remainder.starts_with(':') {
            return true;
        }
    }

    if origin_str.starts_with("https://")
        && cors_config
            .wildcard_suffixes
            .iter()
            .any(|suffix| origin_str.ends_with(suffix))
    {
        return true;
    }

    false
}

/// Create the main API router with CORS configuration
pub fn create_router_with_cors(app_state: AppState, cors_config: config::CorsConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts| {
                origin
                    .to_str()
                    .map(|origin_str| is_origin_allowed(origin_str, &cors_config))
                    .unwrap_or(false)
            },
        ))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .merge(trial::create_trial_router())
        .merge(quota::create_quota_router())
        .merge(payments::create_payments_router())
        .merge(subscriptions::create_subscriptions_router())
        .merge(geo::create_geo_router())
        .merge(users::create_users_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Create the main API router with default CORS configuration
pub fn create_router(app_state: AppState) -> Router {
    create_router_with_cors(app_state, config::CorsConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cors_config() -> config::CorsConfig {
        config::CorsConfig {
            exact_matches: vec!["https://formfit.app".to_string()],
            wildcard_suffixes: vec![".formfit.app".to_string()],
        }
    }

    #[test]
    fn test_exact_origin_allowed() {
        assert!(is_origin_allowed("https://formfit.app", &cors_config()));
    }

    #[test]
    fn test_wildcard_origin_allowed() {
        assert!(is_origin_allowed("https://staging.formfit.app", &cors_config()));
    }

    #[test]
    fn test_localhost_always_allowed() {
        assert!(is_origin_allowed("http://localhost:3000", &cors_config()));
        assert!(is_origin_allowed("http://127.0.0.1:8080", &cors_config()));
    }

    #[test]
    fn test_unknown_origin_rejected() {
        assert!(!is_origin_allowed("https://evil.example.com", &cors_config()));
        // Wildcard suffix must not match over plain http
        assert!(!is_origin_allowed("http://staging.formfit.app", &cors_config()));
    }
}
