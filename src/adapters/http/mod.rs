//! HTTP adapters - REST API implementations.
//!
//! [`app_router`] assembles the subscription endpoints with the cross-cutting
//! layers: request tracing, a whole-request timeout and CORS.

pub mod subscription;

use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domain::subscription::SIGNATURE_HEADER;

pub use subscription::{subscription_routes, SubscriptionApiError, SubscriptionAppState};

/// Cross-cutting HTTP settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    /// Allowed origins; empty or `["*"]` allows any.
    pub cors_origins: Vec<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Build the complete application router.
pub fn app_router(state: SubscriptionAppState, settings: &HttpSettings) -> Router {
    Router::new()
        .merge(subscription_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(build_cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let is_wildcard = origins.is_empty() || (origins.len() == 1 && origins[0] == "*");

    if is_wildcard {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<axum::http::HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(SIGNATURE_HEADER),
        ])
        .max_age(Duration::from_secs(3600))
}
