use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError};
use crate::handlers;
use crate::middleware::{access_gate, api_auth_middleware, AccessGate, ApiAuth};

/// Build the full router: public endpoints, the token-checked API and the
/// gated page surface.
pub fn app(config: &AppConfig) -> Result<Router, ConfigError> {
    let policy = config.gate_policy()?;
    let surface = config.trigger_surface(&policy);
    tracing::info!(
        roles = policy.table.roles().count(),
        patterns = surface.patterns().len(),
        matching = %policy.matching,
        "access gate configured"
    );
    let gate = Arc::new(AccessGate::new(policy, surface, config.gate.cookie_name.clone()));

    let mut router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .nest("/api", api_routes(config))
        .merge(page_routes(config))
        .layer(from_fn_with_state(gate, access_gate));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    Ok(router)
}

fn api_routes(config: &AppConfig) -> Router {
    let auth = Arc::new(ApiAuth::new(config.security.token_secret.clone()));

    Router::new()
        .route("/session", get(handlers::session::session_get))
        .fallback(handlers::session::api_not_found)
        .layer(from_fn_with_state(auth, api_auth_middleware))
}

fn page_routes(config: &AppConfig) -> Router {
    match &config.api.static_dir {
        Some(dir) => Router::new().fallback_service(ServeDir::new(dir)),
        None => Router::new().fallback(handlers::pages::page_placeholder),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
