use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full HTTP router
pub fn app(config: &AppConfig, state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Protected API
        .nest("/api", api_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security.cors_origins))
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    } else {
        router
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    use handlers::{notes, profile};

    Router::new()
        .route("/profile", get(profile::get).put(profile::update))
        .route("/notes", get(notes::list).post(notes::create))
        .route("/notes/:id", put(notes::update).delete(notes::delete))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
