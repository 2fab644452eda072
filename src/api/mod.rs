pub mod handlers;

pub use handlers::*;

use crate::config::CorsConfig;
use crate::service::Recommender;
use axum::http::HeaderValue;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router around a shared recommender
pub fn router(recommender: Arc<Recommender>, cors: &CorsConfig) -> Router {
    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/consultar-rut", get(handlers::consult_rut))
        .route("/api/recommend/:rut", get(handlers::recommend))
        .route("/api/recommend/:rut/history.csv", get(handlers::history_csv))
        .with_state(recommender)
        .layer(TraceLayer::new_for_http());

    match cors_layer(cors) {
        Some(layer) => app.layer(layer),
        None => app,
    }
}

fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
