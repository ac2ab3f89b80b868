use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{providers::MovieDetailsProvider, Recommender},
};

pub mod movies;
pub mod recommendations;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    /// `None` when no TMDB key is configured; responses then carry no details
    pub details_provider: Option<Arc<dyn MovieDetailsProvider>>,
    /// Largest `k` a client may request
    pub max_k: usize,
}

impl AppState {
    pub fn new(recommender: Recommender, max_k: usize) -> Self {
        Self {
            recommender: Arc::new(recommender),
            details_provider: None,
            max_k,
        }
    }

    pub fn with_details_provider(mut self, provider: Arc<dyn MovieDetailsProvider>) -> Self {
        self.details_provider = Some(provider);
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        // Outermost first: the request id must exist before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/movies/search", get(movies::search))
        .route("/genres", get(movies::genres))
        .route("/recommendations", get(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
