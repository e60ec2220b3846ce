//! HTTP surface: health endpoint plus static asset serving

pub mod health;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the application router.
///
/// Everything except `/health` is served straight from the assets
/// directory: the front end's index.html and app.js, and the generated
/// courses.json snapshot.
pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        .merge(health::health_routes())
        .fallback_service(assets)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
