use crate::aqi::trend::TrendSource;
use crate::prefs::KeyValueStore;
use crate::state::AppState;
use crate::store::ReadingStore;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, Mutex, RwLock};

pub mod handlers;
pub mod responses;

/// Shared handles every handler reads from.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<RwLock<AppState>>,
    pub store: Arc<dyn ReadingStore>,
    pub prefs: Arc<Mutex<dyn KeyValueStore + Send>>,
    pub trend: Arc<dyn TrendSource>,
}

pub fn router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/locations", get(handlers::get_locations))
        .route("/api/locations/{name}/current", get(handlers::get_current))
        .route("/api/locations/{name}/forecast", get(handlers::get_forecast))
        .route("/api/locations/{name}/readings", post(handlers::post_reading))
        .route(
            "/api/locations/{name}/predictions",
            post(handlers::post_predictions),
        )
        .route("/api/classify/{aqi}", get(handlers::get_classify))
        .route("/api/compute", post(handlers::post_compute))
        .route("/api/alerts", get(handlers::get_alerts))
        .route("/api/live", post(handlers::post_live))
        .route("/api/chat", post(handlers::post_chat))
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .with_state(ctx)
}
