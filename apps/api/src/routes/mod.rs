pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::roadmap::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Relay: caller-assembled prompt, literal wire contract
        .route("/api/v1/generate", post(handlers::handle_generate))
        // Wizard submission: full form in, parsed roadmap (or raw text) out
        .route("/api/v1/roadmap", post(handlers::handle_roadmap))
        // Calendar export for an already-parsed roadmap
        .route("/api/v1/roadmap/ics", post(handlers::handle_roadmap_ics))
        .with_state(state)
}
