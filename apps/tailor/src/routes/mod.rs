pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes/rank", post(handlers::handle_rank))
        .route("/api/v1/resumes/tailor", post(handlers::handle_tailor))
        .route("/api/v1/resumes/render", post(handlers::handle_render))
        .with_state(state)
}
