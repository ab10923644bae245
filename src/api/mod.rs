//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::{middleware as axum_middleware, Router};

pub use routes::{create_router, AppState};

/// API routes with context and logging middleware applied
///
/// Axum layers run in reverse order of addition: context -> logging -> handler.
pub fn api_router(state: AppState) -> Router {
    create_router()
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::context_middleware))
        .with_state(state)
}
