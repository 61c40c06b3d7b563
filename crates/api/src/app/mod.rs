//! HTTP API application wiring (Axum router + session wiring).
//!
//! - `services.rs`: store construction and the shared session
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: outcome → status mapping and JSON errors

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::SharedSession;

/// Build the full HTTP router around a session (started or not).
pub fn build_app(session: SharedSession) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .fallback(routes::system::not_found)
        .layer(ServiceBuilder::new().layer(Extension(session)))
}
