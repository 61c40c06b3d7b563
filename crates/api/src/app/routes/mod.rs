use axum::Router;

pub mod inventory;
pub mod system;

pub fn router() -> Router {
    Router::new().nest("/inventory", inventory::router())
}
