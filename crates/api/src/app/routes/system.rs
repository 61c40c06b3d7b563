use axum::http::{StatusCode, Uri};
use axum::response::Response;

use crate::app::errors;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found(uri: Uri) -> Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("no route for {}", uri.path()))
}
