use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::Response,
    routing::{delete, get, post, put},
};

use stockroom_infra::SessionView;

use crate::app::services::SharedSession;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_view))
        .route("/search", put(search))
        .route("/refresh", post(refresh))
        .route("/items", post(add_item).delete(clear_all))
        .route("/items/:name", delete(remove_item))
        .route("/items/:name/rename", post(rename_item))
}

pub async fn get_view(Extension(session): Extension<SharedSession>) -> Json<SessionView> {
    Json(session.view())
}

/// Update the search text. Never touches the store.
pub async fn search(
    Extension(session): Extension<SharedSession>,
    Json(body): Json<dto::SearchRequest>,
) -> Json<SessionView> {
    Json(session.set_query(body.query))
}

pub async fn refresh(Extension(session): Extension<SharedSession>) -> Response {
    let outcome = session.refresh().await;
    errors::outcome_response(outcome, session.view())
}

pub async fn add_item(
    Extension(session): Extension<SharedSession>,
    Json(body): Json<dto::AddItemRequest>,
) -> Response {
    let outcome = session.add(&body.name).await;
    errors::outcome_response(outcome, session.view())
}

/// Remove one unit of `name`.
pub async fn remove_item(
    Extension(session): Extension<SharedSession>,
    Path(name): Path<String>,
) -> Response {
    let outcome = session.remove(&name).await;
    errors::outcome_response(outcome, session.view())
}

pub async fn rename_item(
    Extension(session): Extension<SharedSession>,
    Path(name): Path<String>,
    Json(body): Json<dto::RenameItemRequest>,
) -> Response {
    let outcome = session.rename(&name, &body.to).await;
    errors::outcome_response(outcome, session.view())
}

pub async fn clear_all(Extension(session): Extension<SharedSession>) -> Response {
    let outcome = session.clear_all().await;
    tracing::info!(message = %outcome.message, "clear all requested over http");
    errors::outcome_response(outcome, session.view())
}
