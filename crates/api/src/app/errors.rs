use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stockroom_infra::{Outcome, OutcomeKind, SessionView};

use crate::app::dto::OperationResponse;

pub fn outcome_status(kind: OutcomeKind) -> StatusCode {
    match kind {
        OutcomeKind::Applied | OutcomeKind::NoOp => StatusCode::OK,
        OutcomeKind::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
        OutcomeKind::Busy => StatusCode::CONFLICT,
        OutcomeKind::Failed => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn outcome_response(outcome: Outcome, view: SessionView) -> Response {
    (outcome_status(outcome.kind), Json(OperationResponse { outcome, view })).into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_outcome_kind() {
        assert_eq!(outcome_status(OutcomeKind::Applied), StatusCode::OK);
        assert_eq!(outcome_status(OutcomeKind::NoOp), StatusCode::OK);
        assert_eq!(outcome_status(OutcomeKind::Rejected), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(outcome_status(OutcomeKind::Busy), StatusCode::CONFLICT);
        assert_eq!(outcome_status(OutcomeKind::Failed), StatusCode::SERVICE_UNAVAILABLE);
    }
}
