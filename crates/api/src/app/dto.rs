use serde::{Deserialize, Serialize};

use stockroom_infra::{Outcome, SessionView};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameItemRequest {
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

// -------------------------
// Response DTOs
// -------------------------

/// Every operation answers with what happened and the view after it.
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub outcome: Outcome,
    pub view: SessionView,
}
