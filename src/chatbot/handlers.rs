use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::rules;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub reply: &'static str,
    pub matched_topic: &'static str,
}

#[instrument(skip(_state, body))]
pub async fn message(
    State(_state): State<AppState>,
    Json(body): Json<MessageBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("MISSING_MESSAGE", "message is required"))?;

    let (matched_topic, reply) = rules::reply_for(message);
    Ok(Json(MessageResponse {
        reply,
        matched_topic,
    }))
}
