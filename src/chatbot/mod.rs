use axum::{routing::post, Router};

use crate::state::AppState;

pub mod handlers;
pub mod rules;

pub fn router() -> Router<AppState> {
    Router::new().route("/chatbot/message", post(handlers::message))
}
