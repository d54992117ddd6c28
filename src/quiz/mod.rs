use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod repo;
pub mod scoring;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/quiz-responses",
            get(handlers::responses_list_or_get)
                .post(handlers::responses_create)
                .put(handlers::responses_update)
                .delete(handlers::responses_remove),
        )
        .route(
            "/quiz-results",
            get(handlers::results_list_or_get)
                .post(handlers::results_create)
                .put(handlers::results_update)
                .delete(handlers::results_remove),
        )
        .route("/quiz/submit", post(handlers::submit))
}
