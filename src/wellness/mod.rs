use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/wellness-goals",
            get(handlers::goals_list_or_get)
                .post(handlers::goals_create)
                .put(handlers::goals_update)
                .delete(handlers::goals_remove),
        )
        .route(
            "/wellness-plans",
            get(handlers::plans_list_or_get)
                .post(handlers::plans_create)
                .put(handlers::plans_update)
                .delete(handlers::plans_remove),
        )
        .route("/users/:id/wellness-plan", get(handlers::plan_view))
}
