use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/user-metrics",
            get(handlers::metrics_list_or_get)
                .post(handlers::metrics_create)
                .put(handlers::metrics_update)
                .delete(handlers::metrics_remove),
        )
        .route(
            "/badges",
            get(handlers::badges_list_or_get)
                .post(handlers::badges_create)
                .put(handlers::badges_update)
                .delete(handlers::badges_remove),
        )
        .route(
            "/user-streaks",
            get(handlers::streaks_list_or_get)
                .post(handlers::streaks_create)
                .put(handlers::streaks_update)
                .delete(handlers::streaks_remove),
        )
        .route(
            "/daily-tasks",
            get(handlers::tasks_list_or_get)
                .post(handlers::tasks_create)
                .put(handlers::tasks_update)
                .delete(handlers::tasks_remove),
        )
        .route("/users/:id/dashboard", get(handlers::dashboard))
}
