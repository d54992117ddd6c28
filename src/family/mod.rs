use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/family-members",
            get(handlers::members_list_or_get)
                .post(handlers::members_create)
                .put(handlers::members_update)
                .delete(handlers::members_remove),
        )
        .route("/family/:group_id/members", get(handlers::group_view))
}
