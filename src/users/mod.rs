use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users",
        get(handlers::list_or_get)
            .post(handlers::create)
            .put(handlers::update)
            .delete(handlers::remove),
    )
}
