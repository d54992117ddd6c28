use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/community-posts",
            get(handlers::posts_list_or_get)
                .post(handlers::posts_create)
                .put(handlers::posts_update)
                .delete(handlers::posts_remove),
        )
        .route(
            "/post-likes",
            get(handlers::likes_list_or_get)
                .post(handlers::likes_create)
                .put(handlers::likes_update)
                .delete(handlers::likes_remove),
        )
        .route(
            "/post-comments",
            get(handlers::comments_list_or_get)
                .post(handlers::comments_create)
                .put(handlers::comments_update)
                .delete(handlers::comments_remove),
        )
        .route("/community/feed", get(handlers::feed))
        .route("/community/posts/:id/like", post(handlers::toggle_like))
}
