use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::repo::{self, CommunityPost, PostComment, PostFilter, PostLike};
use crate::error::ApiError;
use crate::pagination::{clamped_limit, clamped_offset, strict_limit, strict_offset};
use crate::state::AppState;
use crate::users::repo::User;
use crate::validate::{optional_id, parse_id_param, require_id, require_non_negative, require_trimmed};

const FEED_MAX_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub id: Option<String>,
    pub search: Option<String>,
    pub author_id: Option<String>,
    pub category: Option<String>,
    pub post_id: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn require_id_param(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        Some(v) => parse_id_param(v, "INVALID_ID", "ID"),
        None => Err(ApiError::bad_request("INVALID_ID", "Valid ID is required")),
    }
}

// --- community posts ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    pub author_id: Option<Value>,
    pub author_name: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostBody {
    pub content: Option<String>,
    pub category: Option<String>,
    pub likes_count: Option<Value>,
    pub comments_count: Option<Value>,
}

#[instrument(skip(state))]
pub async fn posts_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = CommunityPost::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Community post not found"))?;
        return Ok(Json(row).into_response());
    }

    let author_id = q
        .author_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_AUTHOR_ID", "authorId"))
        .transpose()?;
    let filter = PostFilter {
        search: q.search.clone().filter(|s| !s.is_empty()),
        author_id,
        category: q.category.clone().filter(|c| !c.is_empty()),
    };
    let rows = CommunityPost::list(
        &state.db,
        &filter,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn posts_create(
    State(state): State<AppState>,
    Json(body): Json<CreatePostBody>,
) -> Result<(StatusCode, Json<CommunityPost>), ApiError> {
    let author_name = require_trimmed(
        body.author_name.as_deref(),
        "MISSING_AUTHOR_NAME",
        "Author name",
    )?;
    let content = require_trimmed(body.content.as_deref(), "MISSING_CONTENT", "Content")?;
    let category = require_trimmed(body.category.as_deref(), "MISSING_CATEGORY", "Category")?;
    let author_id = optional_id(body.author_id.as_ref(), "INVALID_AUTHOR_ID", "authorId")?;

    if let Some(author_id) = author_id {
        if !User::exists(&state.db, author_id).await? {
            return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
        }
    }

    let row = CommunityPost::create(
        &state.db,
        author_id,
        &author_name,
        &content,
        &category,
        body.is_anonymous.unwrap_or(false),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn posts_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdatePostBody>,
) -> Result<Json<CommunityPost>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = CommunityPost::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Community post not found"))?;

    let content = match body.content.as_deref() {
        Some(raw) => {
            let c = raw.trim();
            if c.is_empty() {
                return Err(ApiError::bad_request(
                    "INVALID_CONTENT",
                    "Content cannot be empty",
                ));
            }
            Some(c.to_string())
        }
        None => None,
    };
    let category = match body.category.as_deref() {
        Some(raw) => {
            let c = raw.trim();
            if c.is_empty() {
                return Err(ApiError::bad_request(
                    "INVALID_CATEGORY",
                    "Category cannot be empty",
                ));
            }
            Some(c.to_string())
        }
        None => None,
    };
    let likes_count = match body.likes_count.as_ref() {
        None | Some(Value::Null) => None,
        Some(v) => Some(require_non_negative(v, "INVALID_LIKES_COUNT", "Likes count")?),
    };
    let comments_count = match body.comments_count.as_ref() {
        None | Some(Value::Null) => None,
        Some(v) => Some(require_non_negative(
            v,
            "INVALID_COMMENTS_COUNT",
            "Comments count",
        )?),
    };

    if content.is_none() && category.is_none() && likes_count.is_none() && comments_count.is_none() {
        return Ok(Json(existing));
    }

    let row = CommunityPost::update(
        &state.db,
        id,
        content.as_deref(),
        category.as_deref(),
        likes_count,
        comments_count,
    )
    .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn posts_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = CommunityPost::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Community post not found"))?;
    Ok(Json(json!({
        "message": "Community post deleted successfully",
        "deletedPost": deleted,
    })))
}

// --- post likes ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLikeBody {
    pub post_id: Option<Value>,
    pub user_id: Option<Value>,
}

#[instrument(skip(state))]
pub async fn likes_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = PostLike::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Post like not found"))?;
        return Ok(Json(row).into_response());
    }

    let post_id = q
        .post_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_POST_ID", "postId"))
        .transpose()?;
    let user_id = q
        .user_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_USER_ID", "userId"))
        .transpose()?;
    let rows = PostLike::list(
        &state.db,
        post_id,
        user_id,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn likes_create(
    State(state): State<AppState>,
    Json(body): Json<CreateLikeBody>,
) -> Result<(StatusCode, Json<PostLike>), ApiError> {
    let post_id = require_id(
        body.post_id.as_ref(),
        "MISSING_POST_ID",
        "INVALID_POST_ID",
        "postId",
    )?;
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;

    if !CommunityPost::exists(&state.db, post_id).await? {
        return Err(ApiError::not_found("POST_NOT_FOUND", "Post not found"));
    }
    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = PostLike::create(&state.db, post_id, user_id)
        .await?
        .ok_or_else(|| {
            ApiError::bad_request("ALREADY_LIKED", "User has already liked this post")
        })?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// A like row has no mutable fields; the uniform empty-update policy applies
/// and PUT always returns the record unchanged.
#[instrument(skip(state))]
pub async fn likes_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<PostLike>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let row = PostLike::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Post like not found"))?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn likes_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = PostLike::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Post like not found"))?;
    Ok(Json(json!({
        "message": "Post like deleted successfully",
        "deletedPostLike": deleted,
    })))
}

// --- post comments ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub post_id: Option<Value>,
    pub user_id: Option<Value>,
    pub comment_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentBody {
    pub comment_text: Option<String>,
}

#[instrument(skip(state))]
pub async fn comments_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = PostComment::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("COMMENT_NOT_FOUND", "Post comment not found"))?;
        return Ok(Json(row).into_response());
    }

    let post_id = q
        .post_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_POST_ID", "postId"))
        .transpose()?;
    let user_id = q
        .user_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_USER_ID", "userId"))
        .transpose()?;
    let rows = PostComment::list(
        &state.db,
        post_id,
        user_id,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn comments_create(
    State(state): State<AppState>,
    Json(body): Json<CreateCommentBody>,
) -> Result<(StatusCode, Json<PostComment>), ApiError> {
    let post_id = require_id(
        body.post_id.as_ref(),
        "MISSING_POST_ID",
        "INVALID_POST_ID",
        "postId",
    )?;
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let comment_text = match body.comment_text.as_deref() {
        None => {
            return Err(ApiError::bad_request(
                "MISSING_COMMENT_TEXT",
                "commentText is required",
            ))
        }
        Some(raw) => {
            let t = raw.trim();
            if t.is_empty() {
                return Err(ApiError::bad_request(
                    "EMPTY_COMMENT_TEXT",
                    "commentText must be non-empty",
                ));
            }
            t.to_string()
        }
    };

    if !CommunityPost::exists(&state.db, post_id).await? {
        return Err(ApiError::not_found("POST_NOT_FOUND", "Post not found"));
    }
    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = PostComment::create(&state.db, post_id, user_id, &comment_text).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn comments_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateCommentBody>,
) -> Result<Json<PostComment>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = PostComment::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("COMMENT_NOT_FOUND", "Post comment not found"))?;

    let comment_text = match body.comment_text.as_deref() {
        None => return Ok(Json(existing)),
        Some(raw) => {
            let t = raw.trim();
            if t.is_empty() {
                return Err(ApiError::bad_request(
                    "EMPTY_COMMENT_TEXT",
                    "commentText must be non-empty",
                ));
            }
            t.to_string()
        }
    };

    let row = PostComment::update(&state.db, id, &comment_text).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn comments_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = PostComment::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("COMMENT_NOT_FOUND", "Post comment not found"))?;
    Ok(Json(json!({
        "message": "Post comment deleted successfully",
        "comment": deleted,
    })))
}

// --- feed ---

#[derive(Debug, Serialize)]
pub struct FeedPagination {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<CommunityPost>,
    pub pagination: FeedPagination,
}

/// GET /community/feed — newest first, with a total count under the same
/// filters. Unlike the plain list endpoints this one rejects out-of-range
/// pagination instead of clamping.
#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let limit = strict_limit(q.limit.as_deref(), FEED_MAX_LIMIT)?;
    let offset = strict_offset(q.offset.as_deref())?;

    let author_id = match q.user_id.as_deref() {
        Some(raw) => {
            let id = raw.trim().parse::<i64>().map_err(|_| {
                ApiError::bad_request(
                    "INVALID_USER_ID",
                    "Invalid userId parameter. Must be a positive integer.",
                )
            })?;
            if id < 1 {
                return Err(ApiError::bad_request(
                    "INVALID_USER_ID",
                    "Invalid userId parameter. Must be a positive integer.",
                ));
            }
            Some(id)
        }
        None => None,
    };

    let filter = PostFilter {
        search: None,
        author_id,
        category: q.category.clone().filter(|c| !c.is_empty()),
    };
    let (posts, total) = CommunityPost::feed(&state.db, &filter, limit, offset).await?;

    Ok(Json(FeedResponse {
        posts,
        pagination: FeedPagination {
            limit,
            offset,
            total,
        },
    }))
}

// --- like toggle ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeBody {
    pub user_id: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub action: &'static str,
    pub post_id: i64,
    pub user_id: i64,
    pub likes_count: i32,
}

/// POST /community/posts/:id/like — insert-or-delete toggle on the
/// (post, user) pair with the counter kept in step transactionally.
#[instrument(skip(state, body))]
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(raw_post_id): Path<String>,
    Json(body): Json<ToggleLikeBody>,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    let post_id = parse_id_param(&raw_post_id, "INVALID_POST_ID", "post ID")?;
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;

    if !CommunityPost::exists(&state.db, post_id).await? {
        return Err(ApiError::not_found("POST_NOT_FOUND", "Post not found"));
    }
    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let (action, likes_count) = repo::toggle_like(&state.db, post_id, user_id).await?;
    info!(post_id, user_id, action = action.as_str(), "like toggled");

    Ok(Json(ToggleLikeResponse {
        action: action.as_str(),
        post_id,
        user_id,
        likes_count,
    }))
}
