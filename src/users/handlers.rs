use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::repo::User;
use crate::error::ApiError;
use crate::pagination::{clamped_limit, clamped_offset};
use crate::state::AppState;
use crate::validate::parse_id_param;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    // double Option: absent = leave untouched, null = clear
    #[serde(default, with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(de).map(Some)
    }
}

#[instrument(skip(state))]
pub async fn list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let user = User::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;
        return Ok(Json(user).into_response());
    }

    let limit = clamped_limit(q.limit.as_deref());
    let offset = clamped_offset(q.offset.as_deref());
    let users = User::list(&state.db, limit, offset).await?;
    Ok(Json(users).into_response())
}

#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .map(str::to_lowercase)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("MISSING_EMAIL", "email is required"))?;
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("INVALID_EMAIL", "email must be a valid address"));
    }
    let name = crate::validate::require_trimmed(body.name.as_deref(), "MISSING_NAME", "name")?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::bad_request("EMAIL_EXISTS", "email is already registered"));
    }

    let avatar = body.avatar_url.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let user = User::create(&state.db, &email, &name, avatar).await?;
    info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateUser>,
) -> Result<Json<User>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = User::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    let email = match body.email.as_deref() {
        Some(raw) => {
            let e = raw.trim().to_lowercase();
            if !is_valid_email(&e) {
                return Err(ApiError::bad_request("INVALID_EMAIL", "email must be a valid address"));
            }
            if e != existing.email && User::find_by_email(&state.db, &e).await?.is_some() {
                return Err(ApiError::bad_request("EMAIL_EXISTS", "email is already registered"));
            }
            Some(e)
        }
        None => None,
    };
    let name = match body.name.as_deref() {
        Some(raw) => {
            let n = raw.trim();
            if n.is_empty() {
                return Err(ApiError::bad_request("INVALID_NAME", "name cannot be empty"));
            }
            Some(n.to_string())
        }
        None => None,
    };

    if email.is_none() && name.is_none() && body.avatar_url.is_none() {
        return Ok(Json(existing));
    }

    let avatar: Option<Option<String>> = body
        .avatar_url
        .map(|inner| inner.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()));
    let user = User::update(
        &state.db,
        id,
        email.as_deref(),
        name.as_deref(),
        avatar.as_ref().map(|inner| inner.as_deref()),
    )
    .await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = User::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;
    Ok(Json(json!({
        "message": "User deleted successfully",
        "deletedUser": deleted,
    })))
}

fn require_id_param(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        Some(v) => parse_id_param(v, "INVALID_ID", "ID"),
        None => Err(ApiError::bad_request("INVALID_ID", "Valid ID is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("jo@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn id_param_is_required_and_numeric() {
        assert!(require_id_param(None).is_err());
        assert!(require_id_param(Some("x")).is_err());
        assert_eq!(require_id_param(Some("9")).unwrap(), 9);
    }
}
