use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use super::repo::{Theme, UserSettings};
use crate::error::ApiError;
use crate::pagination::{clamped_limit, clamped_offset};
use crate::state::AppState;
use crate::users::repo::User;
use crate::validate::{parse_id_param, require_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettingsBody {
    pub user_id: Option<Value>,
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsBody {
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
}

fn require_id_param(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        Some(v) => parse_id_param(v, "INVALID_ID", "ID"),
        None => Err(ApiError::bad_request("INVALID_ID", "Valid ID is required")),
    }
}

fn parse_theme(raw: &str) -> Result<Theme, ApiError> {
    Theme::parse(raw.trim()).ok_or_else(|| {
        ApiError::bad_request("INVALID_THEME", r#"theme must be either "dark" or "light""#)
    })
}

#[instrument(skip(state))]
pub async fn list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = UserSettings::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User settings not found"))?;
        return Ok(Json(row).into_response());
    }

    let user_id = q
        .user_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_USER_ID", "userId"))
        .transpose()?;
    let rows = UserSettings::list(
        &state.db,
        user_id,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSettingsBody>,
) -> Result<(StatusCode, Json<UserSettings>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let theme = match body.theme.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_theme(raw)?,
        _ => Theme::Light,
    };

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = UserSettings::create(
        &state.db,
        user_id,
        theme,
        body.notifications_enabled.unwrap_or(true),
        body.sms_enabled.unwrap_or(false),
        body.email_enabled.unwrap_or(true),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateSettingsBody>,
) -> Result<Json<UserSettings>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = UserSettings::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User settings not found"))?;

    let theme = body.theme.as_deref().map(parse_theme).transpose()?;

    if theme.is_none()
        && body.notifications_enabled.is_none()
        && body.sms_enabled.is_none()
        && body.email_enabled.is_none()
    {
        return Ok(Json(existing));
    }

    let row = UserSettings::update(
        &state.db,
        id,
        theme,
        body.notifications_enabled,
        body.sms_enabled,
        body.email_enabled,
    )
    .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = UserSettings::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User settings not found"))?;
    Ok(Json(json!({
        "message": "User settings deleted successfully",
        "deletedUserSettings": deleted,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parsing_is_strict() {
        assert_eq!(parse_theme("light").unwrap(), Theme::Light);
        assert_eq!(parse_theme("dark").unwrap(), Theme::Dark);
        assert!(matches!(
            parse_theme("sepia").unwrap_err(),
            ApiError::BadRequest { code: "INVALID_THEME", .. }
        ));
    }
}
