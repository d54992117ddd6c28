use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use super::repo::{Badge, DailyTask, MetricType, UserMetric, UserStreak};
use crate::error::ApiError;
use crate::pagination::{clamped_limit, clamped_offset};
use crate::state::AppState;
use crate::users::repo::User;
use crate::validate::{parse_id_param, require_id, require_non_negative, require_trimmed};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub metric_type: Option<String>,
    pub date: Option<String>,
    pub completed: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn require_id_param(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        Some(v) => parse_id_param(v, "INVALID_ID", "ID"),
        None => Err(ApiError::bad_request("INVALID_ID", "Valid ID is required")),
    }
}

fn user_filter(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    raw.map(|v| parse_id_param(v, "INVALID_USER_ID", "userId"))
        .transpose()
}

fn parse_metric_type(raw: &str) -> Result<MetricType, ApiError> {
    MetricType::parse(raw.trim()).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_METRIC_TYPE",
            "metricType must be one of: screen_time, sleep, activity, mood",
        )
    })
}

// --- user metrics ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetricBody {
    pub user_id: Option<Value>,
    pub metric_type: Option<String>,
    pub value: Option<Value>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMetricBody {
    pub metric_type: Option<String>,
    pub value: Option<Value>,
    pub date: Option<String>,
}

/// Metric values arrive as strings or numbers; both are stored string-encoded.
fn metric_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[instrument(skip(state))]
pub async fn metrics_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = UserMetric::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User metric not found"))?;
        return Ok(Json(row).into_response());
    }

    let metric_type = q.metric_type.as_deref().map(parse_metric_type).transpose()?;
    let rows = UserMetric::list(
        &state.db,
        user_filter(q.user_id.as_deref())?,
        metric_type,
        q.date.as_deref(),
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn metrics_create(
    State(state): State<AppState>,
    Json(body): Json<CreateMetricBody>,
) -> Result<(StatusCode, Json<UserMetric>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let metric_type = match body.metric_type.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_metric_type(raw)?,
        _ => {
            return Err(ApiError::bad_request(
                "MISSING_METRIC_TYPE",
                "metricType is required",
            ))
        }
    };
    let value = body
        .value
        .as_ref()
        .and_then(metric_value)
        .ok_or_else(|| ApiError::bad_request("MISSING_VALUE", "value is required"))?;
    let date = require_trimmed(body.date.as_deref(), "MISSING_DATE", "date")?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = UserMetric::create(&state.db, user_id, metric_type, &value, &date).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn metrics_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateMetricBody>,
) -> Result<Json<UserMetric>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = UserMetric::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User metric not found"))?;

    let metric_type = body.metric_type.as_deref().map(parse_metric_type).transpose()?;
    let value = match body.value.as_ref() {
        None | Some(Value::Null) => None,
        Some(v) => Some(metric_value(v).ok_or_else(|| {
            ApiError::bad_request("MISSING_VALUE", "value must be non-empty")
        })?),
    };
    let date = body
        .date
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    if metric_type.is_none() && value.is_none() && date.is_none() {
        return Ok(Json(existing));
    }

    let row = UserMetric::update(&state.db, id, metric_type, value.as_deref(), date.as_deref())
        .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn metrics_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = UserMetric::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User metric not found"))?;
    Ok(Json(json!({
        "message": "User metric deleted successfully",
        "deletedUserMetric": deleted,
    })))
}

// --- badges ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBadgeBody {
    pub user_id: Option<Value>,
    pub badge_id: Option<String>,
    pub badge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBadgeBody {
    pub badge_id: Option<String>,
    pub badge_name: Option<String>,
}

#[instrument(skip(state))]
pub async fn badges_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = Badge::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("BADGE_NOT_FOUND", "Badge not found"))?;
        return Ok(Json(row).into_response());
    }

    let rows = Badge::list(
        &state.db,
        user_filter(q.user_id.as_deref())?,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn badges_create(
    State(state): State<AppState>,
    Json(body): Json<CreateBadgeBody>,
) -> Result<(StatusCode, Json<Badge>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let badge_id = require_trimmed(body.badge_id.as_deref(), "MISSING_BADGE_ID", "badgeId")?;
    let badge_name = require_trimmed(body.badge_name.as_deref(), "MISSING_BADGE_NAME", "badgeName")?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = Badge::create(&state.db, user_id, &badge_id, &badge_name).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn badges_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateBadgeBody>,
) -> Result<Json<Badge>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = Badge::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("BADGE_NOT_FOUND", "Badge not found"))?;

    let badge_id = match body.badge_id.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "MISSING_BADGE_ID", "badgeId")?),
        None => None,
    };
    let badge_name = match body.badge_name.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "MISSING_BADGE_NAME", "badgeName")?),
        None => None,
    };

    if badge_id.is_none() && badge_name.is_none() {
        return Ok(Json(existing));
    }

    let row = Badge::update(&state.db, id, badge_id.as_deref(), badge_name.as_deref()).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn badges_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = Badge::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("BADGE_NOT_FOUND", "Badge not found"))?;
    Ok(Json(json!({
        "message": "Badge deleted successfully",
        "deletedBadge": deleted,
    })))
}

// --- user streaks ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreakBody {
    pub user_id: Option<Value>,
    pub current_streak: Option<Value>,
    pub longest_streak: Option<Value>,
    pub last_activity_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStreakBody {
    pub current_streak: Option<Value>,
    pub longest_streak: Option<Value>,
    pub last_activity_date: Option<String>,
}

fn optional_streak(
    value: Option<&Value>,
    invalid: &'static str,
    what: &str,
) -> Result<Option<i32>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => require_non_negative(v, invalid, what).map(Some),
    }
}

#[instrument(skip(state))]
pub async fn streaks_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = UserStreak::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User streak not found"))?;
        return Ok(Json(row).into_response());
    }

    let rows = UserStreak::list(
        &state.db,
        user_filter(q.user_id.as_deref())?,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn streaks_create(
    State(state): State<AppState>,
    Json(body): Json<CreateStreakBody>,
) -> Result<(StatusCode, Json<UserStreak>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let current = optional_streak(
        body.current_streak.as_ref(),
        "INVALID_CURRENT_STREAK",
        "currentStreak",
    )?
    .unwrap_or(0);
    let longest = optional_streak(
        body.longest_streak.as_ref(),
        "INVALID_LONGEST_STREAK",
        "longestStreak",
    )?
    .unwrap_or(0);
    let last_activity = body
        .last_activity_date
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = UserStreak::create(&state.db, user_id, current, longest, last_activity)
        .await?
        .ok_or_else(|| {
            ApiError::bad_request("STREAK_EXISTS", "A streak row already exists for this user")
        })?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn streaks_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateStreakBody>,
) -> Result<Json<UserStreak>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = UserStreak::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User streak not found"))?;

    let current = optional_streak(
        body.current_streak.as_ref(),
        "INVALID_CURRENT_STREAK",
        "currentStreak",
    )?;
    let longest = optional_streak(
        body.longest_streak.as_ref(),
        "INVALID_LONGEST_STREAK",
        "longestStreak",
    )?;
    let last_activity = body
        .last_activity_date
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if current.is_none() && longest.is_none() && last_activity.is_none() {
        return Ok(Json(existing));
    }

    let row = UserStreak::update(&state.db, id, current, longest, last_activity).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn streaks_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = UserStreak::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "User streak not found"))?;
    Ok(Json(json!({
        "message": "User streak deleted successfully",
        "deletedUserStreak": deleted,
    })))
}

// --- daily tasks ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    pub user_id: Option<Value>,
    pub task_name: Option<String>,
    pub task_time: Option<String>,
    pub completed: Option<bool>,
    pub completion_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskBody {
    pub task_name: Option<String>,
    pub task_time: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub completion_date: Option<Option<String>>,
}

fn nullable_string<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

#[instrument(skip(state))]
pub async fn tasks_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = DailyTask::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Daily task not found"))?;
        return Ok(Json(row).into_response());
    }

    let completed = q.completed.as_deref().map(|v| v == "true");
    let rows = DailyTask::list(
        &state.db,
        user_filter(q.user_id.as_deref())?,
        completed,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn tasks_create(
    State(state): State<AppState>,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<DailyTask>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let task_name = require_trimmed(body.task_name.as_deref(), "MISSING_TASK_NAME", "taskName")?;
    let task_time = require_trimmed(body.task_time.as_deref(), "MISSING_TASK_TIME", "taskTime")?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = DailyTask::create(
        &state.db,
        user_id,
        &task_name,
        &task_time,
        body.completed.unwrap_or(false),
        body.completion_date.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn tasks_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateTaskBody>,
) -> Result<Json<DailyTask>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = DailyTask::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Daily task not found"))?;

    let task_name = match body.task_name.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "MISSING_TASK_NAME", "taskName")?),
        None => None,
    };
    let task_time = match body.task_time.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "MISSING_TASK_TIME", "taskTime")?),
        None => None,
    };

    if task_name.is_none()
        && task_time.is_none()
        && body.completed.is_none()
        && body.completion_date.is_none()
    {
        return Ok(Json(existing));
    }

    let completion_date = body
        .completion_date
        .as_ref()
        .map(|inner| inner.as_deref());
    let row = DailyTask::update(
        &state.db,
        id,
        task_name.as_deref(),
        task_time.as_deref(),
        body.completed,
        completion_date,
    )
    .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn tasks_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = DailyTask::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Daily task not found"))?;
    Ok(Json(json!({
        "message": "Daily task deleted successfully",
        "deletedDailyTask": deleted,
    })))
}

// --- dashboard ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user_id: i64,
    pub metrics: Vec<UserMetric>,
    pub streaks: Option<UserStreak>,
    pub badges: Vec<Badge>,
    pub tasks: Vec<DailyTask>,
}

/// GET /users/:id/dashboard — fan out the four independent reads and merge.
/// A user with no rows anywhere has no dashboard.
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Dashboard>, ApiError> {
    let user_id = parse_id_param(&raw_id, "INVALID_USER_ID", "user ID")?;

    let (metrics, streaks, badges, tasks) = tokio::try_join!(
        UserMetric::all_for_user(&state.db, user_id),
        UserStreak::for_user(&state.db, user_id),
        Badge::all_for_user(&state.db, user_id),
        DailyTask::all_for_user(&state.db, user_id),
    )?;

    if metrics.is_empty() && streaks.is_none() && badges.is_empty() && tasks.is_empty() {
        return Err(ApiError::not_found(
            "USER_DATA_NOT_FOUND",
            "No dashboard data found for this user",
        ));
    }

    Ok(Json(Dashboard {
        user_id,
        metrics,
        streaks,
        badges,
        tasks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_value_accepts_strings_and_numbers() {
        assert_eq!(metric_value(&json!("7.5")).as_deref(), Some("7.5"));
        assert_eq!(metric_value(&json!(42)).as_deref(), Some("42"));
        assert_eq!(metric_value(&json!("  ")), None);
        assert_eq!(metric_value(&json!({})), None);
    }

    #[test]
    fn metric_type_parsing_is_strict() {
        assert!(parse_metric_type("sleep").is_ok());
        assert!(parse_metric_type("screen_time").is_ok());
        assert!(matches!(
            parse_metric_type("steps").unwrap_err(),
            ApiError::BadRequest { code: "INVALID_METRIC_TYPE", .. }
        ));
    }

    #[test]
    fn streak_counters_reject_negative_values() {
        assert!(matches!(
            optional_streak(Some(&json!(-2)), "INVALID_CURRENT_STREAK", "currentStreak")
                .unwrap_err(),
            ApiError::BadRequest { code: "INVALID_CURRENT_STREAK", .. }
        ));
        assert_eq!(
            optional_streak(Some(&json!(4)), "INVALID_CURRENT_STREAK", "currentStreak").unwrap(),
            Some(4)
        );
        assert_eq!(
            optional_streak(None, "INVALID_CURRENT_STREAK", "currentStreak").unwrap(),
            None
        );
    }
}
