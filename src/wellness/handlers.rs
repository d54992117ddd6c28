use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use super::repo::{WellnessGoal, WellnessPlan};
use crate::error::ApiError;
use crate::pagination::{clamped_limit, clamped_offset};
use crate::state::AppState;
use crate::users::repo::User;
use crate::validate::{parse_id_param, require_id, require_trimmed};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub id: Option<String>,
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

fn user_filter(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    raw.map(|v| parse_id_param(v, "INVALID_USER_ID", "userId"))
        .transpose()
}

// --- wellness goals ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalBody {
    pub user_id: Option<Value>,
    pub goal_id: Option<String>,
    pub goal_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalBody {
    pub goal_id: Option<String>,
    pub goal_title: Option<String>,
}

#[instrument(skip(state))]
pub async fn goals_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = WellnessGoal::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Wellness goal not found"))?;
        return Ok(Json(row).into_response());
    }

    let rows = WellnessGoal::list(
        &state.db,
        user_filter(q.user_id.as_deref())?,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn goals_create(
    State(state): State<AppState>,
    Json(body): Json<CreateGoalBody>,
) -> Result<(StatusCode, Json<WellnessGoal>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let goal_id = require_trimmed(body.goal_id.as_deref(), "MISSING_GOAL_ID", "goalId")?;
    let goal_title = require_trimmed(body.goal_title.as_deref(), "MISSING_GOAL_TITLE", "goalTitle")?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = WellnessGoal::create(&state.db, user_id, &goal_id, &goal_title).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn goals_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateGoalBody>,
) -> Result<Json<WellnessGoal>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = WellnessGoal::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Wellness goal not found"))?;

    let goal_id = match body.goal_id.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "MISSING_GOAL_ID", "goalId")?),
        None => None,
    };
    let goal_title = match body.goal_title.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "MISSING_GOAL_TITLE", "goalTitle")?),
        None => None,
    };

    if goal_id.is_none() && goal_title.is_none() {
        return Ok(Json(existing));
    }

    let row = WellnessGoal::update(&state.db, id, goal_id.as_deref(), goal_title.as_deref()).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn goals_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = WellnessGoal::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Wellness goal not found"))?;
    Ok(Json(json!({
        "message": "Wellness goal deleted successfully",
        "deletedWellnessGoal": deleted,
    })))
}

// --- wellness plans ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanBody {
    pub user_id: Option<Value>,
    pub plan_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanBody {
    pub plan_data: Option<Value>,
}

/// Plan documents must be JSON objects, never arrays or primitives.
fn require_plan_object(value: Option<&Value>) -> Result<Value, ApiError> {
    match value {
        None | Some(Value::Null) => Err(ApiError::bad_request(
            "MISSING_PLAN_DATA",
            "planData is required",
        )),
        Some(v) if v.is_object() => Ok(v.clone()),
        Some(_) => Err(ApiError::bad_request(
            "INVALID_PLAN_DATA",
            "planData must be a JSON object",
        )),
    }
}

#[instrument(skip(state))]
pub async fn plans_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = WellnessPlan::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Wellness plan not found"))?;
        return Ok(Json(row).into_response());
    }

    let rows = WellnessPlan::list(
        &state.db,
        user_filter(q.user_id.as_deref())?,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn plans_create(
    State(state): State<AppState>,
    Json(body): Json<CreatePlanBody>,
) -> Result<(StatusCode, Json<WellnessPlan>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let plan_data = require_plan_object(body.plan_data.as_ref())?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = WellnessPlan::create(&state.db, user_id, &plan_data).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn plans_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdatePlanBody>,
) -> Result<Json<WellnessPlan>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = WellnessPlan::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Wellness plan not found"))?;

    let plan_data = match body.plan_data.as_ref() {
        None => return Ok(Json(existing)),
        Some(Value::Null) => return Ok(Json(existing)),
        Some(v) if v.is_object() => v.clone(),
        Some(_) => {
            return Err(ApiError::bad_request(
                "INVALID_PLAN_DATA",
                "planData must be a JSON object",
            ))
        }
    };

    let row = WellnessPlan::update(&state.db, id, &plan_data).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn plans_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = WellnessPlan::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Wellness plan not found"))?;
    Ok(Json(json!({
        "message": "Wellness plan deleted successfully",
        "deletedWellnessPlan": deleted,
    })))
}

// --- composite plan view ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub user_id: i64,
    pub plan: WellnessPlan,
    pub goals: Vec<WellnessGoal>,
}

/// GET /users/:id/wellness-plan — active plan plus all goals. Goals without
/// a plan are not enough; the plan is what makes the view exist.
#[instrument(skip(state))]
pub async fn plan_view(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<PlanView>, ApiError> {
    let user_id = parse_id_param(&raw_id, "INVALID_USER_ID", "user ID")?;

    let (plan, goals) = tokio::try_join!(
        WellnessPlan::latest_for_user(&state.db, user_id),
        WellnessGoal::list_for_user(&state.db, user_id),
    )?;

    let plan = plan.ok_or_else(|| {
        ApiError::not_found("PLAN_NOT_FOUND", "Wellness plan not found for this user")
    })?;

    Ok(Json(PlanView {
        user_id,
        plan,
        goals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_data_must_be_an_object() {
        assert!(require_plan_object(Some(&json!({"week": 1}))).is_ok());
        assert!(matches!(
            require_plan_object(Some(&json!([1, 2]))).unwrap_err(),
            ApiError::BadRequest { code: "INVALID_PLAN_DATA", .. }
        ));
        assert!(matches!(
            require_plan_object(Some(&json!("plan"))).unwrap_err(),
            ApiError::BadRequest { code: "INVALID_PLAN_DATA", .. }
        ));
        assert!(matches!(
            require_plan_object(None).unwrap_err(),
            ApiError::BadRequest { code: "MISSING_PLAN_DATA", .. }
        ));
    }
}
