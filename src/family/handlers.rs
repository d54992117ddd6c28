use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::instrument;

use super::repo::FamilyMember;
use crate::error::ApiError;
use crate::pagination::{clamped_limit, clamped_offset};
use crate::quiz::repo::QuizResult;
use crate::state::AppState;
use crate::tracking::repo::{Badge, UserStreak};
use crate::users::repo::{User, UserProfile};
use crate::validate::{parse_id_param, require_id, require_trimmed};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub id: Option<String>,
    pub family_group_id: Option<String>,
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

// --- family member records ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberBody {
    pub family_group_id: Option<String>,
    pub user_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberBody {
    pub family_group_id: Option<String>,
}

#[instrument(skip(state))]
pub async fn members_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = FamilyMember::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Family member not found"))?;
        return Ok(Json(row).into_response());
    }

    let user_id = q
        .user_id
        .as_deref()
        .map(|v| parse_id_param(v, "INVALID_USER_ID", "userId"))
        .transpose()?;
    let rows = FamilyMember::list(
        &state.db,
        q.family_group_id.as_deref().map(str::trim).filter(|v| !v.is_empty()),
        user_id,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn members_create(
    State(state): State<AppState>,
    Json(body): Json<CreateMemberBody>,
) -> Result<(StatusCode, Json<FamilyMember>), ApiError> {
    let group_id = require_trimmed(
        body.family_group_id.as_deref(),
        "MISSING_FAMILY_GROUP_ID",
        "familyGroupId",
    )?;
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = FamilyMember::create(&state.db, &group_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn members_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateMemberBody>,
) -> Result<Json<FamilyMember>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = FamilyMember::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Family member not found"))?;

    let group_id = match body.family_group_id.as_deref() {
        Some(raw) => Some(require_trimmed(
            Some(raw),
            "MISSING_FAMILY_GROUP_ID",
            "familyGroupId",
        )?),
        None => None,
    };

    if group_id.is_none() {
        return Ok(Json(existing));
    }

    let row = FamilyMember::update(&state.db, id, group_id.as_deref()).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn members_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = FamilyMember::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Family member not found"))?;
    Ok(Json(json!({
        "message": "Family member deleted successfully",
        "deletedFamilyMember": deleted,
    })))
}

// --- group progress view ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub badge_count: i64,
    pub last_quiz_result: Option<QuizResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    pub user: UserProfile,
    pub progress: MemberProgress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub family_group_id: String,
    pub members: Vec<MemberView>,
}

async fn member_view(db: &PgPool, member: FamilyMember) -> anyhow::Result<MemberView> {
    let (profile, streak, badge_count, last_quiz) = tokio::try_join!(
        User::profile(db, member.user_id),
        UserStreak::summary_for_user(db, member.user_id),
        Badge::count_for_user(db, member.user_id),
        QuizResult::latest_for_user(db, member.user_id),
    )?;

    let (current_streak, longest_streak) = streak
        .map(|s| (s.current_streak, s.longest_streak))
        .unwrap_or((0, 0));

    Ok(MemberView {
        id: member.id,
        user_id: member.user_id,
        joined_at: member.joined_at,
        user: profile.unwrap_or_else(|| UserProfile::unknown(member.user_id)),
        progress: MemberProgress {
            current_streak,
            longest_streak,
            badge_count,
            last_quiz_result: last_quiz,
        },
    })
}

/// GET /family/:group_id/members — every member with their progress rollup.
/// An empty group is a successful empty result, not a 404; members whose
/// user row is gone still appear with a placeholder profile.
#[instrument(skip(state))]
pub async fn group_view(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ApiError> {
    let group_id = group_id.trim().to_string();
    if group_id.is_empty() {
        return Err(ApiError::bad_request(
            "MISSING_GROUP_ID",
            "Family group ID is required",
        ));
    }

    let members = FamilyMember::all_in_group(&state.db, &group_id).await?;
    let members = try_join_all(members.into_iter().map(|m| member_view(&state.db, m))).await?;

    Ok(Json(GroupView {
        family_group_id: group_id,
        members,
    }))
}
