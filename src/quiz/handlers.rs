use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::repo::{MoodResult, QuizResponse, QuizResult};
use super::scoring::{self, AnswerTriple};
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
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn id_filter(raw: Option<&str>, code: &'static str, what: &str) -> Result<Option<i64>, ApiError> {
    raw.map(|v| parse_id_param(v, code, what)).transpose()
}

fn require_id_param(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        Some(v) => parse_id_param(v, "INVALID_ID", "ID"),
        None => Err(ApiError::bad_request("INVALID_ID", "Valid ID is required")),
    }
}

// --- quiz responses ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponseBody {
    pub user_id: Option<Value>,
    pub question_id: Option<String>,
    pub answer_index: Option<Value>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponseBody {
    pub question_id: Option<String>,
    pub answer_index: Option<Value>,
    pub category: Option<String>,
}

#[instrument(skip(state))]
pub async fn responses_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = QuizResponse::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Quiz response not found"))?;
        return Ok(Json(row).into_response());
    }

    let user_id = id_filter(q.user_id.as_deref(), "INVALID_USER_ID", "userId")?;
    let rows = QuizResponse::list(
        &state.db,
        user_id,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn responses_create(
    State(state): State<AppState>,
    Json(body): Json<CreateResponseBody>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let question_id = require_trimmed(
        body.question_id.as_deref(),
        "MISSING_QUESTION_ID",
        "questionId",
    )?;
    let answer_index = match body.answer_index.as_ref() {
        None | Some(Value::Null) => {
            return Err(ApiError::bad_request(
                "MISSING_ANSWER_INDEX",
                "answerIndex is required",
            ))
        }
        Some(v) => require_non_negative(v, "INVALID_ANSWER_INDEX", "answerIndex")?,
    };
    let category = require_trimmed(body.category.as_deref(), "MISSING_CATEGORY", "category")?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = QuizResponse::create(&state.db, user_id, &question_id, answer_index, &category).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn responses_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateResponseBody>,
) -> Result<Json<QuizResponse>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = QuizResponse::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Quiz response not found"))?;

    let question_id = match body.question_id.as_deref() {
        Some(raw) => Some(require_trimmed(
            Some(raw),
            "INVALID_QUESTION_ID",
            "questionId",
        )?),
        None => None,
    };
    let answer_index = match body.answer_index.as_ref() {
        None | Some(Value::Null) => None,
        Some(v) => Some(require_non_negative(v, "INVALID_ANSWER_INDEX", "answerIndex")?),
    };
    let category = match body.category.as_deref() {
        Some(raw) => Some(require_trimmed(Some(raw), "INVALID_CATEGORY", "category")?),
        None => None,
    };

    if question_id.is_none() && answer_index.is_none() && category.is_none() {
        return Ok(Json(existing));
    }

    let row = QuizResponse::update(
        &state.db,
        id,
        question_id.as_deref(),
        answer_index,
        category.as_deref(),
    )
    .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn responses_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = QuizResponse::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Quiz response not found"))?;
    Ok(Json(json!({
        "message": "Quiz response deleted successfully",
        "deletedQuizResponse": deleted,
    })))
}

// --- quiz results ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResultBody {
    pub user_id: Option<Value>,
    pub balance_score: Option<Value>,
    pub mood_result: Option<String>,
    pub cognitive_score: Option<Value>,
    pub physical_score: Option<Value>,
    pub digital_score: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultBody {
    pub balance_score: Option<Value>,
    pub mood_result: Option<String>,
    pub cognitive_score: Option<Value>,
    pub physical_score: Option<Value>,
    pub digital_score: Option<Value>,
}

fn score_field(
    value: Option<&Value>,
    missing: &'static str,
    invalid: &'static str,
    what: &str,
) -> Result<i32, ApiError> {
    match value {
        None | Some(Value::Null) => Err(ApiError::bad_request(
            missing,
            format!("{what} is required"),
        )),
        Some(v) => require_non_negative(v, invalid, what),
    }
}

fn optional_score(
    value: Option<&Value>,
    invalid: &'static str,
    what: &str,
) -> Result<Option<i32>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => require_non_negative(v, invalid, what).map(Some),
    }
}

fn parse_mood(raw: &str) -> Result<MoodResult, ApiError> {
    MoodResult::parse(raw.trim()).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_MOOD_RESULT",
            "moodResult must be one of: Balanced, Needs Attention, Overloaded",
        )
    })
}

#[instrument(skip(state))]
pub async fn results_list_or_get(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = q.id.as_deref() {
        let id = parse_id_param(raw, "INVALID_ID", "ID")?;
        let row = QuizResult::get(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Quiz result not found"))?;
        return Ok(Json(row).into_response());
    }

    let user_id = id_filter(q.user_id.as_deref(), "INVALID_USER_ID", "userId")?;
    let rows = QuizResult::list(
        &state.db,
        user_id,
        clamped_limit(q.limit.as_deref()),
        clamped_offset(q.offset.as_deref()),
    )
    .await?;
    Ok(Json(rows).into_response())
}

#[instrument(skip(state, body))]
pub async fn results_create(
    State(state): State<AppState>,
    Json(body): Json<CreateResultBody>,
) -> Result<(StatusCode, Json<QuizResult>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "MISSING_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let balance = score_field(
        body.balance_score.as_ref(),
        "MISSING_BALANCE_SCORE",
        "INVALID_BALANCE_SCORE",
        "balanceScore",
    )?;
    let mood = match body.mood_result.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_mood(raw)?,
        _ => {
            return Err(ApiError::bad_request(
                "MISSING_MOOD_RESULT",
                "moodResult is required",
            ))
        }
    };
    let cognitive = score_field(
        body.cognitive_score.as_ref(),
        "MISSING_COGNITIVE_SCORE",
        "INVALID_COGNITIVE_SCORE",
        "cognitiveScore",
    )?;
    let physical = score_field(
        body.physical_score.as_ref(),
        "MISSING_PHYSICAL_SCORE",
        "INVALID_PHYSICAL_SCORE",
        "physicalScore",
    )?;
    let digital = score_field(
        body.digital_score.as_ref(),
        "MISSING_DIGITAL_SCORE",
        "INVALID_DIGITAL_SCORE",
        "digitalScore",
    )?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let row = QuizResult::create(&state.db, user_id, balance, mood, cognitive, physical, digital)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, body))]
pub async fn results_update(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
    Json(body): Json<UpdateResultBody>,
) -> Result<Json<QuizResult>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let existing = QuizResult::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Quiz result not found"))?;

    let balance = optional_score(
        body.balance_score.as_ref(),
        "INVALID_BALANCE_SCORE",
        "balanceScore",
    )?;
    let mood = body.mood_result.as_deref().map(parse_mood).transpose()?;
    let cognitive = optional_score(
        body.cognitive_score.as_ref(),
        "INVALID_COGNITIVE_SCORE",
        "cognitiveScore",
    )?;
    let physical = optional_score(
        body.physical_score.as_ref(),
        "INVALID_PHYSICAL_SCORE",
        "physicalScore",
    )?;
    let digital = optional_score(
        body.digital_score.as_ref(),
        "INVALID_DIGITAL_SCORE",
        "digitalScore",
    )?;

    if balance.is_none()
        && mood.is_none()
        && cognitive.is_none()
        && physical.is_none()
        && digital.is_none()
    {
        return Ok(Json(existing));
    }

    let row = QuizResult::update(&state.db, id, balance, mood, cognitive, physical, digital).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn results_remove(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id_param(q.id.as_deref())?;
    let deleted = QuizResult::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Quiz result not found"))?;
    Ok(Json(json!({
        "message": "Quiz result deleted successfully",
        "deletedQuizResult": deleted,
    })))
}

// --- quiz submission ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    pub user_id: Option<Value>,
    pub responses: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub result: QuizResult,
    pub responses: Vec<QuizResponse>,
}

/// Validate the whole batch before touching the database; any bad triple
/// rejects the submission with no partial writes.
fn validate_batch(raw: Option<&Value>) -> Result<Vec<AnswerTriple>, ApiError> {
    let items = match raw {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(ApiError::bad_request(
                "INVALID_RESPONSES_FORMAT",
                "Responses must be an array",
            ))
        }
    };
    if items.is_empty() {
        return Err(ApiError::bad_request(
            "EMPTY_RESPONSES",
            "Responses array cannot be empty",
        ));
    }

    let mut answers = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let question_id = item
            .get("questionId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::bad_request(
                    "INVALID_QUESTION_ID",
                    format!("Response at index {i} missing valid questionId"),
                )
            })?;
        let answer_index = item
            .get("answerIndex")
            .and_then(Value::as_i64)
            .filter(|v| *v >= 0 && *v <= i32::MAX as i64)
            .ok_or_else(|| {
                ApiError::bad_request(
                    "INVALID_ANSWER_INDEX",
                    format!("Response at index {i} missing valid answerIndex"),
                )
            })?;
        let category = item
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::bad_request(
                    "INVALID_CATEGORY",
                    format!("Response at index {i} missing valid category"),
                )
            })?;
        answers.push(AnswerTriple {
            question_id: question_id.to_string(),
            answer_index: answer_index as i32,
            category: category.to_string(),
        });
    }
    Ok(answers)
}

#[instrument(skip(state, body))]
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let user_id = require_id(
        body.user_id.as_ref(),
        "INVALID_USER_ID",
        "INVALID_USER_ID",
        "userId",
    )?;
    let answers = validate_batch(body.responses.as_ref())?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    let scores = scoring::tally(&answers);
    let mood = scoring::mood_for(scores.balance());

    let (result, responses) =
        super::repo::persist_submission(&state.db, user_id, &answers, scores, mood).await?;
    info!(
        user_id,
        balance = result.balance_score,
        mood = mood.as_str(),
        "quiz submission scored"
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse { result, responses }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_must_be_a_non_empty_array() {
        assert!(matches!(
            validate_batch(None).unwrap_err(),
            ApiError::BadRequest { code: "INVALID_RESPONSES_FORMAT", .. }
        ));
        assert!(matches!(
            validate_batch(Some(&json!({}))).unwrap_err(),
            ApiError::BadRequest { code: "INVALID_RESPONSES_FORMAT", .. }
        ));
        assert!(matches!(
            validate_batch(Some(&json!([]))).unwrap_err(),
            ApiError::BadRequest { code: "EMPTY_RESPONSES", .. }
        ));
    }

    #[test]
    fn batch_rejects_first_bad_triple() {
        let raw = json!([
            { "questionId": "1", "answerIndex": 0, "category": "cognitive" },
            { "questionId": "", "answerIndex": 1, "category": "physical" },
        ]);
        let err = validate_batch(Some(&raw)).unwrap_err();
        assert!(matches!(
            err,
            ApiError::BadRequest { code: "INVALID_QUESTION_ID", .. }
        ));
    }

    #[test]
    fn batch_rejects_negative_answer_index() {
        let raw = json!([{ "questionId": "1", "answerIndex": -1, "category": "digital" }]);
        assert!(matches!(
            validate_batch(Some(&raw)).unwrap_err(),
            ApiError::BadRequest { code: "INVALID_ANSWER_INDEX", .. }
        ));
    }

    #[test]
    fn valid_batch_passes_through() {
        let raw = json!([
            { "questionId": "1", "answerIndex": 0, "category": "cognitive" },
            { "questionId": "2", "answerIndex": 1, "category": "physical" },
            { "questionId": "3", "answerIndex": 2, "category": "digital" },
        ]);
        let answers = validate_batch(Some(&raw)).unwrap();
        assert_eq!(answers.len(), 3);
        let scores = scoring::tally(&answers);
        assert_eq!(scores.balance(), 3);
    }
}
