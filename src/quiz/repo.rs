use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use super::scoring::{AnswerTriple, Scores};

/// Categorical wellness label derived from the balance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mood_result")]
pub enum MoodResult {
    Balanced,
    #[serde(rename = "Needs Attention")]
    #[sqlx(rename = "Needs Attention")]
    NeedsAttention,
    Overloaded,
}

impl MoodResult {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Balanced" => Some(Self::Balanced),
            "Needs Attention" => Some(Self::NeedsAttention),
            "Overloaded" => Some(Self::Overloaded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::NeedsAttention => "Needs Attention",
            Self::Overloaded => "Overloaded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: i64,
    pub user_id: i64,
    pub question_id: String,
    pub answer_index: i32,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub balance_score: i32,
    pub mood_result: MoodResult,
    pub cognitive_score: i32,
    pub physical_score: i32,
    pub digital_score: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const RESPONSE_COLS: &str = "id, user_id, question_id, answer_index, category, created_at";
const RESULT_COLS: &str =
    "id, user_id, balance_score, mood_result, cognitive_score, physical_score, digital_score, created_at";

impl QuizResponse {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<QuizResponse>> {
        let row = sqlx::query_as::<_, QuizResponse>(&format!(
            "SELECT {RESPONSE_COLS} FROM quiz_responses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<QuizResponse>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {RESPONSE_COLS} FROM quiz_responses WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<QuizResponse>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        question_id: &str,
        answer_index: i32,
        category: &str,
    ) -> anyhow::Result<QuizResponse> {
        let row = sqlx::query_as::<_, QuizResponse>(&format!(
            r#"
            INSERT INTO quiz_responses (user_id, question_id, answer_index, category)
            VALUES ($1, $2, $3, $4)
            RETURNING {RESPONSE_COLS}
            "#
        ))
        .bind(user_id)
        .bind(question_id)
        .bind(answer_index)
        .bind(category)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        question_id: Option<&str>,
        answer_index: Option<i32>,
        category: Option<&str>,
    ) -> anyhow::Result<QuizResponse> {
        let row = sqlx::query_as::<_, QuizResponse>(&format!(
            r#"
            UPDATE quiz_responses
            SET question_id  = COALESCE($2, question_id),
                answer_index = COALESCE($3, answer_index),
                category     = COALESCE($4, category)
            WHERE id = $1
            RETURNING {RESPONSE_COLS}
            "#
        ))
        .bind(id)
        .bind(question_id)
        .bind(answer_index)
        .bind(category)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<QuizResponse>> {
        let row = sqlx::query_as::<_, QuizResponse>(&format!(
            "DELETE FROM quiz_responses WHERE id = $1 RETURNING {RESPONSE_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl QuizResult {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<QuizResult>> {
        let row = sqlx::query_as::<_, QuizResult>(&format!(
            "SELECT {RESULT_COLS} FROM quiz_results WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<QuizResult>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {RESULT_COLS} FROM quiz_results WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<QuizResult>().fetch_all(db).await?;
        Ok(rows)
    }

    /// Most recent result is the user's "current" one.
    pub async fn latest_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Option<QuizResult>> {
        let row = sqlx::query_as::<_, QuizResult>(&format!(
            r#"
            SELECT {RESULT_COLS} FROM quiz_results
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        balance_score: i32,
        mood_result: MoodResult,
        cognitive_score: i32,
        physical_score: i32,
        digital_score: i32,
    ) -> anyhow::Result<QuizResult> {
        let row = sqlx::query_as::<_, QuizResult>(&format!(
            r#"
            INSERT INTO quiz_results
                (user_id, balance_score, mood_result, cognitive_score, physical_score, digital_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESULT_COLS}
            "#
        ))
        .bind(user_id)
        .bind(balance_score)
        .bind(mood_result)
        .bind(cognitive_score)
        .bind(physical_score)
        .bind(digital_score)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        balance_score: Option<i32>,
        mood_result: Option<MoodResult>,
        cognitive_score: Option<i32>,
        physical_score: Option<i32>,
        digital_score: Option<i32>,
    ) -> anyhow::Result<QuizResult> {
        let row = sqlx::query_as::<_, QuizResult>(&format!(
            r#"
            UPDATE quiz_results
            SET balance_score   = COALESCE($2, balance_score),
                mood_result     = COALESCE($3, mood_result),
                cognitive_score = COALESCE($4, cognitive_score),
                physical_score  = COALESCE($5, physical_score),
                digital_score   = COALESCE($6, digital_score)
            WHERE id = $1
            RETURNING {RESULT_COLS}
            "#
        ))
        .bind(id)
        .bind(balance_score)
        .bind(mood_result)
        .bind(cognitive_score)
        .bind(physical_score)
        .bind(digital_score)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<QuizResult>> {
        let row = sqlx::query_as::<_, QuizResult>(&format!(
            "DELETE FROM quiz_results WHERE id = $1 RETURNING {RESULT_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

/// Persist a scored submission as one atomic unit: every response row plus
/// the result row share a single timestamp, and a failure anywhere rolls the
/// whole batch back.
pub async fn persist_submission(
    db: &PgPool,
    user_id: i64,
    answers: &[AnswerTriple],
    scores: Scores,
    mood: MoodResult,
) -> anyhow::Result<(QuizResult, Vec<QuizResponse>)> {
    let mut tx = db.begin().await?;
    let now = OffsetDateTime::now_utc();

    let mut saved = Vec::with_capacity(answers.len());
    for answer in answers {
        let row = sqlx::query_as::<_, QuizResponse>(&format!(
            r#"
            INSERT INTO quiz_responses (user_id, question_id, answer_index, category, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESPONSE_COLS}
            "#
        ))
        .bind(user_id)
        .bind(&answer.question_id)
        .bind(answer.answer_index)
        .bind(&answer.category)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        saved.push(row);
    }

    let result = sqlx::query_as::<_, QuizResult>(&format!(
        r#"
        INSERT INTO quiz_results
            (user_id, balance_score, mood_result, cognitive_score, physical_score, digital_score, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {RESULT_COLS}
        "#
    ))
    .bind(user_id)
    .bind(scores.balance())
    .bind(mood)
    .bind(scores.cognitive)
    .bind(scores.physical)
    .bind(scores.digital)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((result, saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_labels_round_trip() {
        for (mood, label) in [
            (MoodResult::Balanced, "Balanced"),
            (MoodResult::NeedsAttention, "Needs Attention"),
            (MoodResult::Overloaded, "Overloaded"),
        ] {
            assert_eq!(mood.as_str(), label);
            assert_eq!(MoodResult::parse(label), Some(mood));
            assert_eq!(
                serde_json::to_string(&mood).unwrap(),
                format!("\"{label}\"")
            );
        }
        // labels are exact; lowercase input is not a valid enum value
        assert_eq!(MoodResult::parse("balanced"), None);
        assert_eq!(MoodResult::parse("needs attention"), None);
    }
}
