use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessGoal {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: String,
    pub goal_title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub selected_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessPlan {
    pub id: i64,
    pub user_id: i64,
    pub plan_data: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const GOAL_COLS: &str = "id, user_id, goal_id, goal_title, selected_at";
const PLAN_COLS: &str = "id, user_id, plan_data, created_at, updated_at";

impl WellnessGoal {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<WellnessGoal>> {
        let row = sqlx::query_as::<_, WellnessGoal>(&format!(
            "SELECT {GOAL_COLS} FROM wellness_goals WHERE id = $1"
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
    ) -> anyhow::Result<Vec<WellnessGoal>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {GOAL_COLS} FROM wellness_goals WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<WellnessGoal>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn list_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<WellnessGoal>> {
        let rows = sqlx::query_as::<_, WellnessGoal>(&format!(
            "SELECT {GOAL_COLS} FROM wellness_goals WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        goal_id: &str,
        goal_title: &str,
    ) -> anyhow::Result<WellnessGoal> {
        let row = sqlx::query_as::<_, WellnessGoal>(&format!(
            r#"
            INSERT INTO wellness_goals (user_id, goal_id, goal_title)
            VALUES ($1, $2, $3)
            RETURNING {GOAL_COLS}
            "#
        ))
        .bind(user_id)
        .bind(goal_id)
        .bind(goal_title)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        goal_id: Option<&str>,
        goal_title: Option<&str>,
    ) -> anyhow::Result<WellnessGoal> {
        let row = sqlx::query_as::<_, WellnessGoal>(&format!(
            r#"
            UPDATE wellness_goals
            SET goal_id    = COALESCE($2, goal_id),
                goal_title = COALESCE($3, goal_title)
            WHERE id = $1
            RETURNING {GOAL_COLS}
            "#
        ))
        .bind(id)
        .bind(goal_id)
        .bind(goal_title)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<WellnessGoal>> {
        let row = sqlx::query_as::<_, WellnessGoal>(&format!(
            "DELETE FROM wellness_goals WHERE id = $1 RETURNING {GOAL_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl WellnessPlan {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<WellnessPlan>> {
        let row = sqlx::query_as::<_, WellnessPlan>(&format!(
            "SELECT {PLAN_COLS} FROM wellness_plans WHERE id = $1"
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
    ) -> anyhow::Result<Vec<WellnessPlan>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {PLAN_COLS} FROM wellness_plans WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<WellnessPlan>().fetch_all(db).await?;
        Ok(rows)
    }

    /// The most recently created plan is the active one.
    pub async fn latest_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Option<WellnessPlan>> {
        let row = sqlx::query_as::<_, WellnessPlan>(&format!(
            r#"
            SELECT {PLAN_COLS} FROM wellness_plans
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

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        plan_data: &serde_json::Value,
    ) -> anyhow::Result<WellnessPlan> {
        let row = sqlx::query_as::<_, WellnessPlan>(&format!(
            r#"
            INSERT INTO wellness_plans (user_id, plan_data)
            VALUES ($1, $2)
            RETURNING {PLAN_COLS}
            "#
        ))
        .bind(user_id)
        .bind(plan_data)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        plan_data: &serde_json::Value,
    ) -> anyhow::Result<WellnessPlan> {
        let row = sqlx::query_as::<_, WellnessPlan>(&format!(
            r#"
            UPDATE wellness_plans
            SET plan_data = $2, updated_at = now()
            WHERE id = $1
            RETURNING {PLAN_COLS}
            "#
        ))
        .bind(id)
        .bind(plan_data)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<WellnessPlan>> {
        let row = sqlx::query_as::<_, WellnessPlan>(&format!(
            "DELETE FROM wellness_plans WHERE id = $1 RETURNING {PLAN_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
