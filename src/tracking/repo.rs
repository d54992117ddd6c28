use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "metric_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    ScreenTime,
    Sleep,
    Activity,
    Mood,
}

impl MetricType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "screen_time" => Some(Self::ScreenTime),
            "sleep" => Some(Self::Sleep),
            "activity" => Some(Self::Activity),
            "mood" => Some(Self::Mood),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserMetric {
    pub id: i64,
    pub user_id: i64,
    pub metric_type: MetricType,
    pub value: String,
    pub date: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub user_id: i64,
    pub badge_id: String,
    pub badge_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub earned_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStreak {
    pub id: i64,
    pub user_id: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Streak summary used by the family-group view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: i32,
    pub longest_streak: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: i64,
    pub user_id: i64,
    pub task_name: String,
    pub task_time: String,
    pub completed: bool,
    pub completion_date: Option<String>,
}

const METRIC_COLS: &str = "id, user_id, metric_type, value, date, created_at";
const BADGE_COLS: &str = "id, user_id, badge_id, badge_name, earned_at";
const STREAK_COLS: &str =
    "id, user_id, current_streak, longest_streak, last_activity_date, updated_at";
const TASK_COLS: &str = "id, user_id, task_name, task_time, completed, completion_date";

impl UserMetric {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<UserMetric>> {
        let row = sqlx::query_as::<_, UserMetric>(&format!(
            "SELECT {METRIC_COLS} FROM user_metrics WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        user_id: Option<i64>,
        metric_type: Option<MetricType>,
        date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<UserMetric>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {METRIC_COLS} FROM user_metrics WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        if let Some(mt) = metric_type {
            qb.push(" AND metric_type = ").push_bind(mt);
        }
        if let Some(d) = date {
            qb.push(" AND date = ").push_bind(d.to_string());
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<UserMetric>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn all_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<UserMetric>> {
        let rows = sqlx::query_as::<_, UserMetric>(&format!(
            "SELECT {METRIC_COLS} FROM user_metrics WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        metric_type: MetricType,
        value: &str,
        date: &str,
    ) -> anyhow::Result<UserMetric> {
        let row = sqlx::query_as::<_, UserMetric>(&format!(
            r#"
            INSERT INTO user_metrics (user_id, metric_type, value, date)
            VALUES ($1, $2, $3, $4)
            RETURNING {METRIC_COLS}
            "#
        ))
        .bind(user_id)
        .bind(metric_type)
        .bind(value)
        .bind(date)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        metric_type: Option<MetricType>,
        value: Option<&str>,
        date: Option<&str>,
    ) -> anyhow::Result<UserMetric> {
        let row = sqlx::query_as::<_, UserMetric>(&format!(
            r#"
            UPDATE user_metrics
            SET metric_type = COALESCE($2, metric_type),
                value       = COALESCE($3, value),
                date        = COALESCE($4, date)
            WHERE id = $1
            RETURNING {METRIC_COLS}
            "#
        ))
        .bind(id)
        .bind(metric_type)
        .bind(value)
        .bind(date)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<UserMetric>> {
        let row = sqlx::query_as::<_, UserMetric>(&format!(
            "DELETE FROM user_metrics WHERE id = $1 RETURNING {METRIC_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl Badge {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<Badge>> {
        let row = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLS} FROM badges WHERE id = $1"
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
    ) -> anyhow::Result<Vec<Badge>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {BADGE_COLS} FROM badges WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<Badge>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn all_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<Badge>> {
        let rows = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLS} FROM badges WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM badges WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        badge_id: &str,
        badge_name: &str,
    ) -> anyhow::Result<Badge> {
        let row = sqlx::query_as::<_, Badge>(&format!(
            r#"
            INSERT INTO badges (user_id, badge_id, badge_name)
            VALUES ($1, $2, $3)
            RETURNING {BADGE_COLS}
            "#
        ))
        .bind(user_id)
        .bind(badge_id)
        .bind(badge_name)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        badge_id: Option<&str>,
        badge_name: Option<&str>,
    ) -> anyhow::Result<Badge> {
        let row = sqlx::query_as::<_, Badge>(&format!(
            r#"
            UPDATE badges
            SET badge_id   = COALESCE($2, badge_id),
                badge_name = COALESCE($3, badge_name)
            WHERE id = $1
            RETURNING {BADGE_COLS}
            "#
        ))
        .bind(id)
        .bind(badge_id)
        .bind(badge_name)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<Badge>> {
        let row = sqlx::query_as::<_, Badge>(&format!(
            "DELETE FROM badges WHERE id = $1 RETURNING {BADGE_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl UserStreak {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<UserStreak>> {
        let row = sqlx::query_as::<_, UserStreak>(&format!(
            "SELECT {STREAK_COLS} FROM user_streaks WHERE id = $1"
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
    ) -> anyhow::Result<Vec<UserStreak>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {STREAK_COLS} FROM user_streaks WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<UserStreak>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Option<UserStreak>> {
        let row = sqlx::query_as::<_, UserStreak>(&format!(
            "SELECT {STREAK_COLS} FROM user_streaks WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn summary_for_user(
        db: &PgPool,
        user_id: i64,
    ) -> anyhow::Result<Option<StreakSummary>> {
        let row = sqlx::query_as::<_, StreakSummary>(
            "SELECT current_streak, longest_streak FROM user_streaks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Returns None when a streak row already exists for the user; the
    /// unique constraint turns a concurrent duplicate into a no-op here
    /// instead of a second row.
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        current_streak: i32,
        longest_streak: i32,
        last_activity_date: Option<&str>,
    ) -> anyhow::Result<Option<UserStreak>> {
        let row = sqlx::query_as::<_, UserStreak>(&format!(
            r#"
            INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_activity_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {STREAK_COLS}
            "#
        ))
        .bind(user_id)
        .bind(current_streak)
        .bind(longest_streak)
        .bind(last_activity_date)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        current_streak: Option<i32>,
        longest_streak: Option<i32>,
        last_activity_date: Option<&str>,
    ) -> anyhow::Result<UserStreak> {
        let row = sqlx::query_as::<_, UserStreak>(&format!(
            r#"
            UPDATE user_streaks
            SET current_streak     = COALESCE($2, current_streak),
                longest_streak     = COALESCE($3, longest_streak),
                last_activity_date = COALESCE($4, last_activity_date),
                updated_at         = now()
            WHERE id = $1
            RETURNING {STREAK_COLS}
            "#
        ))
        .bind(id)
        .bind(current_streak)
        .bind(longest_streak)
        .bind(last_activity_date)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<UserStreak>> {
        let row = sqlx::query_as::<_, UserStreak>(&format!(
            "DELETE FROM user_streaks WHERE id = $1 RETURNING {STREAK_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

impl DailyTask {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<DailyTask>> {
        let row = sqlx::query_as::<_, DailyTask>(&format!(
            "SELECT {TASK_COLS} FROM daily_tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        user_id: Option<i64>,
        completed: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DailyTask>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {TASK_COLS} FROM daily_tasks WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        if let Some(done) = completed {
            qb.push(" AND completed = ").push_bind(done);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<DailyTask>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn all_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<DailyTask>> {
        let rows = sqlx::query_as::<_, DailyTask>(&format!(
            "SELECT {TASK_COLS} FROM daily_tasks WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        task_name: &str,
        task_time: &str,
        completed: bool,
        completion_date: Option<&str>,
    ) -> anyhow::Result<DailyTask> {
        let row = sqlx::query_as::<_, DailyTask>(&format!(
            r#"
            INSERT INTO daily_tasks (user_id, task_name, task_time, completed, completion_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLS}
            "#
        ))
        .bind(user_id)
        .bind(task_name)
        .bind(task_time)
        .bind(completed)
        .bind(completion_date)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        task_name: Option<&str>,
        task_time: Option<&str>,
        completed: Option<bool>,
        completion_date: Option<Option<&str>>,
    ) -> anyhow::Result<DailyTask> {
        let row = sqlx::query_as::<_, DailyTask>(&format!(
            r#"
            UPDATE daily_tasks
            SET task_name       = COALESCE($2, task_name),
                task_time       = COALESCE($3, task_time),
                completed       = COALESCE($4, completed),
                completion_date = CASE WHEN $5 THEN $6 ELSE completion_date END
            WHERE id = $1
            RETURNING {TASK_COLS}
            "#
        ))
        .bind(id)
        .bind(task_name)
        .bind(task_time)
        .bind(completed)
        .bind(completion_date.is_some())
        .bind(completion_date.flatten())
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<DailyTask>> {
        let row = sqlx::query_as::<_, DailyTask>(&format!(
            "DELETE FROM daily_tasks WHERE id = $1 RETURNING {TASK_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
