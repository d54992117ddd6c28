use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Slim profile used by the family-group view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Placeholder for members whose user row no longer exists.
    pub fn unknown(user_id: i64) -> Self {
        Self {
            id: user_id,
            name: "Unknown User".to_string(),
            email: String::new(),
            avatar_url: None,
        }
    }
}

impl User {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn profile(db: &PgPool, id: i64) -> anyhow::Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, name, email, avatar_url
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, created_at, updated_at
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        name: &str,
        avatar_url: Option<&str>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, avatar_url)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(avatar_url)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        email: Option<&str>,
        name: Option<&str>,
        avatar_url: Option<Option<&str>>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email      = COALESCE($2, email),
                name       = COALESCE($3, name),
                avatar_url = CASE WHEN $4 THEN $5 ELSE avatar_url END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(avatar_url.is_some())
        .bind(avatar_url.flatten())
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// User-owned rows go with the user via ON DELETE CASCADE. The cascades
    /// would silently strand likes_count/comments_count on posts the user
    /// interacted with, so those counters are settled first in the same
    /// transaction.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let mut tx = db.begin().await?;

        sqlx::query(
            r#"
            UPDATE community_posts p
            SET likes_count = GREATEST(p.likes_count - l.cnt, 0), updated_at = now()
            FROM (
                SELECT post_id, count(*) AS cnt
                FROM post_likes
                WHERE user_id = $1
                GROUP BY post_id
            ) l
            WHERE p.id = l.post_id
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE community_posts p
            SET comments_count = GREATEST(p.comments_count - c.cnt, 0), updated_at = now()
            FROM (
                SELECT post_id, count(*) AS cnt
                FROM post_comments
                WHERE user_id = $1
                GROUP BY post_id
            ) c
            WHERE p.id = c.post_id
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, email, name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }
}
