use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "theme", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: i64,
    pub user_id: i64,
    pub theme: Theme,
    pub notifications_enabled: bool,
    pub sms_enabled: bool,
    pub email_enabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const SETTINGS_COLS: &str =
    "id, user_id, theme, notifications_enabled, sms_enabled, email_enabled, updated_at";

impl UserSettings {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<UserSettings>> {
        let row = sqlx::query_as::<_, UserSettings>(&format!(
            "SELECT {SETTINGS_COLS} FROM user_settings WHERE id = $1"
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
    ) -> anyhow::Result<Vec<UserSettings>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {SETTINGS_COLS} FROM user_settings WHERE TRUE"
        ));
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<UserSettings>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        theme: Theme,
        notifications_enabled: bool,
        sms_enabled: bool,
        email_enabled: bool,
    ) -> anyhow::Result<UserSettings> {
        let row = sqlx::query_as::<_, UserSettings>(&format!(
            r#"
            INSERT INTO user_settings
                (user_id, theme, notifications_enabled, sms_enabled, email_enabled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SETTINGS_COLS}
            "#
        ))
        .bind(user_id)
        .bind(theme)
        .bind(notifications_enabled)
        .bind(sms_enabled)
        .bind(email_enabled)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        theme: Option<Theme>,
        notifications_enabled: Option<bool>,
        sms_enabled: Option<bool>,
        email_enabled: Option<bool>,
    ) -> anyhow::Result<UserSettings> {
        let row = sqlx::query_as::<_, UserSettings>(&format!(
            r#"
            UPDATE user_settings
            SET theme                 = COALESCE($2, theme),
                notifications_enabled = COALESCE($3, notifications_enabled),
                sms_enabled           = COALESCE($4, sms_enabled),
                email_enabled         = COALESCE($5, email_enabled),
                updated_at            = now()
            WHERE id = $1
            RETURNING {SETTINGS_COLS}
            "#
        ))
        .bind(id)
        .bind(theme)
        .bind(notifications_enabled)
        .bind(sms_enabled)
        .bind(email_enabled)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<UserSettings>> {
        let row = sqlx::query_as::<_, UserSettings>(&format!(
            "DELETE FROM user_settings WHERE id = $1 RETURNING {SETTINGS_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
