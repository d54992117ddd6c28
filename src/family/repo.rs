use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: i64,
    pub family_group_id: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

const MEMBER_COLS: &str = "id, family_group_id, user_id, joined_at";

impl FamilyMember {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<FamilyMember>> {
        let row = sqlx::query_as::<_, FamilyMember>(&format!(
            "SELECT {MEMBER_COLS} FROM family_members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        family_group_id: Option<&str>,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<FamilyMember>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {MEMBER_COLS} FROM family_members WHERE TRUE"
        ));
        if let Some(gid) = family_group_id {
            qb.push(" AND family_group_id = ").push_bind(gid.to_string());
        }
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<FamilyMember>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn all_in_group(db: &PgPool, family_group_id: &str) -> anyhow::Result<Vec<FamilyMember>> {
        let rows = sqlx::query_as::<_, FamilyMember>(&format!(
            "SELECT {MEMBER_COLS} FROM family_members WHERE family_group_id = $1 ORDER BY id"
        ))
        .bind(family_group_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        family_group_id: &str,
        user_id: i64,
    ) -> anyhow::Result<FamilyMember> {
        let row = sqlx::query_as::<_, FamilyMember>(&format!(
            r#"
            INSERT INTO family_members (family_group_id, user_id)
            VALUES ($1, $2)
            RETURNING {MEMBER_COLS}
            "#
        ))
        .bind(family_group_id)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        family_group_id: Option<&str>,
    ) -> anyhow::Result<FamilyMember> {
        let row = sqlx::query_as::<_, FamilyMember>(&format!(
            r#"
            UPDATE family_members
            SET family_group_id = COALESCE($2, family_group_id)
            WHERE id = $1
            RETURNING {MEMBER_COLS}
            "#
        ))
        .bind(id)
        .bind(family_group_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<FamilyMember>> {
        let row = sqlx::query_as::<_, FamilyMember>(&format!(
            "DELETE FROM family_members WHERE id = $1 RETURNING {MEMBER_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
