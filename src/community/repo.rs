use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: i64,
    pub author_id: Option<i64>,
    pub author_name: String,
    pub content: String,
    pub category: String,
    pub is_anonymous: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostLike {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub comment_text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl LikeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Unliked => "unliked",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub search: Option<String>,
    pub author_id: Option<i64>,
    pub category: Option<String>,
}

const POST_COLS: &str = "id, author_id, author_name, content, category, is_anonymous, \
     likes_count, comments_count, created_at, updated_at";
const LIKE_COLS: &str = "id, post_id, user_id, created_at";
const COMMENT_COLS: &str = "id, post_id, user_id, comment_text, created_at";

fn push_post_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (content LIKE ")
            .push_bind(pattern.clone())
            .push(" OR author_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND author_id = ").push_bind(author_id);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
}

impl CommunityPost {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<CommunityPost>> {
        let row = sqlx::query_as::<_, CommunityPost>(&format!(
            "SELECT {POST_COLS} FROM community_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM community_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list(
        db: &PgPool,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<CommunityPost>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {POST_COLS} FROM community_posts WHERE TRUE"
        ));
        push_post_filters(&mut qb, filter);
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<CommunityPost>().fetch_all(db).await?;
        Ok(rows)
    }

    /// Feed page, newest first, plus the total count under the same filters.
    pub async fn feed(
        db: &PgPool,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<CommunityPost>, i64)> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {POST_COLS} FROM community_posts WHERE TRUE"
        ));
        push_post_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let posts = qb.build_query_as::<CommunityPost>().fetch_all(db).await?;

        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT count(*) FROM community_posts WHERE TRUE");
        push_post_filters(&mut count_qb, filter);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(db).await?;

        Ok((posts, total))
    }

    pub async fn create(
        db: &PgPool,
        author_id: Option<i64>,
        author_name: &str,
        content: &str,
        category: &str,
        is_anonymous: bool,
    ) -> anyhow::Result<CommunityPost> {
        let row = sqlx::query_as::<_, CommunityPost>(&format!(
            r#"
            INSERT INTO community_posts (author_id, author_name, content, category, is_anonymous)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLS}
            "#
        ))
        .bind(author_id)
        .bind(author_name)
        .bind(content)
        .bind(category)
        .bind(is_anonymous)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        content: Option<&str>,
        category: Option<&str>,
        likes_count: Option<i32>,
        comments_count: Option<i32>,
    ) -> anyhow::Result<CommunityPost> {
        let row = sqlx::query_as::<_, CommunityPost>(&format!(
            r#"
            UPDATE community_posts
            SET content        = COALESCE($2, content),
                category       = COALESCE($3, category),
                likes_count    = COALESCE($4, likes_count),
                comments_count = COALESCE($5, comments_count),
                updated_at     = now()
            WHERE id = $1
            RETURNING {POST_COLS}
            "#
        ))
        .bind(id)
        .bind(content)
        .bind(category)
        .bind(likes_count)
        .bind(comments_count)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Likes and comments go with the post via ON DELETE CASCADE.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<CommunityPost>> {
        let row = sqlx::query_as::<_, CommunityPost>(&format!(
            "DELETE FROM community_posts WHERE id = $1 RETURNING {POST_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

/// Toggle the (post, user) like pair and keep likes_count in step, all in
/// one transaction. The unique constraint on post_likes means a concurrent
/// duplicate becomes a conflict, never a second row.
pub async fn toggle_like(
    db: &PgPool,
    post_id: i64,
    user_id: i64,
) -> anyhow::Result<(LikeAction, i32)> {
    let mut tx = db.begin().await?;

    let deleted: Option<(i64,)> = sqlx::query_as(
        "DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (action, likes) = if deleted.is_some() {
        let (likes,): (i32,) = sqlx::query_as(
            r#"
            UPDATE community_posts
            SET likes_count = GREATEST(likes_count - 1, 0), updated_at = now()
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;
        (LikeAction::Unliked, likes)
    } else {
        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (likes,): (i32,) = if inserted.is_some() {
            sqlx::query_as(
                r#"
                UPDATE community_posts
                SET likes_count = likes_count + 1, updated_at = now()
                WHERE id = $1
                RETURNING likes_count
                "#,
            )
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            // lost the race to a concurrent like; the pair already exists
            sqlx::query_as("SELECT likes_count FROM community_posts WHERE id = $1")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?
        };
        (LikeAction::Liked, likes)
    };

    tx.commit().await?;
    Ok((action, likes))
}

impl PostLike {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<PostLike>> {
        let row = sqlx::query_as::<_, PostLike>(&format!(
            "SELECT {LIKE_COLS} FROM post_likes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        post_id: Option<i64>,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostLike>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {LIKE_COLS} FROM post_likes WHERE TRUE"
        ));
        if let Some(pid) = post_id {
            qb.push(" AND post_id = ").push_bind(pid);
        }
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<PostLike>().fetch_all(db).await?;
        Ok(rows)
    }

    /// Returns None when the pair already exists. Increments likes_count in
    /// the same transaction as the insert.
    pub async fn create(db: &PgPool, post_id: i64, user_id: i64) -> anyhow::Result<Option<PostLike>> {
        let mut tx = db.begin().await?;
        let row: Option<PostLike> = sqlx::query_as(&format!(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING {LIKE_COLS}
            "#
        ))
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if row.is_some() {
            sqlx::query(
                r#"
                UPDATE community_posts
                SET likes_count = likes_count + 1, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    /// Deleting a like row decrements the parent counter, clamped at zero.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<PostLike>> {
        let mut tx = db.begin().await?;
        let row: Option<PostLike> = sqlx::query_as(&format!(
            "DELETE FROM post_likes WHERE id = $1 RETURNING {LIKE_COLS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(like) = &row {
            sqlx::query(
                r#"
                UPDATE community_posts
                SET likes_count = GREATEST(likes_count - 1, 0), updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(like.post_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row)
    }
}

impl PostComment {
    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<PostComment>> {
        let row = sqlx::query_as::<_, PostComment>(&format!(
            "SELECT {COMMENT_COLS} FROM post_comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        post_id: Option<i64>,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostComment>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMENT_COLS} FROM post_comments WHERE TRUE"
        ));
        if let Some(pid) = post_id {
            qb.push(" AND post_id = ").push_bind(pid);
        }
        if let Some(uid) = user_id {
            qb.push(" AND user_id = ").push_bind(uid);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<PostComment>().fetch_all(db).await?;
        Ok(rows)
    }

    /// Insert plus comments_count increment as one unit.
    pub async fn create(
        db: &PgPool,
        post_id: i64,
        user_id: i64,
        comment_text: &str,
    ) -> anyhow::Result<PostComment> {
        let mut tx = db.begin().await?;
        let row = sqlx::query_as::<_, PostComment>(&format!(
            r#"
            INSERT INTO post_comments (post_id, user_id, comment_text)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLS}
            "#
        ))
        .bind(post_id)
        .bind(user_id)
        .bind(comment_text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE community_posts
            SET comments_count = comments_count + 1, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: i64, comment_text: &str) -> anyhow::Result<PostComment> {
        let row = sqlx::query_as::<_, PostComment>(&format!(
            r#"
            UPDATE post_comments
            SET comment_text = $2
            WHERE id = $1
            RETURNING {COMMENT_COLS}
            "#
        ))
        .bind(id)
        .bind(comment_text)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Delete plus comments_count decrement (clamped) as one unit.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<PostComment>> {
        let mut tx = db.begin().await?;
        let row: Option<PostComment> = sqlx::query_as(&format!(
            "DELETE FROM post_comments WHERE id = $1 RETURNING {COMMENT_COLS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(comment) = &row {
            sqlx::query(
                r#"
                UPDATE community_posts
                SET comments_count = GREATEST(comments_count - 1, 0), updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row)
    }
}
