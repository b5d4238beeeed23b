use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// One joined row of the public feed query.
#[derive(Debug, FromRow)]
pub struct FeedRow {
    pub id: i64,
    pub activity_type: String,
    pub created_at: OffsetDateTime,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub promise_id: Option<i64>,
    pub promise_title: Option<String>,
    pub promise_category: Option<String>,
}

/// Public activity, newest first. Entries whose promise is private are
/// suppressed; entries without a promise are always visible.
pub async fn list_public(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<FeedRow>> {
    let rows = sqlx::query_as::<_, FeedRow>(
        r#"
        SELECT af.id,
               af.activity_type,
               af.created_at,
               u.id AS user_id,
               u.first_name,
               u.last_name,
               u.username,
               u.photo_url,
               p.id AS promise_id,
               p.title AS promise_title,
               p.category AS promise_category
        FROM activity_feed af
        JOIN users u ON u.id = af.user_id
        LEFT JOIN promises p ON p.id = af.promise_id
        WHERE p.is_public = TRUE OR p.id IS NULL
        ORDER BY af.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list public feed")?;
    Ok(rows)
}
