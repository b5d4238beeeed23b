use anyhow::Context;
use sqlx::PgPool;

use crate::auth::dto::TelegramProfile;
use crate::auth::repo_types::User;

impl User {
    /// Insert or refresh a user keyed by telegram id. Display fields are
    /// overwritten on every successful authentication.
    pub async fn upsert(db: &PgPool, profile: &TelegramProfile) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, photo_url, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (telegram_id)
            DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                photo_url = EXCLUDED.photo_url,
                updated_at = NOW()
            RETURNING id, telegram_id, username, first_name, last_name, photo_url,
                      created_at, updated_at
            "#,
        )
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.photo_url)
        .fetch_one(db)
        .await
        .context("upsert user")?;
        Ok(user)
    }

    /// Find a user by telegram id.
    pub async fn find_by_telegram_id(db: &PgPool, telegram_id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, telegram_id, username, first_name, last_name, photo_url,
                   created_at, updated_at
            FROM users
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(db)
        .await
        .context("find user by telegram id")?;
        Ok(user)
    }
}
