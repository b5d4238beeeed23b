use anyhow::Context;
use sqlx::{Postgres, Transaction};

/// Append one activity feed entry within the caller's transaction.
/// `promise_id` is optional so non-promise activity types stay representable.
pub async fn insert_activity_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    promise_id: Option<i64>,
    activity_type: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO activity_feed (user_id, promise_id, activity_type)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(promise_id)
    .bind(activity_type)
    .execute(&mut **tx)
    .await
    .context("insert activity")?;

    Ok(())
}

/// Unlock an achievement by catalog key, at most once per user.
/// Unknown keys and already-unlocked pairs are silent no-ops.
pub async fn unlock_achievement_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    key: &str,
) -> anyhow::Result<()> {
    let achievement_id: Option<i64> =
        sqlx::query_scalar(r#"SELECT id FROM achievements WHERE key = $1"#)
            .bind(key)
            .fetch_optional(&mut **tx)
            .await
            .context("look up achievement")?;

    let Some(achievement_id) = achievement_id else {
        return Ok(());
    };

    sqlx::query(
        r#"
        INSERT INTO user_achievements (user_id, achievement_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, achievement_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(achievement_id)
    .execute(&mut **tx)
    .await
    .context("unlock achievement")?;

    Ok(())
}
