use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::activity;
use crate::promises::repo_types::Promise;

/// Validated input for a new promise.
#[derive(Debug)]
pub struct NewPromise {
    pub title: String,
    pub description: Option<String>,
    pub deadline: OffsetDateTime,
    pub category: String,
    pub is_public: bool,
}

/// Field-wise update command for a promise; `None` keeps the stored value.
/// Translated to a single parameterized statement, never assembled SQL.
#[derive(Debug)]
pub struct PromisePatch {
    pub status: Option<String>,
    pub progress: Option<i32>,
}

impl PromisePatch {
    /// Setting status to `completed` is the privileged completion
    /// transition: it pins progress to 100 and stamps `completed_at`,
    /// overriding any progress supplied in the same patch.
    pub fn completing(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }

    pub fn effective_progress(&self) -> Option<i32> {
        if self.completing() {
            Some(100)
        } else {
            self.progress
        }
    }
}

impl Promise {
    /// All promises owned by a user, newest first.
    pub async fn list_by_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<Promise>> {
        let rows = sqlx::query_as::<_, Promise>(
            r#"
            SELECT id, user_id, title, description, deadline, category, is_public,
                   status, progress, created_at, updated_at, completed_at
            FROM promises
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list promises")?;
        Ok(rows)
    }

    /// Insert a promise, its `created` activity entry and the
    /// `first_promise` unlock attempt as one atomic unit.
    pub async fn create(db: &PgPool, user_id: i64, new: NewPromise) -> anyhow::Result<Promise> {
        let mut tx = db.begin().await.context("begin create transaction")?;

        let promise = sqlx::query_as::<_, Promise>(
            r#"
            INSERT INTO promises (user_id, title, description, deadline, category, is_public)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, description, deadline, category, is_public,
                      status, progress, created_at, updated_at, completed_at
            "#,
        )
        .bind(user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.deadline)
        .bind(&new.category)
        .bind(new.is_public)
        .fetch_one(&mut *tx)
        .await
        .context("insert promise")?;

        activity::repo::insert_activity_tx(&mut tx, user_id, Some(promise.id), "created").await?;
        activity::repo::unlock_achievement_tx(&mut tx, user_id, "first_promise").await?;

        tx.commit().await.context("commit create transaction")?;
        Ok(promise)
    }

    /// Apply a patch to an owned promise. Ownership is enforced in the WHERE
    /// clause; zero affected rows rolls back and returns `None`. Completion
    /// appends a `completed` activity entry and attempts the
    /// `first_complete` unlock inside the same transaction.
    pub async fn update(
        db: &PgPool,
        user_id: i64,
        id: i64,
        patch: PromisePatch,
    ) -> anyhow::Result<Option<Promise>> {
        let mut tx = db.begin().await.context("begin update transaction")?;

        let updated = sqlx::query_as::<_, Promise>(
            r#"
            UPDATE promises
            SET status = COALESCE($3, status),
                progress = COALESCE($4, progress),
                completed_at = CASE WHEN $5 THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, deadline, category, is_public,
                      status, progress, created_at, updated_at, completed_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.status)
        .bind(patch.effective_progress())
        .bind(patch.completing())
        .fetch_optional(&mut *tx)
        .await
        .context("update promise")?;

        let Some(promise) = updated else {
            tx.rollback().await.context("rollback update transaction")?;
            return Ok(None);
        };

        if patch.completing() {
            activity::repo::insert_activity_tx(&mut tx, user_id, Some(promise.id), "completed")
                .await?;
            activity::repo::unlock_achievement_tx(&mut tx, user_id, "first_complete").await?;
        }

        tx.commit().await.context("commit update transaction")?;
        Ok(Some(promise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_forces_progress_to_100() {
        let patch = PromisePatch {
            status: Some("completed".into()),
            progress: Some(40),
        };
        assert!(patch.completing());
        assert_eq!(patch.effective_progress(), Some(100));
    }

    #[test]
    fn completion_without_progress_still_pins_100() {
        let patch = PromisePatch {
            status: Some("completed".into()),
            progress: None,
        };
        assert_eq!(patch.effective_progress(), Some(100));
    }

    #[test]
    fn plain_progress_update_passes_through() {
        let patch = PromisePatch {
            status: None,
            progress: Some(40),
        };
        assert!(!patch.completing());
        assert_eq!(patch.effective_progress(), Some(40));
    }

    #[test]
    fn other_statuses_are_not_completion() {
        let patch = PromisePatch {
            status: Some("failed".into()),
            progress: None,
        };
        assert!(!patch.completing());
        assert_eq!(patch.effective_progress(), None);
    }
}
