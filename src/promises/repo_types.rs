use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Promise record in the database. Only ever mutated by its owner and never
/// hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Promise {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    pub category: String,
    pub is_public: bool,
    pub status: String,
    pub progress: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}
