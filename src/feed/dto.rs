use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::FeedRow;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Actor shown next to a feed entry.
#[derive(Debug, Serialize)]
pub struct ActivityUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

/// Referenced promise, present unless the activity has no promise attached.
#[derive(Debug, Serialize)]
pub struct ActivityPromise {
    pub id: i64,
    pub title: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: ActivityUser,
    pub promise: Option<ActivityPromise>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub activities: Vec<ActivityItem>,
    pub limit: i64,
    pub offset: i64,
    pub count: usize,
}

impl From<FeedRow> for ActivityItem {
    fn from(row: FeedRow) -> Self {
        let promise = row.promise_id.map(|id| ActivityPromise {
            id,
            title: row.promise_title.unwrap_or_default(),
            category: row.promise_category.unwrap_or_default(),
        });
        Self {
            id: row.id,
            activity_type: row.activity_type,
            created_at: row.created_at,
            user: ActivityUser {
                id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                username: row.username,
                photo_url: row.photo_url,
            },
            promise,
        }
    }
}
