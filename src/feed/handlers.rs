use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

use super::dto::{ActivityItem, FeedQuery, FeedResponse};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new().route("/feed", get(list_feed))
}

/// Public activity feed; no authentication.
#[instrument(skip(state))]
pub async fn list_feed(
    State(state): State<AppState>,
    Query(q): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let rows = repo::list_public(&state.db, q.limit, q.offset).await?;
    let activities: Vec<ActivityItem> = rows.into_iter().map(Into::into).collect();
    Ok(Json(FeedResponse {
        count: activities.len(),
        activities,
        limit: q.limit,
        offset: q.offset,
    }))
}
