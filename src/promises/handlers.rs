use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    promises::repo::{NewPromise, PromisePatch},
    promises::repo_types::Promise,
    state::AppState,
};

use super::dto::{CreatePromiseRequest, UpdatePromiseRequest};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/promises",
        get(list_promises).post(create_promise).put(update_promise),
    )
}

#[instrument(skip(state))]
pub async fn list_promises(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Promise>>, ApiError> {
    let promises = Promise::list_by_user(&state.db, user_id).await?;
    Ok(Json(promises))
}

#[instrument(skip(state, payload))]
pub async fn create_promise(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePromiseRequest>,
) -> Result<(StatusCode, Json<Promise>), ApiError> {
    let title = payload.title.as_deref().unwrap_or("").trim().to_string();
    let deadline = match payload.deadline {
        Some(d) if !title.is_empty() => d,
        _ => {
            warn!(user_id, "create rejected: missing title or deadline");
            return Err(ApiError::validation("title and deadline are required"));
        }
    };

    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let new = NewPromise {
        title,
        description,
        deadline,
        category: payload.category.unwrap_or_else(|| "personal".into()),
        is_public: payload.is_public.unwrap_or(true),
    };

    let promise = Promise::create(&state.db, user_id, new).await?;
    info!(user_id, promise_id = promise.id, "promise created");
    Ok((StatusCode::CREATED, Json(promise)))
}

#[instrument(skip(state, payload))]
pub async fn update_promise(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdatePromiseRequest>,
) -> Result<Json<Promise>, ApiError> {
    let Some(id) = payload.id else {
        warn!(user_id, "update rejected: missing promise id");
        return Err(ApiError::validation("promise id is required"));
    };

    if let Some(progress) = payload.progress {
        if !(0..=100).contains(&progress) {
            warn!(user_id, promise_id = id, progress, "update rejected: progress out of range");
            return Err(ApiError::validation("progress must be between 0 and 100"));
        }
    }

    let patch = PromisePatch {
        status: payload.status,
        progress: payload.progress,
    };
    let completing = patch.completing();

    let promise = Promise::update(&state.db, user_id, id, patch)
        .await?
        .ok_or_else(|| {
            warn!(user_id, promise_id = id, "update target missing or not owned");
            ApiError::not_found("promise not found")
        })?;

    info!(user_id, promise_id = id, completing, "promise updated");
    Ok(Json(promise))
}
