use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::repo_types::User;
use crate::auth::token::TokenKeys;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the bearer token to the internal id of the calling user.
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Authorization("missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Authorization("invalid auth scheme".into()))?;

        let keys = TokenKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            ApiError::Authorization("invalid or expired token".into())
        })?;

        let user = User::find_by_telegram_id(&state.db, claims.telegram_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        Ok(AuthUser(user.id))
    }
}
