use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthRequest, AuthResponse, PublicUser},
        repo_types::User,
        services,
        token::TokenKeys,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth", post(authenticate))
}

/// Verify a WebApp init-data blob, upsert the user and issue a bearer token.
#[instrument(skip(state, payload))]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let init_data = match payload.init_data.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!("auth request without initData");
            return Err(ApiError::validation("initData is required"));
        }
    };

    // Extraction is independent of verification; the profile is only
    // persisted once the signature has been accepted.
    let profile = services::extract_profile(init_data).map_err(|e| {
        warn!(error = %e, "init data user field rejected");
        ApiError::validation("malformed user payload")
    })?;

    if !services::verify_init_data(init_data, &state.config.telegram.bot_token) {
        warn!(telegram_id = profile.id, "init data signature rejected");
        return Err(ApiError::Authentication("invalid telegram data".into()));
    }

    let user = User::upsert(&state.db, &profile).await?;

    let keys = TokenKeys::from_ref(&state);
    let token = keys.sign(user.telegram_id)?;

    info!(user_id = user.id, telegram_id = user.telegram_id, "user authenticated");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: PublicUser::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_serialization() {
        let response = AuthResponse {
            success: true,
            token: "1:2:abc".into(),
            user: PublicUser {
                id: 1,
                telegram_id: 42,
                username: Some("ada".into()),
                first_name: None,
                last_name: None,
                photo_url: None,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "1:2:abc");
        assert_eq!(json["user"]["telegram_id"], 42);
        assert_eq!(json["user"]["first_name"], serde_json::Value::Null);
    }

    #[test]
    fn auth_request_accepts_missing_init_data() {
        let req: AuthRequest = serde_json::from_str("{}").unwrap();
        assert!(req.init_data.is_none());

        let req: AuthRequest = serde_json::from_str(r#"{"initData":"a=1"}"#).unwrap();
        assert_eq!(req.init_data.as_deref(), Some("a=1"));
    }
}
