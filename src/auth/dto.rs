use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Request body for WebApp authentication.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(rename = "initData")]
    pub init_data: Option<String>,
}

/// Profile fields carried in the `user` field of the signed init data.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramProfile {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            telegram_id: u.telegram_id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            photo_url: u.photo_url,
        }
    }
}

/// Response returned after successful authentication.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}
