use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;
use tracing::debug;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Claims recovered from a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub telegram_id: i64,
    pub expires_at: i64,
}

/// Signing material for the bearer token: `telegram_id:expiry:signature`,
/// where the signature is hex HMAC-SHA256 of `telegram_id:expiry` keyed by
/// the bot token.
#[derive(Clone)]
pub struct TokenKeys {
    secret: String,
    ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        let telegram = &state.config.telegram;
        Self {
            secret: telegram.bot_token.clone(),
            ttl: Duration::from_secs(telegram.token_ttl_days.max(0) as u64 * 24 * 60 * 60),
        }
    }
}

impl TokenKeys {
    fn signature(&self, payload: &str) -> anyhow::Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .context("bot token unusable as HMAC key")?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn sign(&self, telegram_id: i64) -> anyhow::Result<String> {
        let expires_at = OffsetDateTime::now_utc().unix_timestamp() + self.ttl.as_secs() as i64;
        let payload = format!("{telegram_id}:{expires_at}");
        let signature = self.signature(&payload)?;
        debug!(telegram_id, expires_at, "token signed");
        Ok(format!("{payload}:{signature}"))
    }

    /// Decode a bearer token, re-checking the signature (constant time) and
    /// rejecting expired tokens.
    pub fn verify(&self, token: &str) -> anyhow::Result<TokenClaims> {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 3 {
            anyhow::bail!("malformed token");
        }
        let telegram_id: i64 = parts[0].parse().context("malformed token id")?;
        let expires_at: i64 = parts[1].parse().context("malformed token expiry")?;
        let received = hex::decode(parts[2]).context("malformed token signature")?;

        let payload = format!("{}:{}", parts[0], parts[1]);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .context("bot token unusable as HMAC key")?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&received)
            .map_err(|_| anyhow::anyhow!("invalid token signature"))?;

        if expires_at <= OffsetDateTime::now_utc().unix_timestamp() {
            anyhow::bail!("token expired");
        }

        debug!(telegram_id, "token verified");
        Ok(TokenClaims {
            telegram_id,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> TokenKeys {
        TokenKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let token = keys.sign(987654321).expect("sign");

        let parts: Vec<&str> = token.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "987654321");

        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.telegram_id, 987654321);
        assert!(claims.expires_at > OffsetDateTime::now_utc().unix_timestamp());
    }

    #[tokio::test]
    async fn verify_rejects_tampered_signature() {
        let keys = make_keys();
        let token = keys.sign(42).expect("sign");
        let tampered = if token.ends_with('0') {
            format!("{}1", &token[..token.len() - 1])
        } else {
            format!("{}0", &token[..token.len() - 1])
        };
        assert!(keys.verify(&tampered).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc().unix_timestamp() - 60;
        let payload = format!("42:{past}");
        let signature = keys.signature(&payload).expect("signature");
        let err = keys.verify(&format!("{payload}:{signature}")).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_shape() {
        let keys = make_keys();
        assert!(keys.verify("").is_err());
        assert!(keys.verify("42").is_err());
        assert!(keys.verify("42:123456").is_err());
        assert!(keys.verify("not-a-number:1:aa").is_err());
    }
}
