use std::collections::BTreeMap;

use anyhow::Context;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::dto::TelegramProfile;

type HmacSha256 = Hmac<Sha256>;

/// Split a WebApp init-data blob into key/value pairs.
/// Items are separated by `&`; each item splits on the first `=` only, so
/// values may contain `=` themselves. Items without `=` are dropped.
pub(crate) fn parse_init_data(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter_map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

/// Check the provider signature over an init-data blob.
///
/// The check-string is every pair except `hash`, sorted by key, rendered as
/// `key=value` lines. The signing key is HMAC-SHA256 of the bot token keyed
/// by the literal string `WebAppData`. Malformed input of any kind yields
/// `false`, never an error.
pub fn verify_init_data(raw: &str, bot_token: &str) -> bool {
    // Duplicate keys collapse to the last occurrence, like the provider does.
    let mut params: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in parse_init_data(raw) {
        params.insert(k, v);
    }

    let Some(received_hex) = params.remove("hash") else {
        return false;
    };
    let Ok(received) = hex::decode(received_hex) else {
        return false;
    };

    let check_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let Ok(mut derive) = HmacSha256::new_from_slice(b"WebAppData") else {
        return false;
    };
    derive.update(bot_token.as_bytes());
    let secret = derive.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_slice()) else {
        return false;
    };
    mac.update(check_string.as_bytes());
    // verify_slice compares in constant time
    mac.verify_slice(&received).is_ok()
}

/// Pull the profile out of the `user` field of an init-data blob.
/// Independent of signature verification; callers must only persist the
/// result after `verify_init_data` has accepted the blob.
pub fn extract_profile(raw: &str) -> anyhow::Result<TelegramProfile> {
    let pairs = parse_init_data(raw);
    let user = pairs
        .iter()
        .rev()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .context("init data has no user field")?;

    let decoded = urlencoding::decode(user).context("user field is not valid percent-encoding")?;
    let profile: TelegramProfile =
        serde_json::from_str(&decoded).context("user field is not valid JSON")?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "123456:TEST-TOKEN";

    /// Build a blob signed the same way the provider signs it.
    fn sign_blob(pairs: &[(&str, &str)], bot_token: &str) -> String {
        let mut sorted = pairs.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let check_string = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut derive = HmacSha256::new_from_slice(b"WebAppData").unwrap();
        derive.update(bot_token.as_bytes());
        let secret = derive.finalize().into_bytes();

        let mut mac = HmacSha256::new_from_slice(secret.as_slice()).unwrap();
        mac.update(check_string.as_bytes());
        let hash = hex::encode(mac.finalize().into_bytes());

        let items: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}&hash={}", items.join("&"), hash)
    }

    const USER_ENCODED: &str =
        "%7B%22id%22%3A42%2C%22first_name%22%3A%22Ada%22%2C%22username%22%3A%22ada%22%7D";

    #[test]
    fn accepts_valid_signature() {
        let blob = sign_blob(
            &[
                ("query_id", "AAE7qEYF"),
                ("user", USER_ENCODED),
                ("auth_date", "1700000000"),
            ],
            BOT_TOKEN,
        );
        assert!(verify_init_data(&blob, BOT_TOKEN));
    }

    #[test]
    fn rejects_tampered_signature() {
        let blob = sign_blob(&[("auth_date", "1700000000")], BOT_TOKEN);
        let flipped = if blob.ends_with('0') {
            format!("{}1", &blob[..blob.len() - 1])
        } else {
            format!("{}0", &blob[..blob.len() - 1])
        };
        assert!(!verify_init_data(&flipped, BOT_TOKEN));
    }

    #[test]
    fn rejects_wrong_secret() {
        let blob = sign_blob(&[("auth_date", "1700000000")], BOT_TOKEN);
        assert!(!verify_init_data(&blob, "999999:OTHER-TOKEN"));
    }

    #[test]
    fn rejects_missing_hash() {
        assert!(!verify_init_data("auth_date=1700000000&query_id=AAE", BOT_TOKEN));
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        assert!(!verify_init_data("", BOT_TOKEN));
        assert!(!verify_init_data("no pairs here", BOT_TOKEN));
        assert!(!verify_init_data("hash=zzzz-not-hex", BOT_TOKEN));
    }

    #[test]
    fn splits_on_first_equals_only() {
        let pairs = parse_init_data("a=1&b=x=y&skipme");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x=y".to_string()),
            ]
        );
    }

    #[test]
    fn extracts_profile_from_encoded_user_field() {
        let raw = format!("auth_date=1700000000&user={USER_ENCODED}&hash=deadbeef");
        let profile = extract_profile(&raw).expect("profile parses");
        assert_eq!(profile.id, 42);
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.username.as_deref(), Some("ada"));
        assert_eq!(profile.last_name, None);
        assert_eq!(profile.photo_url, None);
    }

    #[test]
    fn profile_extraction_ignores_signature_validity() {
        // hash is garbage; extraction still succeeds
        let raw = format!("user={USER_ENCODED}&hash=not-a-signature");
        assert!(extract_profile(&raw).is_ok());
        assert!(!verify_init_data(&raw, BOT_TOKEN));
    }

    #[test]
    fn profile_extraction_fails_without_user_field() {
        assert!(extract_profile("auth_date=1700000000&hash=aa").is_err());
    }
}
