//! Bearer token signing and verification
//!
//! # Token format
//!
//! ```text
//! v1.<user id>.<expires, unix seconds>.<signature>
//! ```
//!
//! The signature is base64url (no padding) of HMAC-SHA256 over
//! `"<user id>.<expires>"` keyed with the service token secret. The secret
//! comes from configuration or, when none is configured, from the
//! `settings` table where it is generated on first start.
//!
//! This module contains only pure functions and database operations. HTTP
//! extractors live in the API crate.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::settings;
use crate::{time, Result};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_VERSION: &str = "v1";
pub const TOKEN_SECRET_KEY: &str = "token_secret";

/// Lifetime of tokens issued by [`issue_token`]
pub fn default_token_ttl() -> Duration {
    Duration::days(7)
}

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not four dot-separated parts, or a part does not parse
    Malformed,
    /// Version prefix other than `v1`
    UnsupportedVersion(String),
    /// Signature does not match the payload
    BadSignature,
    /// Signature is valid but the expiry has passed
    Expired { expired_at: i64 },
    /// Secret unusable as an HMAC key
    InvalidKey,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::UnsupportedVersion(v) => write!(f, "Unsupported token version '{}'", v),
            TokenError::BadSignature => write!(f, "Invalid token signature"),
            TokenError::Expired { expired_at } => write!(f, "Token expired at {}", expired_at),
            TokenError::InvalidKey => write!(f, "Token secret cannot be used as a key"),
        }
    }
}

impl std::error::Error for TokenError {}

fn mac_for(secret: &str, user_id: Uuid, expires: i64) -> std::result::Result<HmacSha256, TokenError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(format!("{}.{}", user_id, expires).as_bytes());
    Ok(mac)
}

/// Signature part of a token for `user_id` expiring at `expires`
pub fn sign(secret: &str, user_id: Uuid, expires: i64) -> std::result::Result<String, TokenError> {
    let mac = mac_for(secret, user_id, expires)?;
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Issue a token valid for `ttl` from `now`
pub fn issue_token_at(
    secret: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
    ttl: Duration,
) -> std::result::Result<String, TokenError> {
    let expires = time::expiry_after(now, ttl);
    let signature = sign(secret, user_id, expires)?;
    Ok(format!("{}.{}.{}.{}", TOKEN_VERSION, user_id, expires, signature))
}

/// Issue a token with the default lifetime
pub fn issue_token(secret: &str, user_id: Uuid) -> std::result::Result<String, TokenError> {
    issue_token_at(secret, user_id, time::now(), default_token_ttl())
}

/// Verify a token and return the user id it was issued for
///
/// The signature is checked in constant time before the expiry so that an
/// expired token is only reported as such when it is otherwise genuine.
pub fn verify_token(
    secret: &str,
    token: &str,
    now: DateTime<Utc>,
) -> std::result::Result<Uuid, TokenError> {
    let mut parts = token.trim().split('.');
    let (version, user_id, expires, signature) =
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(v), Some(u), Some(e), Some(s), None) => (v, u, e, s),
            _ => return Err(TokenError::Malformed),
        };

    if version != TOKEN_VERSION {
        return Err(TokenError::UnsupportedVersion(version.to_string()));
    }

    let user_id = Uuid::parse_str(user_id).map_err(|_| TokenError::Malformed)?;
    let expires: i64 = expires.parse().map_err(|_| TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    mac_for(secret, user_id, expires)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    if expires <= now.timestamp() {
        return Err(TokenError::Expired { expired_at: expires });
    }

    Ok(user_id)
}

/// Load the token secret from settings, generating one if absent
pub async fn load_token_secret(db: &SqlitePool) -> Result<String> {
    match settings::get_setting::<String>(db, TOKEN_SECRET_KEY).await? {
        Some(secret) if !secret.trim().is_empty() => Ok(secret),
        _ => initialize_token_secret(db).await,
    }
}

/// Generate a random 256-bit secret and store it in settings
pub async fn initialize_token_secret(db: &SqlitePool) -> Result<String> {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret = URL_SAFE_NO_PAD.encode(bytes);

    settings::set_setting(db, TOKEN_SECRET_KEY, &secret).await?;
    tracing::info!("Generated new token secret");

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let user = Uuid::new_v4();
        let token = issue_token_at(SECRET, user, at(1_700_000_000), Duration::hours(1)).unwrap();
        assert!(token.starts_with("v1."));
        assert_eq!(verify_token(SECRET, &token, at(1_700_000_100)), Ok(user));
    }

    #[test]
    fn test_expired_token() {
        let user = Uuid::new_v4();
        let token = issue_token_at(SECRET, user, at(1_700_000_000), Duration::hours(1)).unwrap();
        assert_eq!(
            verify_token(SECRET, &token, at(1_700_003_600)),
            Err(TokenError::Expired {
                expired_at: 1_700_003_600
            })
        );
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let user = Uuid::new_v4();
        let token = issue_token_at(SECRET, user, at(1_700_000_000), Duration::hours(1)).unwrap();
        assert_eq!(
            verify_token("other-secret", &token, at(1_700_000_100)),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_user_id_is_bad_signature() {
        let user = Uuid::new_v4();
        let token = issue_token_at(SECRET, user, at(1_700_000_000), Duration::hours(1)).unwrap();
        let forged = token.replacen(&user.to_string(), &Uuid::new_v4().to_string(), 1);
        assert_eq!(
            verify_token(SECRET, &forged, at(1_700_000_100)),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let now = at(1_700_000_000);
        assert_eq!(verify_token(SECRET, "", now), Err(TokenError::Malformed));
        assert_eq!(verify_token(SECRET, "v1.abc", now), Err(TokenError::Malformed));
        assert_eq!(
            verify_token(SECRET, &format!("v1.{}.soon.sig", Uuid::new_v4()), now),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            verify_token(SECRET, "v1.a.b.c.d", now),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_unsupported_version() {
        let token = format!("v2.{}.1.sig", Uuid::new_v4());
        assert_eq!(
            verify_token(SECRET, &token, at(0)),
            Err(TokenError::UnsupportedVersion("v2".to_string()))
        );
    }
}
