//! Magic link tokens for deep links in notification emails.
//!
//! A magic link embeds a short-lived HS256 token that authenticates the
//! recipient and redirects them to a target path (an invoice page, a
//! request detail page). Tokens carry a distinct `purpose` claim so a
//! session token can never be replayed as a magic link or vice versa.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MAGIC_ISSUER: &str = "feridesk";
const MAGIC_PURPOSE: &str = "magic";

/// Claims carried by a magic link token.
#[derive(Debug, Serialize, Deserialize)]
pub struct MagicClaims {
    /// User id the link authenticates.
    pub sub: String,
    pub iss: String,
    /// Always "magic"; rejected otherwise.
    pub purpose: String,
    /// Path to redirect to after verification.
    pub path: String,
    /// Random token id.
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

/// Issues and verifies magic link tokens.
#[derive(Clone)]
pub struct MagicLinkService {
    secret: SecretString,
    base_url: String,
    ttl_secs: u64,
}

impl MagicLinkService {
    pub fn new(secret: SecretString, base_url: String, ttl_secs: u64) -> Self {
        Self {
            secret,
            base_url,
            ttl_secs,
        }
    }

    /// Issue a magic token for `user_id` redirecting to `redirect_path`.
    pub fn issue(&self, user_id: Uuid, redirect_path: &str) -> AppResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_secs as i64);

        let claims = MagicClaims {
            sub: user_id.to_string(),
            iss: MAGIC_ISSUER.to_string(),
            purpose: MAGIC_PURPOSE.to_string(),
            path: redirect_path.to_string(),
            jti: generate_token_id(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AppError::Validation(format!("Failed to create magic token: {}", e)))
    }

    /// Build the full clickable URL embedding a freshly issued token.
    pub fn link_for(&self, user_id: Uuid, redirect_path: &str) -> AppResult<String> {
        let token = self.issue(user_id, redirect_path)?;
        Ok(format!(
            "{}/api/v1/auth/magic?token={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&token)
        ))
    }

    /// Verify a magic token and return its claims.
    pub fn verify(&self, token: &str) -> AppResult<MagicClaims> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[MAGIC_ISSUER]);
        validation.validate_aud = false;

        let token_data = decode::<MagicClaims>(token, &key, &validation)
            .map_err(|_| AppError::Unauthorized("Invalid or expired magic link".to_string()))?;

        if token_data.claims.purpose != MAGIC_PURPOSE {
            return Err(AppError::Unauthorized(
                "Invalid or expired magic link".to_string(),
            ));
        }

        Ok(token_data.claims)
    }
}

/// Generate a cryptographically random token id.
fn generate_token_id() -> String {
    let random_bytes: [u8; 16] = rand::random();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MagicLinkService {
        MagicLinkService::new(
            SecretString::from("test-secret-key".to_string()),
            "https://feri.example.com".to_string(),
            900,
        )
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let svc = service();
        let user_id = Uuid::now_v7();

        let token = svc.issue(user_id, "/requests/abc/invoice").unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.path, "/requests/abc/invoice");
        assert_eq!(claims.purpose, "magic");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let svc = service();
        let token = svc.issue(Uuid::now_v7(), "/requests").unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(svc.verify(&tampered).is_err());
    }

    #[test]
    fn test_wrong_purpose_rejected() {
        let svc = service();

        // Same secret and issuer, different purpose: must not pass as a
        // magic link.
        let now = chrono::Utc::now();
        let claims = MagicClaims {
            sub: Uuid::now_v7().to_string(),
            iss: MAGIC_ISSUER.to_string(),
            purpose: "session".to_string(),
            path: "/".to_string(),
            jti: generate_token_id(),
            exp: (now + chrono::Duration::seconds(900)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let key = EncodingKey::from_secret("test-secret-key".as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn test_link_for_embeds_token() {
        let svc = service();
        let link = svc.link_for(Uuid::now_v7(), "/invoices/42").unwrap();

        assert!(link.starts_with("https://feri.example.com/api/v1/auth/magic?token="));
        // Tokens are URL safe after encoding; no raw dots should be left
        // un-encoded only if encoding touched them, so just check the
        // verify path accepts the embedded token.
        let token = link.split("token=").nth(1).unwrap();
        let decoded = urlencoding::decode(token).unwrap();
        assert!(svc.verify(&decoded).is_ok());
    }
}
