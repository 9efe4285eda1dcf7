//! Session tokens and service-key authentication.

mod extractor;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub use extractor::AuthContext;

use crate::error::{AppError, AppResult};
use crate::models::ActorRole;

const SESSION_ISSUER: &str = "feridesk";
const SESSION_PURPOSE: &str = "session";

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub iss: String,
    /// `CLIENT` or `ADMIN`.
    pub role: String,
    /// Always "session"; a magic-link token never passes as a session.
    pub purpose: String,
    pub exp: usize,
    pub iat: usize,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct SessionService {
    secret: SecretString,
}

impl SessionService {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Issue a session token for a user.
    pub fn issue(&self, user_id: Uuid, role: ActorRole, ttl_secs: u64) -> AppResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(ttl_secs as i64);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            iss: SESSION_ISSUER.to_string(),
            role: role.as_str().to_string(),
            purpose: SESSION_PURPOSE.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AppError::Validation(format!("Failed to create session token: {}", e)))
    }

    /// Verify a session token, returning the authenticated user and role.
    pub fn verify(&self, token: &str) -> AppResult<(Uuid, ActorRole)> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.validate_aud = false;

        let data = decode::<SessionClaims>(token, &key, &validation)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        if data.claims.purpose != SESSION_PURPOSE {
            return Err(AppError::Unauthorized(
                "Invalid or expired session".to_string(),
            ));
        }

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;
        let role = ActorRole::parse(&data.claims.role)
            .filter(|r| *r != ActorRole::System)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok((user_id, role))
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionService([REDACTED])")
    }
}

/// Shared key granting SYSTEM-role access to back-office scripts.
/// Uses `SecretString` so the key never reaches logs and is zeroized on
/// drop; `Debug` prints `[REDACTED]`.
#[derive(Clone)]
pub struct ServiceKey(Option<SecretString>);

impl ServiceKey {
    pub fn new(key: Option<SecretString>) -> Self {
        Self(key)
    }

    /// Compare a provided key against the configured one.
    ///
    /// `subtle::ConstantTimeEq` compares every byte regardless of where the
    /// inputs first differ, so response timing leaks neither a prefix match
    /// nor the key length.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => secret
                .expose_secret()
                .as_bytes()
                .ct_eq(provided.as_bytes())
                .into(),
            None => false,
        }
    }
}

impl std::fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "ServiceKey([REDACTED])"),
            None => write!(f, "ServiceKey(None)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SessionService {
        SessionService::new(SecretString::from("test-session-secret".to_string()))
    }

    #[test]
    fn test_session_round_trip() {
        let svc = service();
        let user_id = Uuid::now_v7();

        let token = svc.issue(user_id, ActorRole::Client, 3600).unwrap();
        let (verified_id, role) = svc.verify(&token).unwrap();

        assert_eq!(verified_id, user_id);
        assert_eq!(role, ActorRole::Client);
    }

    #[test]
    fn test_session_rejects_wrong_secret() {
        let token = service().issue(Uuid::now_v7(), ActorRole::Admin, 3600).unwrap();
        let other = SessionService::new(SecretString::from("another-secret".to_string()));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_session_never_grants_system_role() {
        // SYSTEM comes only from the service key; a forged token claiming
        // it must not verify.
        let svc = service();
        let token = svc.issue(Uuid::now_v7(), ActorRole::System, 3600).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn test_service_key_verify() {
        let key = ServiceKey::new(Some(SecretString::from("svc-key".to_string())));
        assert!(key.verify("svc-key"));
        assert!(!key.verify("svc-keX"));
        assert!(!key.verify("svc-key-longer"));

        let unset = ServiceKey::new(None);
        assert!(!unset.verify("anything"));
    }

    #[test]
    fn test_service_key_debug_redacted() {
        let key = ServiceKey::new(Some(SecretString::from("svc-key".to_string())));
        assert_eq!(format!("{:?}", key), "ServiceKey([REDACTED])");
    }
}
