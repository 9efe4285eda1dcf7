//! Actix-web extractor resolving who is calling.
//!
//! Two credentials are accepted: an `Authorization: Bearer` session token
//! (clients and admins) and the `X-Service-Key` header (automated
//! back-office callers, granted the SYSTEM role). The service key wins when
//! both are present.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use uuid::Uuid;

use super::{ServiceKey, SessionService};
use crate::config::SERVICE_KEY_HEADER;
use crate::error::AppError;
use crate::models::ActorRole;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: ActorRole,
}

impl AuthContext {
    /// Admins and the service key may act on anything; clients only on
    /// their own records.
    pub fn can_access_user(&self, owner: Uuid) -> bool {
        self.role.has_admin_authority() || self.user_id == owner
    }

    /// Guard for admin-only handlers.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.has_admin_authority() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "This action requires admin authority".to_string(),
            ))
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Service key first: back-office scripts carry no user identity,
        // so they act as SYSTEM with a nil user id.
        if let Some(provided) = req
            .headers()
            .get(SERVICE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let Some(service_key) = req.app_data::<web::Data<ServiceKey>>() else {
                return ready(Err(AppError::Unauthorized(
                    "Service authentication is not configured".to_string(),
                )));
            };
            if service_key.verify(provided) {
                return ready(Ok(AuthContext {
                    user_id: Uuid::nil(),
                    role: ActorRole::System,
                }));
            }
            return ready(Err(AppError::Unauthorized(
                "Invalid service key".to_string(),
            )));
        }

        let Some(sessions) = req.app_data::<web::Data<SessionService>>() else {
            return ready(Err(AppError::Unauthorized(
                "Session authentication is not configured".to_string(),
            )));
        };

        match bearer_token(req) {
            Some(token) => ready(sessions.verify(token).map(|(user_id, role)| AuthContext {
                user_id,
                role,
            })),
            None => ready(Err(AppError::Unauthorized(
                "Missing Authorization bearer token".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_rules() {
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();

        let client = AuthContext {
            user_id: owner,
            role: ActorRole::Client,
        };
        assert!(client.can_access_user(owner));
        assert!(!client.can_access_user(other));
        assert!(client.require_admin().is_err());

        let admin = AuthContext {
            user_id: other,
            role: ActorRole::Admin,
        };
        assert!(admin.can_access_user(owner));
        assert!(admin.require_admin().is_ok());

        let system = AuthContext {
            user_id: Uuid::nil(),
            role: ActorRole::System,
        };
        assert!(system.can_access_user(owner));
        assert!(system.require_admin().is_ok());
    }
}
