//! Notification dispatch: in-app rows plus emails through the relay.
//!
//! Dispatch is best effort by contract. Callers run it after the state
//! change has committed and log failures instead of propagating them, so a
//! down relay never rolls back a transition.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::DbPool;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::models::{
    Channel, NotificationAttachment, NotificationLink, NotificationRequest, Recipient,
};

/// Notification capability consumed by the lifecycle engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch one notification across its requested channels.
    async fn send(&self, request: NotificationRequest) -> AppResult<()>;
}

/// Payload posted to the email relay.
#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    event: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<NotificationLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<NotificationAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

/// Production notifier: persists in-app rows and posts emails to the
/// configured relay endpoint.
#[derive(Clone)]
pub struct NotificationService {
    db: DbPool,
    http: reqwest::Client,
    relay_url: Option<String>,
}

impl NotificationService {
    pub fn new(db: DbPool, config: &Config) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            relay_url: config.email_relay_url.clone(),
        }
    }

    /// Whether this request should produce an email at all: the email
    /// channel must be requested and the event must be whitelisted for the
    /// recipient's role.
    fn wants_email(request: &NotificationRequest) -> bool {
        request.channels.contains(&Channel::Email)
            && request.event.email_allowed_for(request.recipient_role)
    }

    async fn write_in_app_row(&self, user_id: Uuid, request: &NotificationRequest) -> AppResult<()> {
        let link = request.links.first().map(|l| l.url.as_str());
        self.db
            .insert_notification(
                user_id,
                request.event,
                &request.title,
                &request.message,
                link,
            )
            .await?;
        Ok(())
    }

    async fn resolve_address(&self, request: &NotificationRequest) -> AppResult<Option<String>> {
        match &request.recipient {
            Recipient::Email(address) => Ok(Some(address.clone())),
            Recipient::UserId(user_id) => {
                match users::find_by_id(self.db.connection(), *user_id).await? {
                    Some(user) => Ok(Some(user.email)),
                    None => {
                        warn!("Notification recipient {} has no user row, skipping email", user_id);
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn post_to_relay(&self, address: &str, request: &NotificationRequest) -> AppResult<()> {
        let Some(ref relay_url) = self.relay_url else {
            debug!(
                "Email relay not configured, skipping {} email to {}",
                request.event, address
            );
            return Ok(());
        };

        let payload = EmailPayload {
            to: address,
            subject: &request.title,
            body: &request.message,
            event: request.event.as_str(),
            links: request.links.clone(),
            attachments: request.attachments.clone(),
            metadata: request.metadata.clone(),
        };

        let response = self
            .http
            .post(relay_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Email relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Notification(format!(
                "Email relay rejected {} email: HTTP {}",
                request.event,
                response.status()
            )));
        }

        debug!("Sent {} email to {}", request.event, address);
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn send(&self, request: NotificationRequest) -> AppResult<()> {
        // In-app row first. It only applies to known users and never
        // depends on the relay being up.
        if request.channels.contains(&Channel::InApp)
            && let Recipient::UserId(user_id) = request.recipient
        {
            self.write_in_app_row(user_id, &request).await?;
        }

        if !Self::wants_email(&request) {
            return Ok(());
        }

        match self.resolve_address(&request).await? {
            Some(address) => self.post_to_relay(&address, &request).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorRole, NotificationEvent};

    #[test]
    fn test_email_gated_by_role_whitelist() {
        let to_client = NotificationRequest::to_user(
            Uuid::now_v7(),
            ActorRole::Client,
            NotificationEvent::RequestValidated,
            "Validated",
            "Your request was validated",
        );
        assert!(!NotificationService::wants_email(&to_client));

        let to_admin = NotificationRequest::to_address(
            "ops@example.com",
            ActorRole::Admin,
            NotificationEvent::RequestValidated,
            "Validated",
            "Request was validated",
        );
        assert!(NotificationService::wants_email(&to_admin));
    }

    #[test]
    fn test_in_app_only_request_never_emails() {
        let mut request = NotificationRequest::to_user(
            Uuid::now_v7(),
            ActorRole::Client,
            NotificationEvent::DraftAvailable,
            "Draft ready",
            "Your draft is ready",
        );
        request.channels = vec![Channel::InApp];
        assert!(!NotificationService::wants_email(&request));
    }

    #[test]
    fn test_email_payload_omits_empty_extras() {
        let payload = EmailPayload {
            to: "client@example.com",
            subject: "Draft ready",
            body: "Your draft is ready",
            event: "DRAFT_AVAILABLE",
            links: Vec::new(),
            attachments: Vec::new(),
            metadata: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"], "client@example.com");
        assert!(json.get("links").is_none());
        assert!(json.get("attachments").is_none());
        assert!(json.get("metadata").is_none());
    }
}
