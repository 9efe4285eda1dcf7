//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FeriDesk Server",
        version = "0.4.0",
        description = "Backend for the FERI/AD freight-document desk: request intake, \
                       lifecycle transitions, invoicing, payment confirmation and final \
                       document delivery"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Request endpoints
        api::requests::create_request,
        api::requests::list_requests,
        api::requests::get_request,
        api::requests::transition_status,
        // Document endpoints
        api::documents::upload_documents,
        api::documents::list_documents,
        // Admin workflow endpoints
        api::admin::force_status,
        api::admin::send_draft,
        api::admin::confirm_payment,
        api::admin::publish_final_documents,
        api::admin::regenerate_manual_bl,
        // Invoice endpoints
        api::invoices::get_invoice,
        // Dispute and message endpoints
        api::disputes::open_dispute,
        api::disputes::list_disputes,
        api::disputes::post_message,
        api::disputes::list_messages,
        // Notification endpoints
        api::notifications::list_notifications,
        api::notifications::mark_read,
        // Auth endpoints
        api::magic::consume_magic_link,
        api::magic::me,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Requests
            models::RequestType,
            models::RequestStatus,
            models::ActorRole,
            models::ShipmentRequest,
            models::CreateRequestRequest,
            models::TransitionRequest,
            models::ForceStatusRequest,
            models::ListRequestsQuery,
            models::RequestListResponse,
            // Documents
            models::Document,
            models::DocumentCategory,
            models::DocumentWithUrl,
            models::DocumentListResponse,
            // Invoices and drafts
            models::Invoice,
            models::InvoiceStatus,
            models::InvoiceSource,
            models::DraftKind,
            models::RequestDraft,
            api::admin::SendDraftResponse,
            // Deliveries
            models::CertificateKind,
            models::Delivery,
            api::admin::PublishResponse,
            api::admin::ManualBlResponse,
            // Disputes and messages
            models::DisputeStatus,
            models::Dispute,
            models::OpenDisputeRequest,
            models::Message,
            models::PostMessageRequest,
            api::disputes::DisputeListResponse,
            api::disputes::MessageListResponse,
            // Notifications
            models::NotificationEvent,
            models::InAppNotification,
            models::NotificationListResponse,
            // Auth
            models::UserResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Requests", description = "Request intake and lifecycle transitions"),
        (name = "Documents", description = "Supporting document uploads"),
        (name = "Admin", description = "Admin workflow operations"),
        (name = "Invoices", description = "Invoice access"),
        (name = "Disputes", description = "Disputes and message threads"),
        (name = "Notifications", description = "In-app notification feed"),
        (name = "Auth", description = "Magic links and session introspection")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer session and service key security schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "service_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::SERVICE_KEY_HEADER,
                        ),
                    ),
                ),
            );
        }
    }
}
