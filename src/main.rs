//! FeriDesk server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use sea_orm_migration::MigratorTrait;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use feridesk_lib::api;
use feridesk_lib::auth::{ServiceKey, SessionService};
use feridesk_lib::config::{Config, SERVICE_KEY_HEADER};
use feridesk_lib::db::DbPool;
use feridesk_lib::lifecycle::LifecycleEngine;
use feridesk_lib::middleware::RequestLogger;
use feridesk_lib::migration::Migrator;
use feridesk_lib::services::magic_link::MagicLinkService;
use feridesk_lib::services::notifier::{NotificationService, Notifier};
use feridesk_lib::services::storage::{BlobStore, Storage};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, FDK_SESSION_SECRET and S3 credentials must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  FeriDesk Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL, secrets and S3");
    }

    // Connect to PostgreSQL and run migrations
    let pool = DbPool::connect(&config)
        .await
        .expect("Failed to connect to database");
    info!("Database connection established");

    Migrator::up(pool.connection(), None)
        .await
        .expect("Failed to run migrations");
    info!("Database migrations complete");

    // Object storage
    let storage = Storage::new(&config.storage)
        .await
        .expect("Failed to initialize object storage");
    info!("Object storage ready (bucket: {})", config.storage.bucket);

    // Shared services
    let sessions = SessionService::new(config.session_secret.clone());
    let service_key = ServiceKey::new(config.service_key.clone());
    let magic_links = MagicLinkService::new(
        config.session_secret.clone(),
        config.base_url.clone(),
        config.magic_link_ttl_secs,
    );
    let notifier: Arc<dyn Notifier> = Arc::new(NotificationService::new(pool.clone(), &config));
    let blobs: Arc<dyn BlobStore> = Arc::new(storage.clone());

    let engine = LifecycleEngine::new(
        Arc::new(pool.clone()),
        Arc::clone(&blobs),
        Arc::clone(&notifier),
        magic_links.clone(),
        config.admin_emails.clone(),
        config.signed_url_ttl_secs,
    );

    if config.admin_emails.is_empty() {
        warn!("FDK_ADMIN_EMAILS is empty - admin email fan-out is disabled");
    }
    if config.email_relay_url.is_none() {
        info!("Email relay not configured - notifications are in-app only");
    }

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let max_upload_size = config.max_upload_size;

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    SERVICE_KEY_HEADER.parse().unwrap(),
                ])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    SERVICE_KEY_HEADER.parse().unwrap(),
                ])
                .max_age(3600)
        };

        let mut app = App::new()
            // CORS must sit outside the other middleware
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(engine.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(service_key.clone()))
            .app_data(web::Data::new(magic_links.clone()))
            .app_data(web::Data::from(Arc::clone(&notifier)))
            .app_data(web::Data::new(config.clone()))
            // Allow some multipart framing overhead at the HTTP layer; the
            // per-part limit is enforced while reading the form.
            .app_data(web::PayloadConfig::new(max_upload_size * 4))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_request_routes)
                    .configure(api::configure_document_routes)
                    .configure(api::configure_admin_routes)
                    .configure(api::configure_invoice_routes)
                    .configure(api::configure_dispute_routes)
                    .configure(api::configure_notification_routes)
                    .configure(api::configure_magic_routes),
            );

        // Swagger UI stays off the production surface
        if is_development {
            app = app.service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            );
        }

        app
    });

    server.workers(worker_count).bind(&bind_address)?.run().await
}
