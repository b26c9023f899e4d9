//! DankPass API Server
//!
//! Main entry point for the DankPass loyalty backend.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dankpass_api::{create_router, AppState};
use dankpass_core::extraction::{ExtractionClient, ExtractionConfig};
use dankpass_db::connect;
use dankpass_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dankpass=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service for identity-provider tokens
    let jwt_service = JwtService::new(&JwtConfig {
        secret: config.jwt.secret.clone(),
    });

    // Create vision extraction client
    let extraction = ExtractionClient::new(ExtractionConfig {
        endpoint: config.extraction.endpoint.clone(),
        api_key: config.extraction.api_key.clone(),
        model: config.extraction.model.clone(),
        timeout_secs: config.extraction.timeout_secs,
    })?;
    info!(model = %config.extraction.model, "Extraction client configured");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        extraction: Arc::new(extraction),
        billing_webhook_secret: Arc::new(config.billing.webhook_secret.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
