//! services/bot/src/bin/bot.rs

use bot_lib::{
    adapters::{JsonFileRepository, PdfExtractAdapter},
    config::Config,
    error::ApiError,
    web::{dispatch::Dispatcher, rest::ApiDoc, router, state::AppState},
};
use pdf_reader_core::LibraryStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting bot...");

    // --- 2. Load the Library ---
    info!("Loading library from {}", config.data_dir.display());
    let repository = Arc::new(JsonFileRepository::new(config.data_dir.clone()));
    let library = Arc::new(LibraryStore::open(repository).await?);
    let snapshot = library.snapshot().await;
    info!(
        users = snapshot.users_files.len(),
        documents = snapshot.document_count(),
        "Library loaded."
    );

    // --- 3. Initialize Service Adapters ---
    let extractor = Arc::new(PdfExtractAdapter::new());
    let dispatcher = Arc::new(Dispatcher::new(library, extractor, &config));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        dispatcher,
    });

    // --- 5. Create the Web Router ---
    let app = router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
            shutdown.cancel();
        }
    });

    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped.");
    Ok(())
}
