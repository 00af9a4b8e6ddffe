// Taskrelay server
// Decision: Asana and Airtable clients share one reqwest client with a request timeout
// Decision: Ctrl-C stops the listener first, then closes the enrichment queue

use std::sync::Arc;

use anyhow::{Context, Result};
use taskrelay_core::{
    AirtableClient, AsanaClient, Enricher, EnrichmentQueue, SecretStore, WebhookRelay,
};
use taskrelay_server::{app, config::ServerConfig, AppState};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskrelay_server=debug,taskrelay_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("taskrelay-server starting...");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let relay_config = &config.relay;
    tracing::info!(
        port = config.port,
        asana_url = %relay_config.asana.base_url,
        airtable_url = %relay_config.airtable.base_url,
        base_id = %relay_config.airtable.base_id,
        table = %relay_config.airtable.table,
        custom_fields = ?relay_config.custom_fields,
        "Configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(relay_config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let enricher = Enricher::new(
        Arc::new(AsanaClient::new(http.clone(), &relay_config.asana)),
        Arc::new(AirtableClient::new(http, &relay_config.airtable)),
        relay_config.custom_fields.clone(),
    );
    let (queue, dispatcher) = EnrichmentQueue::start(relay_config.queue.clone(), Arc::new(enricher));

    let relay = WebhookRelay::new(Arc::new(SecretStore::new()), queue.clone());
    let app = app(AppState::new(relay)).layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    queue.shutdown();
    if let Err(e) = dispatcher.await {
        tracing::warn!("Enrichment dispatcher ended abnormally: {}", e);
    }
    tracing::info!(stats = ?queue.stats(), "taskrelay-server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
