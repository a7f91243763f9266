// Event Classifier - Web Server
// REST API with Axum over a shared EventClassifier

use anyhow::{Context, Result};
use std::sync::Arc;

use event_classifier::api::{router, AppState};
use event_classifier::{logging, ClassifierConfig, EventClassifier, NotificationLog};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClassifierConfig::load()?;
    logging::init(&config.log_filter);

    tracing::info!(
        backend = %config.backend_url,
        mappings = ?config.mappings_path,
        "Starting event classifier server"
    );

    // Failures land here and are retried via POST /api/notifications/:id/retry
    let notifications = NotificationLog::new();
    let classifier = Arc::new(EventClassifier::new(
        config.fetcher(),
        Arc::new(notifications.clone()),
        config.translator()?,
    ));

    // Initial fetch runs in the background
    classifier.start();

    let app = router(AppState {
        classifier: Arc::clone(&classifier),
        notifications,
    });

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    tracing::info!("Server running on http://{}", config.server_addr);
    tracing::info!("API: http://{}/api/classify?event_type=trade&event_subtype=spend", config.server_addr);

    axum::serve(listener, app).await.context("Server stopped")?;

    Ok(())
}
