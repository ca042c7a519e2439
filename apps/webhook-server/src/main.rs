///! Mock script generator
///! Serves the webhook routes the review client talks to, plus the stub
///! topic/script endpoints, so the workflow can be exercised locally.

mod api;
mod models;
mod storage;

use std::sync::Arc;
use storage::ScriptStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webhook_server=debug,axum=info".into()),
        )
        .init();

    info!("Starting mock script generator...");

    let addr = std::env::var("WEBHOOK_SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let store = Arc::new(ScriptStore::new(format!("http://{}/videos", addr)));
    let app = api::router(store);

    info!("Webhook server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /webhook/frontend       - Generate a script");
    info!("  POST /webhook/approve        - Approve or refine a script");
    info!("  POST /webhook/approve-video  - Approve a video");
    info!("  POST /webhook/reject-video   - Reject a video");
    info!("  POST /api/submitTopic        - Log a topic submission");
    info!("  POST /api/approveScript      - Log a script approval");
    info!("  GET  /api/getScript          - Sample script");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
