use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wemportal_collector::CollectionOrchestrator;
use wemportal_core::{Config, Credentials};

use super::build_orchestrator;
use crate::exposition;

#[derive(Clone)]
struct ExporterState {
    orchestrator: Arc<CollectionOrchestrator>,
    metrics_path: String,
}

pub async fn run(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.exporter.host = host;
    }
    if let Some(port) = port {
        config.exporter.port = port;
    }

    // Missing credentials are fatal before anything is launched.
    let credentials = Credentials::from_env()?;
    let orchestrator = Arc::new(build_orchestrator(&config, credentials));

    info!("Starting portal session");
    orchestrator.start().await?;

    let app = router(orchestrator.clone(), &config.exporter.metrics_path);
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        addr = %bind_addr,
        path = %config.exporter.metrics_path,
        metrics = orchestrator.catalog().len(),
        "Exporter listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await;

    orchestrator.shutdown().await;
    served?;
    info!("Exporter stopped");
    Ok(())
}

fn router(orchestrator: Arc<CollectionOrchestrator>, metrics_path: &str) -> Router {
    let state = ExporterState {
        orchestrator,
        metrics_path: metrics_path.to_string(),
    };
    Router::new()
        .route("/", get(handle_index))
        .route(metrics_path, get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_index(State(state): State<ExporterState>) -> impl IntoResponse {
    Html(format!(
        concat!(
            "<html><head><title>WEM Portal Exporter</title></head><body>",
            "<h1>WEM Portal Exporter</h1>",
            "<p><a href=\"{0}\">{0}</a></p>",
            "</body></html>"
        ),
        state.metrics_path
    ))
}

async fn handle_metrics(State(state): State<ExporterState>) -> Response {
    let rendered = match state.orchestrator.collect().await {
        Ok(snapshot) => exposition::render(&snapshot),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(body) => ([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Collection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("collection failed: {}\n", e),
            )
                .into_response()
        }
    }
}
