use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;

use triage_common::config::SystemConfig;
use triage_engine::inference::InferenceEngine;
use triage_engine::repo::CaseRepo;
use triage_engine::routes::{self, AppState};
use triage_engine::seed;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("ApplianceTriage engine starting");

    // A missing config file falls back to defaults (the reasoner is optional
    // by design); a malformed one refuses to start.
    let config_path = std::env::var("TRIAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/system.toml"));

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration — refusing to start");
            std::process::exit(1);
        }
    };

    // Install Prometheus metrics recorder.
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let repo = CaseRepo::new();
    seed::seed_demo_cases(&repo);

    let state = Arc::new(AppState {
        engine: InferenceEngine::new(&config),
        repo,
        metrics_handle,
    });

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .route("/stats", get(routes::stats))
        .route("/cases", post(routes::create_case).get(routes::list_cases))
        .route("/cases/{id}", get(routes::get_case))
        .route("/cases/{id}/next-question", get(routes::next_question))
        .route("/cases/{id}/answers", post(routes::record_answer))
        .route("/cases/{id}/hypotheses", get(routes::hypotheses))
        .route("/cases/{id}/finalize", post(routes::finalize))
        .with_state(state);

    let port: u16 = std::env::var("TRIAGE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(port = port, "ApplianceTriage engine listening");

    axum::serve(listener, app).await.expect("HTTP server error");
}

fn load_config(path: &std::path::Path) -> Result<SystemConfig, String> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "No config file, using defaults");
        return Ok(SystemConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}
