use anyhow::Context;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use faceserver::face_api::FaceApiService;
use faceserver::main_module::run_axum_server;
use faceserver::shared::config::AppConfig;
use faceserver::shared::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = AppConfig::from_env();
    info!("faceserver starting on port {}", config.port);
    info!("Using model: {}", config.model_name);
    info!("Using detector: {}", config.detector_backend);

    let engine = FaceApiService::new(&config).context("failed to initialize face engine")?;
    let state = Arc::new(AppState { config, engine });

    run_axum_server(state)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
