/// API сервер для подготовки признаков MLD

use anyhow::Context;

use argo_mld::{
    api::{self, AppState},
    ServerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        "Pipeline defaults: threshold {} °C, reference depth {} m",
        config.pipeline.threshold,
        config.pipeline.reference_depth
    );

    let app = api::router(AppState::new(config.pipeline));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("Server listening on http://{}", config.addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
