use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use whisper_gateway::application::services::{
    RtfEstimator, TranscriptionService, TranscriptionServiceConfig,
};
use whisper_gateway::infrastructure::audio::TranscriptionEngineFactory;
use whisper_gateway::infrastructure::observability::{TracingConfig, init_tracing};
use whisper_gateway::presentation::{AppState, Environment, Settings, UploadSettings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(
        TracingConfig {
            environment: environment.to_string(),
            json_format: settings.logging.enable_json,
            level: settings.logging.level.clone(),
        },
        settings.server.port,
    );

    let transcription_settings = settings.transcription.clone();
    let engine = tokio::task::spawn_blocking(move || {
        TranscriptionEngineFactory::create(&transcription_settings)
    })
    .await?
    .context("Failed to initialize transcription engine")?;

    let transcription_service = Arc::new(TranscriptionService::new(
        engine,
        TranscriptionServiceConfig {
            model_name: settings.transcription.model().to_string(),
            verbose: settings.transcription.verbose,
            timeout: settings.transcription.timeout(),
        },
        RtfEstimator::new(settings.rtf.default_estimate, settings.rtf.alpha),
    ));

    let state = AppState {
        transcription_service,
        uploads: UploadSettings::from(&settings.transcription),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
