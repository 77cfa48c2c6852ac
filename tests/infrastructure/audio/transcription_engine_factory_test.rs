use whisper_gateway::application::ports::{TranscribeOptions, TranscriptionEngine, TranscriptionError};
use whisper_gateway::infrastructure::audio::TranscriptionEngineFactory;
use whisper_gateway::presentation::{TranscriptionProviderSetting, TranscriptionSettings};

fn settings(provider: TranscriptionProviderSetting) -> TranscriptionSettings {
    TranscriptionSettings {
        provider,
        model: None,
        api_key: None,
        base_url: None,
        verbose: true,
        max_upload_mb: 100,
        temp_dir: None,
        timeout_secs: None,
    }
}

#[test]
fn given_mock_provider_when_creating_then_returns_engine() {
    let result = TranscriptionEngineFactory::create(&settings(TranscriptionProviderSetting::Mock));
    assert!(result.is_ok());
}

#[test]
fn given_openai_provider_without_key_or_url_when_creating_then_fails() {
    let result =
        TranscriptionEngineFactory::create(&settings(TranscriptionProviderSetting::OpenAi));
    assert!(matches!(result, Err(TranscriptionError::ModelLoadFailed(_))));
}

#[test]
fn given_openai_provider_with_base_url_when_creating_then_returns_engine() {
    let mut settings = settings(TranscriptionProviderSetting::OpenAi);
    settings.base_url = Some("http://localhost:8000/v1".to_string());

    let result = TranscriptionEngineFactory::create(&settings);

    assert!(result.is_ok());
}

async fn start_model_echo_server() -> (String, tokio::sync::oneshot::Sender<()>) {
    use axum::Json;
    use axum::extract::Multipart;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let app = axum::Router::new().route(
        "/v1/audio/transcriptions",
        axum::routing::post(|mut multipart: Multipart| async move {
            let mut model = String::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                if field.name() == Some("model") {
                    model = field.text().await.unwrap();
                }
            }
            Json(serde_json::json!({ "language": model, "segments": [] }))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (base_url, shutdown_tx)
}

async fn model_sent(model: Option<&str>) -> Option<String> {
    let (base_url, shutdown_tx) = start_model_echo_server().await;
    let mut settings = settings(TranscriptionProviderSetting::OpenAi);
    settings.base_url = Some(base_url);
    settings.model = model.map(str::to_string);
    let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();

    let engine = TranscriptionEngineFactory::create(&settings).unwrap();
    let transcription = engine
        .transcribe(file.path(), &TranscribeOptions::default())
        .await
        .unwrap();

    shutdown_tx.send(()).ok();
    transcription.info.language
}

#[tokio::test]
async fn given_openai_provider_without_model_when_transcribing_then_sends_whisper_1() {
    assert_eq!(model_sent(None).await.as_deref(), Some("whisper-1"));
}

#[tokio::test]
async fn given_openai_provider_with_model_when_transcribing_then_sends_it() {
    assert_eq!(
        model_sent(Some("gpt-4o-transcribe")).await.as_deref(),
        Some("gpt-4o-transcribe")
    );
}
