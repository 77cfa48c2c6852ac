use std::collections::HashMap;
use std::time::Duration;

use whisper_gateway::presentation::{Environment, Settings, TranscriptionProviderSetting};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn given_no_overrides_when_loading_then_uses_defaults() {
    let settings = Settings::load_from(Environment::Test, HashMap::new()).unwrap();

    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.transcription.provider, TranscriptionProviderSetting::Local);
    assert_eq!(settings.transcription.model(), "base");
    assert!(settings.transcription.verbose);
    assert_eq!(settings.transcription.max_upload_bytes(), 100 * 1024 * 1024);
    assert_eq!(settings.transcription.timeout(), None);
    assert_eq!(settings.rtf.default_estimate, 1.0);
    assert_eq!(settings.rtf.alpha, 0.2);
}

#[test]
fn given_legacy_variables_when_loading_then_they_override() {
    let settings = Settings::load_from(
        Environment::Test,
        vars(&[
            ("WHISPER_MODEL", "small.en"),
            ("TRANSCRIBE_RTF_ESTIMATE", "0.5"),
            ("TRANSCRIBE_RTF_ALPHA", "0.35"),
            ("SERVER_PORT", "8080"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.transcription.model(), "small.en");
    assert_eq!(settings.rtf.default_estimate, 0.5);
    assert_eq!(settings.rtf.alpha, 0.35);
    assert_eq!(settings.server.port, 8080);
}

#[test]
fn given_namespaced_variables_when_loading_then_they_apply() {
    let settings = Settings::load_from(
        Environment::Test,
        vars(&[
            ("APP__TRANSCRIPTION__PROVIDER", "mock"),
            ("APP__TRANSCRIPTION__VERBOSE", "false"),
            ("APP__TRANSCRIPTION__TIMEOUT_SECS", "30"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.transcription.provider, TranscriptionProviderSetting::Mock);
    assert!(!settings.transcription.verbose);
    assert_eq!(settings.transcription.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn given_legacy_and_namespaced_model_when_loading_then_legacy_wins() {
    let settings = Settings::load_from(
        Environment::Test,
        vars(&[
            ("APP__TRANSCRIPTION__MODEL", "tiny"),
            ("WHISPER_MODEL", "medium"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.transcription.model(), "medium");
}

#[test]
fn given_alpha_out_of_range_when_loading_then_fails() {
    assert!(Settings::load_from(Environment::Test, vars(&[("TRANSCRIBE_RTF_ALPHA", "1.5")])).is_err());
    assert!(Settings::load_from(Environment::Test, vars(&[("TRANSCRIBE_RTF_ALPHA", "0")])).is_err());
}

#[test]
fn given_non_positive_estimate_when_loading_then_fails() {
    let result = Settings::load_from(
        Environment::Test,
        vars(&[("TRANSCRIBE_RTF_ESTIMATE", "-1")]),
    );
    assert!(result.is_err());
}

#[test]
fn given_unknown_provider_when_loading_then_fails() {
    let result = Settings::load_from(
        Environment::Test,
        vars(&[("APP__TRANSCRIPTION__PROVIDER", "carrier-pigeon")]),
    );
    assert!(result.is_err());
}

#[test]
fn given_openai_provider_without_model_when_loading_then_defaults_to_whisper_1() {
    let settings = Settings::load_from(
        Environment::Test,
        vars(&[("APP__TRANSCRIPTION__PROVIDER", "openai")]),
    )
    .unwrap();

    assert_eq!(settings.transcription.model, None);
    assert_eq!(settings.transcription.model(), "whisper-1");
}

#[test]
fn given_openai_provider_with_model_when_loading_then_model_is_kept() {
    let settings = Settings::load_from(
        Environment::Test,
        vars(&[
            ("APP__TRANSCRIPTION__PROVIDER", "openai"),
            ("WHISPER_MODEL", "gpt-4o-transcribe"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.transcription.model(), "gpt-4o-transcribe");
}
