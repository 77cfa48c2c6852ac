use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use futures::StreamExt;
use futures::stream;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{
    RecognizedSegment, TranscribeOptions, Transcription, TranscriptionEngine, TranscriptionError,
    TranscriptionInfo,
};

use super::audio_decoder::decode_audio_file;
use super::audio_window::{AudioWindow, WINDOW_SAMPLES, greedy_token, plan_windows};

const MAX_DECODE_TOKENS: usize = 224;
const MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";

/// Maps short model names ("base", "small.en") to their hub repository.
pub fn hub_repo_id(model: &str) -> String {
    if model.contains('/') {
        model.to_string()
    } else {
        format!("openai/whisper-{}", model)
    }
}

pub struct CandleWhisperEngine {
    runtime: Arc<WhisperRuntime>,
}

struct WhisperRuntime {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
    tokens: SpecialTokens,
}

struct SpecialTokens {
    sot: u32,
    transcribe: u32,
    no_timestamps: u32,
    eot: u32,
    languages: Vec<(String, u32)>,
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl CandleWhisperEngine {
    /// Loads the model from a local directory or the Hugging Face hub. Blocking.
    pub fn new(model: &str) -> Result<Self, TranscriptionError> {
        let device = Device::Cpu;

        tracing::info!(
            device = ?device,
            model,
            "Initializing Candle Whisper transcription engine"
        );

        let api = Api::new().map_err(|e| TranscriptionError::ModelLoadFailed(e.to_string()))?;
        let files = locate_model_files(&api, model)?;

        let config_contents = std::fs::read_to_string(&files.config)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("tokenizer: {}", e)))?;
        let tokens = SpecialTokens::resolve(&tokenizer)?;

        let mel_filters = load_mel_filters(&api, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], m::DTYPE, &device)
                .map_err(|e| TranscriptionError::ModelLoadFailed(format!("weights: {}", e)))?
        };

        let whisper = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("model: {}", e)))?;

        tracing::info!(
            languages = tokens.languages.len(),
            mel_bins = config.num_mel_bins,
            "Candle Whisper engine loaded successfully"
        );

        Ok(Self {
            runtime: Arc::new(WhisperRuntime {
                model: Mutex::new(whisper),
                tokenizer,
                config,
                device,
                mel_filters,
                tokens,
            }),
        })
    }
}

#[async_trait]
impl TranscriptionEngine for CandleWhisperEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcription, TranscriptionError> {
        let path = audio_path.to_path_buf();
        let audio = tokio::task::spawn_blocking(move || decode_audio_file(&path))
            .await
            .map_err(join_error)??;

        if options.beam_size > 1 {
            tracing::debug!(
                beam_size = options.beam_size,
                "Local engine decodes greedily; beam size ignored"
            );
        }
        if options.word_timestamps {
            tracing::debug!("Local engine does not produce word timestamps");
        }

        let duration = audio.duration_secs();
        let windows = plan_windows(&audio.samples, options.vad_filter);
        let samples = Arc::new(audio.samples);

        tracing::debug!(
            windows = windows.len(),
            duration_secs = duration,
            vad_filter = options.vad_filter,
            "Planned decode windows"
        );

        let language = match (&options.language, windows.first()) {
            (Some(lang), _) => Some(lang.clone()),
            (None, Some(&first)) => {
                let runtime = Arc::clone(&self.runtime);
                let samples = Arc::clone(&samples);
                tokio::task::spawn_blocking(move || {
                    runtime.detect_language(&samples[first.range()])
                })
                .await
                .map_err(join_error)??
            }
            (None, None) => None,
        };

        let language_token = language.as_deref().and_then(|lang| {
            let token = self.runtime.tokens.language(lang);
            if token.is_none() && !self.runtime.tokens.languages.is_empty() {
                tracing::warn!(language = lang, "Language not known to model; decoding without hint");
            }
            token
        });

        let runtime = Arc::clone(&self.runtime);
        let segments = stream::iter(windows)
            .then(move |window| {
                let runtime = Arc::clone(&runtime);
                let samples = Arc::clone(&samples);
                async move {
                    tokio::task::spawn_blocking(move || {
                        runtime.decode_window(&samples, window, language_token)
                    })
                    .await
                    .map_err(join_error)?
                }
            })
            .boxed();

        Ok(Transcription {
            info: TranscriptionInfo {
                language,
                duration: Some(duration),
            },
            segments,
        })
    }
}

impl WhisperRuntime {
    fn mel(&self, samples: &[f32]) -> Result<Tensor, TranscriptionError> {
        let mut padded = samples.to_vec();
        padded.resize(WINDOW_SAMPLES, 0.0);

        let mel_data = m::audio::pcm_to_mel(&self.config, &padded, &self.mel_filters);
        let n_mel = self.config.num_mel_bins;
        let n_frames = mel_data.len() / n_mel;

        Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("mel tensor: {}", e)))
    }

    fn detect_language(&self, samples: &[f32]) -> Result<Option<String>, TranscriptionError> {
        if self.tokens.languages.is_empty() {
            return Ok(None);
        }

        let mel = self.mel(samples)?;
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);

        let audio_features = model
            .encoder
            .forward(&mel, true)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("encoder: {}", e)))?;
        let logits = last_logits(&mut model, &self.device, &[self.tokens.sot], &audio_features, true)?;
        model.reset_kv_cache();

        let detected = self
            .tokens
            .languages
            .iter()
            .filter_map(|(code, id)| logits.get(*id as usize).map(|v| (code, *v)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(code, _)| code.clone());

        tracing::debug!(language = ?detected, "Detected language");
        Ok(detected)
    }

    fn decode_window(
        &self,
        samples: &[f32],
        window: AudioWindow,
        language_token: Option<u32>,
    ) -> Result<RecognizedSegment, TranscriptionError> {
        let mel = self.mel(&samples[window.range()])?;
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);

        let audio_features = model
            .encoder
            .forward(&mel, true)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("encoder: {}", e)))?;

        let mut tokens = vec![self.tokens.sot];
        tokens.extend(language_token);
        tokens.push(self.tokens.transcribe);
        tokens.push(self.tokens.no_timestamps);
        let prompt_len = tokens.len();

        let mut logprob_sum = 0.0;
        for step in 0..MAX_DECODE_TOKENS {
            let logits = last_logits(&mut model, &self.device, &tokens, &audio_features, step == 0)?;
            let Some((next_token, logprob)) = greedy_token(&logits) else {
                break;
            };
            if next_token == self.tokens.eot {
                break;
            }
            logprob_sum += logprob;
            tokens.push(next_token);
        }

        model.reset_kv_cache();
        drop(model);

        let generated = &tokens[prompt_len..];
        let text = self
            .tokenizer
            .decode(generated, true)
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("detokenize: {}", e)))?;
        let avg_logprob = (!generated.is_empty()).then(|| logprob_sum / generated.len() as f64);

        tracing::debug!(
            window = window.index,
            tokens = generated.len(),
            "Decoded audio window"
        );

        Ok(RecognizedSegment {
            start: window.start_secs(),
            end: window.end_secs(),
            text: text.trim().to_string(),
            avg_logprob,
            words: None,
        })
    }
}

fn last_logits(
    model: &mut m::model::Whisper,
    device: &Device,
    tokens: &[u32],
    audio_features: &Tensor,
    flush_kv_cache: bool,
) -> Result<Vec<f32>, TranscriptionError> {
    let token_tensor = Tensor::new(tokens, device)
        .and_then(|t| t.unsqueeze(0))
        .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

    let decoder_output = model
        .decoder
        .forward(&token_tensor, audio_features, flush_kv_cache)
        .map_err(|e| TranscriptionError::TranscriptionFailed(format!("decoder: {}", e)))?;

    let logits = decoder_output
        .squeeze(0)
        .and_then(|out| model.decoder.final_linear(&out))
        .map_err(|e| TranscriptionError::TranscriptionFailed(format!("linear: {}", e)))?;

    let seq_len = logits
        .dim(0)
        .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))?;

    logits
        .get(seq_len - 1)
        .and_then(|last| last.to_vec1::<f32>())
        .map_err(|e| TranscriptionError::TranscriptionFailed(e.to_string()))
}

impl SpecialTokens {
    fn resolve(tokenizer: &Tokenizer) -> Result<Self, TranscriptionError> {
        let mut languages: Vec<(String, u32)> = tokenizer
            .get_vocab(true)
            .into_iter()
            .filter_map(|(token, id)| language_code(&token).map(|code| (code.to_string(), id)))
            .collect();
        languages.sort_by_key(|(_, id)| *id);

        Ok(Self {
            sot: token_id(tokenizer, m::SOT_TOKEN)?,
            transcribe: token_id(tokenizer, m::TRANSCRIBE_TOKEN)?,
            no_timestamps: token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?,
            eot: token_id(tokenizer, m::EOT_TOKEN)?,
            languages,
        })
    }

    fn language(&self, code: &str) -> Option<u32> {
        let code = code.to_lowercase();
        self.languages
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, id)| *id)
    }
}

/// Extracts `en` from a `<|en|>` language token.
fn language_code(token: &str) -> Option<&str> {
    let code = token.strip_prefix("<|")?.strip_suffix("|>")?;
    let valid = (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase());
    valid.then_some(code)
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, TranscriptionError> {
    tokenizer.token_to_id(token).ok_or_else(|| {
        TranscriptionError::ModelLoadFailed(format!("token not found: {}", token))
    })
}

fn locate_model_files(api: &Api, model: &str) -> Result<ModelFiles, TranscriptionError> {
    let local = Path::new(model);
    if local.is_dir() {
        return Ok(ModelFiles {
            config: local.join("config.json"),
            tokenizer: local.join("tokenizer.json"),
            weights: local.join("model.safetensors"),
        });
    }

    let repo = api.repo(Repo::new(hub_repo_id(model), RepoType::Model));
    let fetch = |name: &str| {
        repo.get(name)
            .map_err(|e| TranscriptionError::ModelLoadFailed(format!("{}: {}", name, e)))
    };

    Ok(ModelFiles {
        config: fetch("config.json")?,
        tokenizer: fetch("tokenizer.json")?,
        weights: fetch("model.safetensors")?,
    })
}

fn load_mel_filters(api: &Api, config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let filename = match config.num_mel_bins {
        80 => "melfilters.bytes",
        128 => "melfilters128.bytes",
        other => {
            return Err(TranscriptionError::ModelLoadFailed(format!(
                "unsupported mel bin count: {}",
                other
            )));
        }
    };

    let path = api
        .repo(Repo::new(MEL_FILTERS_REPO.to_string(), RepoType::Model))
        .get(filename)
        .map_err(|e| TranscriptionError::ModelLoadFailed(format!("{}: {}", filename, e)))?;
    let bytes = std::fs::read(&path)
        .map_err(|e| TranscriptionError::ModelLoadFailed(format!("mel filters: {}", e)))?;

    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn join_error(e: tokio::task::JoinError) -> TranscriptionError {
    TranscriptionError::TranscriptionFailed(format!("task join error: {}", e))
}
