/*!
 * Collaborator clients for the generation pipeline.
 *
 * Each external capability is a narrow trait so the pipeline never depends
 * on a particular backend:
 * - `TextGenerator`: scripts, image prompts and music choices (OpenAI chat)
 * - `Synthesizer`: text-to-speech (ElevenLabs or OpenAI)
 * - `Transcriber`: word-timed transcription (OpenAI Whisper)
 * - `ImageGenerator`: slot images (Replicate)
 *
 * `mock` holds deterministic implementations used by the tests.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, TtsProvider};
use crate::errors::{ConfigError, ProviderError};
use crate::subtitles::Word;

pub mod elevenlabs;
pub mod mock;
pub mod openai;
pub mod replicate;

/// Sampling options of a text generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Temperature; `None` leaves the model default
    pub temperature: Option<f32>,
    /// Ask the model for a JSON object
    pub json_response: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { temperature: Some(1.0), json_response: false }
    }
}

impl GenerationOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self { temperature: Some(temperature), json_response: false }
    }

    /// JSON object output at the model's default temperature
    pub fn json() -> Self {
        Self { temperature: None, json_response: true }
    }
}

/// Transcription result: full text plus timed words
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Punctuated transcript text
    #[serde(default)]
    pub text: String,

    /// Word timings in order
    #[serde(default)]
    pub words: Vec<Word>,

    /// Audio duration reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Generates text from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ProviderError>;
}

/// Turns text into encoded speech
#[async_trait]
pub trait Synthesizer: Send + Sync + Debug {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Transcribes encoded audio with word timestamps
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// `file_name` tells the service the container format
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<Transcript, ProviderError>;
}

/// Generates one image for a prompt
#[async_trait]
pub trait ImageGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>, ProviderError>;
}

/// The four collaborators a pipeline run needs
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn Synthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub images: Arc<dyn ImageGenerator>,
}

impl Collaborators {
    /// Build the HTTP clients named by the configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let text_key = config.text_api_key();
        if text_key.is_empty() {
            return Err(ConfigError::MissingApiKey("OpenAI text generation".to_string()));
        }
        let text = openai::OpenAI::new(
            text_key,
            &config.text.endpoint,
            Duration::from_secs(config.text.timeout_secs),
        );

        let speech: Arc<dyn Synthesizer> = match config.tts.provider {
            TtsProvider::ElevenLabs => {
                let settings = &config.tts.elevenlabs;
                if settings.voice_id.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "tts.elevenlabs.voice_id",
                        reason: "required when the TTS provider is ElevenLabs".to_string(),
                    });
                }
                Arc::new(elevenlabs::ElevenLabs::new(config.tts_api_key(), settings.clone()))
            }
            TtsProvider::OpenAI => {
                let settings = &config.tts.openai;
                Arc::new(openai::OpenAISpeech::new(
                    openai::OpenAI::new(
                        config.tts_api_key(),
                        &settings.endpoint,
                        Duration::from_secs(settings.timeout_secs),
                    ),
                    &settings.model,
                    &settings.voice,
                ))
            }
        };

        let transcriber = openai::OpenAITranscriber::new(
            openai::OpenAI::new(
                config.transcription_api_key(),
                &config.transcription.endpoint,
                Duration::from_secs(config.transcription.timeout_secs),
            ),
            &config.transcription.model,
        );

        let images = replicate::Replicate::new(config.image_api_key(), config.images.clone());

        Ok(Self {
            text: Arc::new(openai::OpenAIChat::new(text, &config.text.model)),
            speech,
            transcriber: Arc::new(transcriber),
            images: Arc::new(images),
        })
    }
}
