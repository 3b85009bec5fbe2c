use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::audio::{MixConfig, ReconcileConfig};
use crate::errors::ConfigError;
use crate::subtitles::SegmenterConfig;
use crate::timeline::VideoConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Narration language code (ISO)
    #[serde(default = "default_language")]
    pub language: String,

    /// Directory receiving one sub-directory per request
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Requests run at the same time in batch mode
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Script, image prompt and music choice generation
    #[serde(default)]
    pub text: TextConfig,

    /// Text-to-speech
    #[serde(default)]
    pub tts: TtsConfig,

    /// Word-level transcription
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Slot image generation
    #[serde(default)]
    pub images: ImageConfig,

    /// Cue segmentation limits
    #[serde(default)]
    pub subtitles: SegmenterConfig,

    /// Narration duration and music mixing
    #[serde(default)]
    pub audio: AudioConfig,

    /// Background music
    #[serde(default)]
    pub music: MusicConfig,

    /// Video composition
    #[serde(default)]
    pub video: VideoConfig,
}

/// Text-to-speech provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    // @provider: ElevenLabs
    #[default]
    ElevenLabs,
    // @provider: OpenAI
    OpenAI,
}

impl TtsProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::ElevenLabs => "ElevenLabs",
            Self::OpenAI => "OpenAI",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::ElevenLabs => "elevenlabs".to_string(),
            Self::OpenAI => "openai".to_string(),
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TtsProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "elevenlabs" => Ok(Self::ElevenLabs),
            "openai" => Ok(Self::OpenAI),
            _ => Err(anyhow!("Invalid TTS provider: {}", s)),
        }
    }
}

/// OpenAI chat completion settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TextConfig {
    /// Model name
    #[serde(default = "default_text_model")]
    pub model: String,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Sampling temperature of script and image prompts
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            model: default_text_model(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Text-to-speech settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TtsConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: TtsProvider,

    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    #[serde(default)]
    pub openai: OpenAITtsConfig,
}

/// ElevenLabs service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ElevenLabsConfig {
    /// API key; falls back to `ELEVENLABS_API_KEY`
    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "default_elevenlabs_endpoint")]
    pub endpoint: String,

    /// Voice to speak with; required for this provider
    #[serde(default = "String::new")]
    pub voice_id: String,

    #[serde(default = "default_elevenlabs_model")]
    pub model_id: String,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    #[serde(default = "default_elevenlabs_output_format")]
    pub output_format: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_elevenlabs_endpoint(),
            voice_id: String::new(),
            model_id: default_elevenlabs_model(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            output_format: default_elevenlabs_output_format(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// OpenAI speech configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpenAITtsConfig {
    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_openai_tts_model")]
    pub model: String,

    #[serde(default = "default_openai_tts_voice")]
    pub voice: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAITtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            model: default_openai_tts_model(),
            voice: default_openai_tts_voice(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Transcription configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptionConfig {
    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_transcription_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            model: default_transcription_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Replicate image generation configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageConfig {
    /// API token; falls back to `REPLICATE_API_TOKEN`
    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "default_replicate_endpoint")]
    pub endpoint: String,

    /// Model as `owner/name`, used when no version is pinned
    #[serde(default = "default_image_model")]
    pub model: String,

    /// Pinned model version
    #[serde(default = "String::new")]
    pub version: String,

    #[serde(default = "default_image_width")]
    pub width: u32,

    #[serde(default = "default_image_height")]
    pub height: u32,

    /// Delay between prediction status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall limit for one prediction, polling included
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_replicate_endpoint(),
            model: default_image_model(),
            version: String::new(),
            width: default_image_width(),
            height: default_image_height(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_image_timeout_secs(),
        }
    }
}

/// Audio processing configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AudioConfig {
    /// Narration ceiling in seconds; no limit when absent
    #[serde(default)]
    pub max_duration: Option<f64>,

    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default)]
    pub mix: MixConfig,
}

/// Background music configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MusicConfig {
    /// Whether to add background music
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Music library JSON file
    #[serde(default = "default_music_library")]
    pub library: PathBuf,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            library: default_music_library(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_concurrent_requests() -> usize {
    2
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_image_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_elevenlabs_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_replicate_endpoint() -> String {
    "https://api.replicate.com".to_string()
}

fn default_text_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_tts_model() -> String {
    "tts-1-hd".to_string()
}

fn default_openai_tts_voice() -> String {
    "alloy".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_elevenlabs_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_stability() -> f32 {
    0.75
}

fn default_similarity_boost() -> f32 {
    0.5
}

fn default_image_model() -> String {
    "nvidia/sana".to_string()
}

fn default_image_width() -> u32 {
    1080
}

fn default_image_height() -> u32 {
    1920
}

fn default_music_library() -> PathBuf {
    PathBuf::from("music/songs.json")
}

/// Configured key, or the environment variable when the key is empty
pub fn api_key_or_env(key: &str, variable: &str) -> String {
    if !key.trim().is_empty() {
        return key.trim().to_string();
    }
    std::env::var(variable).map(|v| v.trim().to_string()).unwrap_or_default()
}

impl Config {
    /// Load the configuration, writing the defaults first when the file is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.language)?;

        if self.concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                name: "concurrent_requests",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        if let Some(max) = self.audio.max_duration {
            if !max.is_finite() || max <= 0.0 {
                return Err(ConfigError::InvalidMaxDuration(max).into());
            }
        }

        self.subtitles.validate()?;
        self.video.validate()?;

        if self.images.width == 0 || self.images.height == 0 {
            return Err(ConfigError::InvalidValue {
                name: "images",
                reason: format!("{}x{} is not a valid size", self.images.width, self.images.height),
            }
            .into());
        }

        for (name, value) in [
            ("tts.elevenlabs.stability", self.tts.elevenlabs.stability),
            ("tts.elevenlabs.similarity_boost", self.tts.elevenlabs.similarity_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue { name, reason: format!("{} is outside [0, 1]", value) }.into());
            }
        }

        if self.text_api_key().is_empty() {
            return Err(ConfigError::MissingApiKey("OpenAI text generation".to_string()).into());
        }
        if self.transcription_api_key().is_empty() {
            return Err(ConfigError::MissingApiKey("OpenAI transcription".to_string()).into());
        }
        if self.image_api_key().is_empty() {
            return Err(ConfigError::MissingApiKey("Replicate image generation".to_string()).into());
        }

        match self.tts.provider {
            TtsProvider::ElevenLabs => {
                if self.tts_api_key().is_empty() {
                    return Err(ConfigError::MissingApiKey("ElevenLabs".to_string()).into());
                }
                if self.tts.elevenlabs.voice_id.trim().is_empty() {
                    return Err(anyhow!("A voice id is required when the TTS provider is ElevenLabs"));
                }
            }
            TtsProvider::OpenAI => {
                if self.tts_api_key().is_empty() {
                    return Err(ConfigError::MissingApiKey("OpenAI speech".to_string()).into());
                }
            }
        }

        Ok(())
    }

    pub fn text_api_key(&self) -> String {
        api_key_or_env(&self.text.api_key, "OPENAI_API_KEY")
    }

    pub fn transcription_api_key(&self) -> String {
        api_key_or_env(&self.transcription.api_key, "OPENAI_API_KEY")
    }

    pub fn image_api_key(&self) -> String {
        api_key_or_env(&self.images.api_key, "REPLICATE_API_TOKEN")
    }

    /// API key of the active TTS provider
    pub fn tts_api_key(&self) -> String {
        match self.tts.provider {
            TtsProvider::ElevenLabs => api_key_or_env(&self.tts.elevenlabs.api_key, "ELEVENLABS_API_KEY"),
            TtsProvider::OpenAI => api_key_or_env(&self.tts.openai.api_key, "OPENAI_API_KEY"),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            output_dir: default_output_dir(),
            concurrent_requests: default_concurrent_requests(),
            log_level: LogLevel::default(),
            text: TextConfig::default(),
            tts: TtsConfig::default(),
            transcription: TranscriptionConfig::default(),
            images: ImageConfig::default(),
            subtitles: SegmenterConfig::default(),
            audio: AudioConfig::default(),
            music: MusicConfig::default(),
            video: VideoConfig::default(),
        }
    }
}
