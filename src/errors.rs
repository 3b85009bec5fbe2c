/*!
 * Error types for the rapidclip application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with collaborator APIs
/// (text generation, speech synthesis, transcription, image generation)
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and body onto the matching variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while decoding, transforming or encoding audio
#[derive(Error, Debug)]
pub enum AudioError {
    /// Input bytes could not be decoded
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// PCM could not be encoded to the target format
    #[error("Failed to encode audio: {0}")]
    Encode(String),

    /// WAV container error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Sample-rate conversion failed
    #[error("Resampling failed: {0}")]
    Resample(String),

    /// Audio is too short for the requested chunked speed-up
    #[error("Audio too short to speed up: {duration_secs:.2}s with {chunk_ms}ms chunks at {speed:.2}x")]
    TooShort {
        /// Measured duration in seconds
        duration_secs: f64,
        /// Chunk size used by the speed-up
        chunk_ms: u32,
        /// Requested speed factor
        speed: f64,
    },

    /// Audio contains no samples
    #[error("Audio track is empty: {0}")]
    Empty(String),

    /// I/O error while talking to an external codec
    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid configuration values
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// A maximum duration that is zero, negative or not finite
    #[error("max_duration must be a positive number of seconds, got {0}")]
    InvalidMaxDuration(f64),

    /// A cue limit that can never be satisfied
    #[error("{name} must be at least 1, got {value}")]
    InvalidCueLimit {
        /// Name of the limit
        name: &'static str,
        /// Configured value
        value: usize,
    },

    /// Any other out-of-range value
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Name of the setting
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A provider needs an API key that was not supplied
    #[error("API key is required for {0}")]
    MissingApiKey(String),
}

/// Errors raised while assembling a timeline
#[derive(Error, Debug, PartialEq)]
pub enum TimelineError {
    /// Number of images does not match the number of slots
    #[error("Expected {expected} slot images, got {actual}")]
    ImageCountMismatch {
        /// Slots derived from the cues
        expected: usize,
        /// Images supplied
        actual: usize,
    },

    /// A cue whose end precedes its start
    #[error("Cue {index} ends before it starts ({start:.3}s > {end:.3}s)")]
    NegativeDuration {
        /// Zero-based cue index
        index: usize,
        /// Cue start
        start: f64,
        /// Cue end
        end: f64,
    },
}

/// Soft alignment failure: a word had no transcript token left and kept its raw text
#[derive(Error, Debug, Clone, PartialEq)]
#[error("No transcript token left for word {position} ({raw_text:?}), using raw text")]
pub struct AlignmentDegraded {
    /// Zero-based index of the word
    pub position: usize,
    /// Raw transcription text that was used instead
    pub raw_text: String,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a collaborator
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from audio processing
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from timeline assembly
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
