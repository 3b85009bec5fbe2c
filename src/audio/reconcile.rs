use std::borrow::Cow;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::audio::{speedup, AudioCodec};
use crate::errors::{AppError, ConfigError};

// @module: Narration duration reconciliation

/// Speed-up and re-encode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Chunk length of the crossfade speed-up
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u32,

    /// Crossfade between chunks
    #[serde(default = "default_crossfade_ms")]
    pub crossfade_ms: u32,

    /// Bitrate used when the audio has to be re-encoded
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            chunk_ms: default_chunk_ms(),
            crossfade_ms: default_crossfade_ms(),
            bitrate_kbps: default_bitrate_kbps(),
        }
    }
}

fn default_chunk_ms() -> u32 {
    150
}

fn default_crossfade_ms() -> u32 {
    25
}

pub(crate) fn default_bitrate_kbps() -> u32 {
    320
}

/// Outcome of a reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<'a> {
    /// Input bytes when nothing changed, re-encoded bytes otherwise
    pub bytes: Cow<'a, [u8]>,
    /// Measured input duration, when the input was decoded
    pub original_duration: Option<f64>,
    /// Duration after the speed-up, when one happened
    pub final_duration: Option<f64>,
    /// Applied speed factor, when one happened
    pub speed_factor: Option<f64>,
}

impl Reconciled<'_> {
    /// Whether the bytes differ from the input and must be written back
    pub fn is_rewritten(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.into_owned()
    }
}

/// Fits narration under a maximum duration
#[derive(Debug, Clone)]
pub struct DurationReconciler {
    codec: Arc<dyn AudioCodec>,
    config: ReconcileConfig,
}

impl DurationReconciler {
    pub fn new(codec: Arc<dyn AudioCodec>, config: ReconcileConfig) -> Self {
        Self { codec, config }
    }

    /// Compress `audio` so it lasts at most `max_duration` seconds.
    ///
    /// Without a maximum the input is returned untouched and never decoded.
    /// Audio already short enough is returned untouched as well. Only the
    /// compression path re-encodes.
    pub fn reconcile<'a>(&self, audio: &'a [u8], max_duration: Option<f64>) -> Result<Reconciled<'a>, AppError> {
        let Some(max_duration) = max_duration else {
            return Ok(Reconciled {
                bytes: Cow::Borrowed(audio),
                original_duration: None,
                final_duration: None,
                speed_factor: None,
            });
        };

        if !max_duration.is_finite() || max_duration <= 0.0 {
            return Err(ConfigError::InvalidMaxDuration(max_duration).into());
        }

        let pcm = self.codec.decode(audio)?;
        let current = pcm.duration_secs();

        if current <= max_duration {
            debug!("Audio duration {:.2}s is within {:.2}s, keeping original bytes", current, max_duration);
            return Ok(Reconciled {
                bytes: Cow::Borrowed(audio),
                original_duration: Some(current),
                final_duration: None,
                speed_factor: None,
            });
        }

        let speed_factor = current / max_duration;
        info!(
            "Audio duration {:.2}s exceeds max duration {:.2}s, speeding up by {:.3}x",
            current, max_duration, speed_factor
        );

        let faster = speedup::speedup(&pcm, speed_factor, self.config.chunk_ms, self.config.crossfade_ms)?;
        let encoded = self.codec.encode(&faster, self.config.bitrate_kbps)?;

        Ok(Reconciled {
            bytes: Cow::Owned(encoded),
            original_duration: Some(current),
            final_duration: Some(faster.duration_secs()),
            speed_factor: Some(speed_factor),
        })
    }
}
