/*!
 * Audio processing for narration and background music.
 *
 * Encoded audio enters and leaves as byte buffers. In between it is decoded
 * into a `PcmBuffer` of interleaved `f32` samples in [-1.0, 1.0].
 *
 * - `codec`: decoding/encoding (WAV in memory, MP3 through ffmpeg)
 * - `loudness`: RMS loudness and gain
 * - `speedup`: chunked overlap-crossfade time compression
 * - `reconcile`: fits narration under a maximum duration
 * - `mixer`: levels, loops and mixes background music under narration
 */

pub mod codec;
pub mod loudness;
pub mod speedup;
pub mod reconcile;
pub mod mixer;

pub use codec::{AudioCodec, AudioFormat, FfmpegCodec, WavCodec};
pub use mixer::{BackgroundMusicMixer, MixConfig};
pub use reconcile::{DurationReconciler, ReconcileConfig, Reconciled};

use crate::errors::AudioError;

// @struct: Decoded audio
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    // @field: Frames per second
    pub sample_rate: u32,

    // @field: Interleaved channel count
    pub channels: u16,

    // @field: Interleaved samples
    pub samples: Vec<f32>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self { sample_rate, channels, samples }
    }

    /// Silent buffer of the given number of frames
    pub fn silence(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self::new(sample_rate, channels, vec![0.0; frames * channels as usize])
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of frames covering `ms` milliseconds
    pub fn frames_for_ms(&self, ms: f64) -> usize {
        (ms * self.sample_rate as f64 / 1000.0).round().max(0.0) as usize
    }

    /// Number of frames covering `secs` seconds
    pub fn frames_for_secs(&self, secs: f64) -> usize {
        (secs * self.sample_rate as f64).round().max(0.0) as usize
    }

    /// Copy of frames `[start, end)`, clamped to the buffer
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        let ch = self.channels as usize;
        let frames = self.frames();
        let start = start.min(frames);
        let end = end.clamp(start, frames);
        Self::new(self.sample_rate, self.channels, self.samples[start * ch..end * ch].to_vec())
    }

    /// Keep only the first `frames` frames
    pub fn truncate_frames(&mut self, frames: usize) {
        let len = frames * self.channels as usize;
        self.samples.truncate(len);
    }

    /// Append another buffer of the same format
    pub fn append(&mut self, other: &PcmBuffer) -> Result<(), AudioError> {
        self.ensure_same_format(other)?;
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    pub fn ensure_same_format(&self, other: &PcmBuffer) -> Result<(), AudioError> {
        if self.sample_rate != other.sample_rate || self.channels != other.channels {
            return Err(AudioError::Decode(format!(
                "format mismatch: {} Hz/{} ch vs {} Hz/{} ch",
                self.sample_rate, self.channels, other.sample_rate, other.channels
            )));
        }
        Ok(())
    }

    /// Convert the channel layout by averaging down or duplicating up
    pub fn with_channels(&self, channels: u16) -> Self {
        if channels == self.channels || self.channels == 0 || channels == 0 {
            return self.clone();
        }
        let src = self.channels as usize;
        let dst = channels as usize;
        let mut samples = Vec::with_capacity(self.frames() * dst);
        for frame in self.samples.chunks_exact(src) {
            if dst == 1 {
                samples.push(frame.iter().sum::<f32>() / src as f32);
            } else if src == 1 {
                samples.extend(std::iter::repeat(frame[0]).take(dst));
            } else {
                for c in 0..dst {
                    samples.push(frame[c.min(src - 1)]);
                }
            }
        }
        Self::new(self.sample_rate, channels, samples)
    }

    /// Split interleaved samples into one vector per channel
    pub fn deinterleave(&self) -> Vec<Vec<f32>> {
        let ch = self.channels as usize;
        let mut planes = vec![Vec::with_capacity(self.frames()); ch];
        for frame in self.samples.chunks_exact(ch) {
            for (c, sample) in frame.iter().enumerate() {
                planes[c].push(*sample);
            }
        }
        planes
    }

    /// Build a buffer from per-channel vectors, cut to the shortest plane
    pub fn interleave(sample_rate: u32, planes: &[Vec<f32>]) -> Self {
        let channels = planes.len();
        let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for plane in planes {
                samples.push(plane[i]);
            }
        }
        Self::new(sample_rate, channels as u16, samples)
    }
}

// @struct: Encoded audio with its measurements
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    // @field: Encoded bytes
    pub bytes: Vec<u8>,

    // @field: Container format of `bytes`
    pub format: AudioFormat,

    // @field: Measured duration in seconds
    pub duration_secs: f64,

    // @field: Measured loudness in dBFS
    pub loudness_dbfs: f64,
}

impl AudioTrack {
    /// Decode `bytes` once to measure duration and loudness
    pub fn measure(bytes: Vec<u8>, codec: &dyn AudioCodec) -> Result<Self, AudioError> {
        let pcm = codec.decode(&bytes)?;
        Ok(Self::from_pcm(bytes, codec.format(), &pcm))
    }

    /// Attach measurements taken from already decoded PCM
    pub fn from_pcm(bytes: Vec<u8>, format: AudioFormat, pcm: &PcmBuffer) -> Self {
        Self {
            bytes,
            format,
            duration_secs: pcm.duration_secs(),
            loudness_dbfs: loudness::dbfs(pcm),
        }
    }
}
