/*!
 * Background music mixing.
 *
 * Music is leveled against the narration, converted to the narration's
 * sample format, looped or cut to the narration's exact length and summed
 * under it. The narration length is authoritative.
 */

use std::sync::Arc;

use log::{debug, info, warn};
use rubato::{FftFixedIn, Resampler};
use serde::{Deserialize, Serialize};

use crate::audio::{loudness, AudioCodec, AudioTrack, PcmBuffer};
use crate::errors::AudioError;

const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Mixer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixConfig {
    /// Music level relative to narration in dB
    #[serde(default = "default_target_diff_db")]
    pub target_diff_db: f64,

    /// Bitrate of the mixed output
    #[serde(default = "crate::audio::reconcile::default_bitrate_kbps")]
    pub bitrate_kbps: u32,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            target_diff_db: default_target_diff_db(),
            bitrate_kbps: crate::audio::reconcile::default_bitrate_kbps(),
        }
    }
}

fn default_target_diff_db() -> f64 {
    -15.0
}

/// What the mixer did to the music
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixReport {
    /// Gain applied to the music in dB
    pub gain_db: f64,
    /// Times the music buffer was repeated (1 when it was only cut)
    pub repeats: usize,
}

#[derive(Debug, Clone)]
pub struct BackgroundMusicMixer {
    codec: Arc<dyn AudioCodec>,
    config: MixConfig,
}

impl BackgroundMusicMixer {
    pub fn new(codec: Arc<dyn AudioCodec>, config: MixConfig) -> Self {
        Self { codec, config }
    }

    /// Decode both inputs, mix them and encode the result
    pub fn mix(&self, narration: &[u8], music: &[u8]) -> Result<AudioTrack, AudioError> {
        let narration = self.codec.decode(narration)?;
        let music = self.codec.decode(music)?;

        let (mixed, report) = self.mix_pcm(&narration, &music)?;
        info!(
            "Mixed background music at {:+.1} dB, {} repeat(s), {:.2}s",
            report.gain_db,
            report.repeats,
            mixed.duration_secs()
        );

        let bytes = self.codec.encode(&mixed, self.config.bitrate_kbps)?;
        Ok(AudioTrack::from_pcm(bytes, self.codec.format(), &mixed))
    }

    /// Mix decoded buffers; the output has the narration's format and length
    pub fn mix_pcm(&self, narration: &PcmBuffer, music: &PcmBuffer) -> Result<(PcmBuffer, MixReport), AudioError> {
        if music.is_empty() {
            return Err(AudioError::Empty("background music".to_string()));
        }

        let narration_db = loudness::dbfs(narration);
        let music_db = loudness::dbfs(music);
        let gain_db = match loudness::relative_gain(self.config.target_diff_db, music_db, narration_db) {
            Some(gain) => gain,
            None => {
                warn!(
                    "Cannot level silent audio (narration {:.1} dBFS, music {:.1} dBFS), using 0 dB gain",
                    narration_db, music_db
                );
                0.0
            }
        };
        debug!(
            "Narration {:.1} dBFS, music {:.1} dBFS, applying {:+.1} dB",
            narration_db, music_db, gain_db
        );

        let mut leveled = loudness::apply_gain(music, gain_db).with_channels(narration.channels);
        if leveled.sample_rate != narration.sample_rate {
            leveled = resample(&leveled, narration.sample_rate)?;
        }

        let (fitted, repeats) = loop_to_length(&leveled, narration.frames());

        let samples = narration
            .samples
            .iter()
            .zip(fitted.samples.iter())
            .map(|(a, b)| (a + b).clamp(-1.0, 1.0))
            .collect();
        let mixed = PcmBuffer::new(narration.sample_rate, narration.channels, samples);

        Ok((mixed, MixReport { gain_db, repeats }))
    }
}

/// Repeat `pcm` whole until it covers `frames`, then cut to exactly `frames`.
///
/// Returns the buffer and the number of copies used.
pub fn loop_to_length(pcm: &PcmBuffer, frames: usize) -> (PcmBuffer, usize) {
    let available = pcm.frames();
    if available == 0 || frames == 0 {
        return (PcmBuffer::silence(pcm.sample_rate, pcm.channels, frames), 0);
    }

    let repeats = frames.div_ceil(available);
    let mut samples = Vec::with_capacity(repeats * pcm.samples.len());
    for _ in 0..repeats {
        samples.extend_from_slice(&pcm.samples);
    }

    let mut looped = PcmBuffer::new(pcm.sample_rate, pcm.channels, samples);
    looped.truncate_frames(frames);
    (looped, repeats)
}

/// Convert `pcm` to `target_rate` with an FFT resampler
pub fn resample(pcm: &PcmBuffer, target_rate: u32) -> Result<PcmBuffer, AudioError> {
    if pcm.sample_rate == target_rate || pcm.is_empty() {
        return Ok(PcmBuffer::new(target_rate, pcm.channels, pcm.samples.clone()));
    }

    let channels = pcm.channels as usize;
    let planes = pcm.deinterleave();
    let frames = pcm.frames();

    let mut resampler = FftFixedIn::<f32>::new(
        pcm.sample_rate as usize,
        target_rate as usize,
        RESAMPLE_CHUNK_FRAMES,
        2,
        channels,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let mut out: Vec<Vec<f32>> = vec![Vec::new(); channels];
    let mut extend = |processed: Vec<Vec<f32>>| {
        for (plane, chunk) in out.iter_mut().zip(processed) {
            plane.extend(chunk);
        }
    };

    let mut position = 0;
    while position + resampler.input_frames_next() <= frames {
        let next = resampler.input_frames_next();
        let input: Vec<&[f32]> = planes.iter().map(|p| &p[position..position + next]).collect();
        let processed = resampler
            .process(&input, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        extend(processed);
        position += next;
    }

    if position < frames {
        let input: Vec<&[f32]> = planes.iter().map(|p| &p[position..]).collect();
        let processed = resampler
            .process_partial(Some(&input), None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        extend(processed);
    }

    // flush the filter delay
    let processed = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    extend(processed);

    let delay = resampler.output_delay();
    let expected = (frames as f64 * target_rate as f64 / pcm.sample_rate as f64).round() as usize;
    let trimmed: Vec<Vec<f32>> = out
        .into_iter()
        .map(|plane| plane.into_iter().skip(delay).take(expected).collect())
        .collect();

    debug!(
        "Resampled {} frames at {} Hz into {} frames at {} Hz",
        frames,
        pcm.sample_rate,
        trimmed.first().map(Vec::len).unwrap_or(0),
        target_rate
    );
    Ok(PcmBuffer::interleave(target_rate, &trimmed))
}
