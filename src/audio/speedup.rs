/*!
 * Chunked overlap-crossfade speed-up.
 *
 * The audio is cut into fixed chunks. From the end of every chunk but the
 * last a slice is dropped, and the shortened chunks are joined with a short
 * crossfade. Pitch is untouched because samples are never resampled, only
 * removed.
 */

use log::debug;

use crate::audio::PcmBuffer;
use crate::errors::AudioError;

/// Chunk arithmetic for one speed factor, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedupPlan {
    /// Audio kept from each chunk before the crossfade overlap is removed
    pub keep_ms: f64,
    /// Audio dropped from the end of each chunk, crossfade included
    pub drop_ms: f64,
    /// Crossfade between consecutive chunks
    pub crossfade_ms: f64,
}

impl SpeedupPlan {
    /// Compute the plan; `None` when the factor is too close to 1.0 to drop anything
    pub fn new(speed: f64, chunk_ms: u32, crossfade_ms: u32) -> Option<Self> {
        if !speed.is_finite() || speed <= 1.0 {
            return None;
        }
        let atk = 1.0 / speed;
        let chunk_ms = chunk_ms as f64;

        let (keep_ms, drop_ms) = if speed < 2.0 {
            (chunk_ms, (chunk_ms * (1.0 - atk) / atk).floor())
        } else {
            ((atk * chunk_ms / (1.0 - atk)).floor(), chunk_ms)
        };

        if drop_ms < 1.0 || keep_ms < 1.0 {
            return None;
        }

        let crossfade_ms = (crossfade_ms as f64).min(drop_ms - 1.0).max(0.0);
        Some(Self { keep_ms, drop_ms, crossfade_ms })
    }

    /// Length of each slice the input is cut into
    pub fn chunk_ms(&self) -> f64 {
        self.keep_ms + self.drop_ms
    }
}

/// Shorten `pcm` by roughly `speed` without changing pitch.
///
/// A factor too close to 1.0 to remove a whole millisecond per chunk returns
/// the input unchanged. Audio shorter than two chunks is an error.
pub fn speedup(pcm: &PcmBuffer, speed: f64, chunk_ms: u32, crossfade_ms: u32) -> Result<PcmBuffer, AudioError> {
    let Some(plan) = SpeedupPlan::new(speed, chunk_ms, crossfade_ms) else {
        debug!("Speed factor {:.4} drops less than 1ms per chunk, leaving audio as is", speed);
        return Ok(pcm.clone());
    };

    let chunk_frames = pcm.frames_for_ms(plan.chunk_ms()).max(1);
    let total = pcm.frames();
    let chunk_count = total.div_ceil(chunk_frames);

    if chunk_count < 2 {
        return Err(AudioError::TooShort {
            duration_secs: pcm.duration_secs(),
            chunk_ms,
            speed,
        });
    }

    let crossfade_frames = pcm.frames_for_ms(plan.crossfade_ms);
    let trim_frames = pcm.frames_for_ms(plan.drop_ms - plan.crossfade_ms);

    debug!(
        "Speeding up {:.2}s by {:.3}x: {} chunks of {}ms, dropping {}ms, {}ms crossfade",
        pcm.duration_secs(), speed, chunk_count, plan.chunk_ms(), plan.drop_ms, plan.crossfade_ms
    );

    let kept = |index: usize| {
        let start = index * chunk_frames;
        pcm.slice_frames(start, start + chunk_frames - trim_frames.min(chunk_frames))
    };

    let mut out = kept(0);
    for index in 1..chunk_count - 1 {
        out = crossfade_append(&out, &kept(index), crossfade_frames)?;
    }

    let last = pcm.slice_frames((chunk_count - 1) * chunk_frames, total);
    out.append(&last)?;

    Ok(out)
}

/// Join two buffers, overlapping `crossfade` frames with linear fades
pub fn crossfade_append(first: &PcmBuffer, second: &PcmBuffer, crossfade: usize) -> Result<PcmBuffer, AudioError> {
    first.ensure_same_format(second)?;
    let crossfade = crossfade.min(first.frames()).min(second.frames());
    if crossfade == 0 {
        let mut joined = first.clone();
        joined.append(second)?;
        return Ok(joined);
    }

    let ch = first.channels as usize;
    let head = first.frames() - crossfade;
    let mut samples = Vec::with_capacity((first.frames() + second.frames() - crossfade) * ch);
    samples.extend_from_slice(&first.samples[..head * ch]);

    for i in 0..crossfade {
        let fade_in = i as f32 / crossfade as f32;
        let fade_out = 1.0 - fade_in;
        for c in 0..ch {
            let a = first.samples[(head + i) * ch + c];
            let b = second.samples[i * ch + c];
            samples.push((a * fade_out + b * fade_in).clamp(-1.0, 1.0));
        }
    }

    samples.extend_from_slice(&second.samples[crossfade * ch..]);
    Ok(PcmBuffer::new(first.sample_rate, first.channels, samples))
}
