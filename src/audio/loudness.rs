use crate::audio::PcmBuffer;

// @module: Loudness measurement and gain

/// RMS level of all samples
pub fn rms(pcm: &PcmBuffer) -> f64 {
    if pcm.samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = pcm.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / pcm.samples.len() as f64).sqrt()
}

/// Loudness in dB relative to full scale; silence is negative infinity
pub fn dbfs(pcm: &PcmBuffer) -> f64 {
    let level = rms(pcm);
    if level == 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * level.log10()
}

/// Amplitude factor for a gain in dB
pub fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Scale every sample by `db`, clipping at full scale
pub fn apply_gain(pcm: &PcmBuffer, db: f64) -> PcmBuffer {
    let factor = db_to_amplitude(db) as f32;
    let samples = pcm.samples.iter().map(|&s| (s * factor).clamp(-1.0, 1.0)).collect();
    PcmBuffer::new(pcm.sample_rate, pcm.channels, samples)
}

/// Gain that places music `target_diff_db` relative to narration.
///
/// `None` when either level is silent.
pub fn relative_gain(target_diff_db: f64, music_dbfs: f64, narration_dbfs: f64) -> Option<f64> {
    if !music_dbfs.is_finite() || !narration_dbfs.is_finite() {
        return None;
    }
    Some(target_diff_db - (music_dbfs - narration_dbfs))
}
