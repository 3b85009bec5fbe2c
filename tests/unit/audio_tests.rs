/*!
 * Tests for narration duration reconciliation and background music mixing
 */

use std::sync::Arc;

use rapidclip::audio::mixer::loop_to_length;
use rapidclip::audio::{
    AudioCodec, BackgroundMusicMixer, DurationReconciler, MixConfig, PcmBuffer, ReconcileConfig, WavCodec,
};
use rapidclip::errors::{AppError, ConfigError};
use rapidclip::providers::mock::MockSynthesizer;

fn reconciler() -> DurationReconciler {
    DurationReconciler::new(Arc::new(WavCodec), ReconcileConfig::default())
}

fn wav(secs: f64) -> Vec<u8> {
    WavCodec.encode(&MockSynthesizer::tone_pcm(secs), 0).unwrap()
}

#[test]
fn test_reconcile_withoutMaxDuration_shouldReturnSameBytes() {
    let result = reconciler().reconcile(b"ABC", None).unwrap();
    assert_eq!(result.into_bytes(), b"ABC".to_vec());
}

#[test]
fn test_reconcile_withShortAudio_shouldReturnSameBytes() {
    let audio = wav(3.0);
    let result = reconciler().reconcile(&audio, Some(5.0)).unwrap();

    assert!(!result.is_rewritten());
    assert_eq!(result.bytes.as_ref(), audio.as_slice());
    assert!((result.original_duration.unwrap() - 3.0).abs() < 1e-3);
    assert!(result.speed_factor.is_none());
}

#[test]
fn test_reconcile_withExactMaxDuration_shouldNotRewrite() {
    let audio = wav(4.0);
    let result = reconciler().reconcile(&audio, Some(4.0)).unwrap();
    assert!(!result.is_rewritten());
}

#[test]
fn test_reconcile_withLongAudio_shouldSpeedUpNearMax() {
    let audio = wav(12.0);
    let result = reconciler().reconcile(&audio, Some(8.0)).unwrap();

    assert!(result.is_rewritten());
    assert!((result.speed_factor.unwrap() - 1.5).abs() < 1e-9);

    let sped_up = WavCodec.decode(&result.into_bytes()).unwrap();
    assert!(sped_up.duration_secs() < 12.0);
    assert!((sped_up.duration_secs() - 8.0).abs() < 1.0, "got {}", sped_up.duration_secs());
}

#[test]
fn test_reconcile_withNegativeMax_shouldBeConfigError() {
    let input = wav(1.0);
    let result = reconciler().reconcile(&input, Some(-2.0));
    assert!(matches!(result, Err(AppError::Config(ConfigError::InvalidMaxDuration(_)))));
}

/// Narration 30s with a 10s song: three loops cut to exactly 30s
#[test]
fn test_mixPcm_with30sNarrationAnd10sMusic_shouldLoopThreeTimes() {
    let narration = MockSynthesizer::tone_pcm(30.0);
    let music = MockSynthesizer::tone_pcm(10.0);
    let mixer = BackgroundMusicMixer::new(Arc::new(WavCodec), MixConfig::default());

    let (mixed, report) = mixer.mix_pcm(&narration, &music).unwrap();

    assert_eq!(report.repeats, 3);
    assert_eq!(mixed.frames(), narration.frames());
    assert!((mixed.duration_secs() - 30.0).abs() < 1e-9);
}

#[test]
fn test_mix_withEncodedInputs_shouldMeasureNarrationLength() {
    let mixer = BackgroundMusicMixer::new(Arc::new(WavCodec), MixConfig::default());
    let track = mixer.mix(&wav(6.0), &wav(2.5)).unwrap();

    assert!((track.duration_secs - 6.0).abs() < 1e-3);
    assert!(track.loudness_dbfs < 0.0);
    assert_eq!(WavCodec.decode(&track.bytes).unwrap().frames(), MockSynthesizer::tone_pcm(6.0).frames());
}

#[test]
fn test_loopToLength_withLongerMusic_shouldTruncateWithoutRepeat() {
    let music = PcmBuffer::new(8000, 1, vec![0.1; 8000 * 5]);
    let (fitted, repeats) = loop_to_length(&music, 8000 * 2);

    assert_eq!(repeats, 1);
    assert_eq!(fitted.frames(), 8000 * 2);
}
