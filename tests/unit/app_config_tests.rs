/*!
 * Tests for application configuration functionality
 */

use rapidclip::app_config::{Config, LogLevel, TtsProvider};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.language, "en");
    assert_eq!(config.concurrent_requests, 2);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.tts.provider, TtsProvider::ElevenLabs);
    assert_eq!(config.tts.elevenlabs.model_id, "eleven_multilingual_v2");
    assert_eq!(config.tts.elevenlabs.stability, 0.75);
    assert_eq!(config.tts.elevenlabs.similarity_boost, 0.5);
    assert_eq!(config.tts.openai.model, "tts-1-hd");
    assert_eq!(config.text.model, "gpt-4o");
    assert_eq!(config.transcription.model, "whisper-1");
    assert_eq!((config.images.width, config.images.height), (1080, 1920));
    assert_eq!(config.audio.reconcile.bitrate_kbps, 320);
    assert_eq!(config.audio.mix.target_diff_db, -15.0);
    assert_eq!(config.subtitles.max_words_per_cue, 10);
    assert_eq!(config.subtitles.max_chars_per_cue, 40);
    assert_eq!(config.video.canvas.fps, 24);
    assert!(config.audio.max_duration.is_none());
}

#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let temp = common::create_temp_dir().unwrap();
    let mut config = common::test_config(temp.path());
    assert!(config.validate().is_ok());

    config.language = "xx-not-a-language".to_string();
    assert!(config.validate().is_err());
    config.language = "Portuguese".to_string();
    assert!(config.validate().is_ok());

    config.audio.max_duration = Some(0.0);
    assert!(config.validate().is_err());
    config.audio.max_duration = Some(58.0);
    assert!(config.validate().is_ok());

    config.tts.elevenlabs.stability = 1.5;
    assert!(config.validate().is_err());
    config.tts.elevenlabs.stability = 0.75;

    config.subtitles.max_words_per_cue = 0;
    assert!(config.validate().is_err());
    config.subtitles.max_words_per_cue = 10;

    config.concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.concurrent_requests = 1;

    config.tts.elevenlabs.voice_id = " ".to_string();
    assert!(config.validate().is_err());

    // The OpenAI voice needs no voice id
    config.tts.provider = TtsProvider::OpenAI;
    config.tts.openai.api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let temp = common::create_temp_dir().unwrap();
    let path = temp.path().join("nested").join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_create(&path).unwrap(), config);
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() {
    let temp = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        temp.path(),
        "conf.json",
        r#"{"language": "es", "tts": {"provider": "openai"}, "audio": {"max_duration": 45.0}}"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.language, "es");
    assert_eq!(config.tts.provider, TtsProvider::OpenAI);
    assert_eq!(config.audio.max_duration, Some(45.0));
    assert_eq!(config.tts.openai.voice, "alloy");
    assert_eq!(config.output_dir, Config::default().output_dir);
}

#[test]
fn test_ttsProvider_fromStr_shouldAcceptBothSpellings() {
    assert_eq!("elevenlabs".parse::<TtsProvider>().unwrap(), TtsProvider::ElevenLabs);
    assert_eq!("OpenAI".parse::<TtsProvider>().unwrap(), TtsProvider::OpenAI);
    assert!("polly".parse::<TtsProvider>().is_err());
}
