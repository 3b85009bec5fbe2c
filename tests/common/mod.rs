/*!
 * Common test utilities for the rapidclip test suite
 */

use anyhow::Result;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use rapidclip::app_config::Config;
use rapidclip::audio::{AudioCodec, WavCodec};
use rapidclip::errors::AppError;
use rapidclip::providers::mock::{MockImageGenerator, MockSynthesizer, MockTextGenerator, MockTranscriber};
use rapidclip::providers::{Collaborators, GenerationOptions};
use rapidclip::subtitles::Word;
use rapidclip::timeline::{Timeline, VideoRenderer};

/// Narration returned by `scripted_text_generator`
pub const SCRIPT: &str = "Did you know... octopuses have three hearts? Hmm, and blue blood, you know! Haha, nature is wild.";

/// Route library logs to the test output; repeated calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Words with fixed timing, one per `(text, start, end)`
pub fn words(timed: &[(&str, f64, f64)]) -> Vec<Word> {
    timed.iter().map(|(text, start, end)| Word::new(*text, *start, *end)).collect()
}

/// A configuration that passes validation and writes under `output_dir`
pub fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.output_dir = output_dir.to_path_buf();
    config.text.api_key = "sk-test".to_string();
    config.transcription.api_key = "sk-test".to_string();
    config.images.api_key = "r8-test".to_string();
    config.tts.elevenlabs.api_key = "xi-test".to_string();
    config.tts.elevenlabs.voice_id = "voice".to_string();
    config.music.enabled = false;
    config
}

/// Script for narration prompts, a prompt per image, song 1 for music choices
pub fn scripted_text_generator() -> MockTextGenerator {
    MockTextGenerator::working().with_custom_response(|prompt: &str, options: &GenerationOptions| {
        if options.json_response {
            r#"{"reasoning": "Calm piano suits the facts", "id": 1}"#.to_string()
        } else if prompt.contains("narration") {
            SCRIPT.to_string()
        } else {
            "A glowing octopus in a deep blue sea".to_string()
        }
    })
}

/// Mock collaborators around a tone of `narration_secs`
pub struct MockSet {
    pub text: MockTextGenerator,
    pub speech: MockSynthesizer,
    pub transcriber: MockTranscriber,
    pub images: MockImageGenerator,
}

impl MockSet {
    pub fn new(narration_secs: f64) -> Self {
        Self {
            text: scripted_text_generator(),
            speech: MockSynthesizer::tone(narration_secs),
            transcriber: MockTranscriber::from_text(SCRIPT, 0.5),
            images: MockImageGenerator::working(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            text: Arc::new(self.text.clone()),
            speech: Arc::new(self.speech.clone()),
            transcriber: Arc::new(self.transcriber.clone()),
            images: Arc::new(self.images.clone()),
        }
    }
}

/// Renderer that keeps the timelines and writes a marker file
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub timelines: Arc<Mutex<Vec<Timeline>>>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> Vec<Timeline> {
        self.timelines.lock().clone()
    }
}

impl VideoRenderer for RecordingRenderer {
    fn render(&self, timeline: &Timeline, output: &Path) -> Result<(), AppError> {
        fs::write(output, format!("video {:.3}s", timeline.duration))?;
        self.timelines.lock().push(timeline.clone());
        Ok(())
    }
}

/// A one-song library next to a WAV tone of `secs`
pub fn write_music_library(dir: &Path, secs: f64) -> Result<PathBuf> {
    let song = WavCodec.encode(&MockSynthesizer::tone_pcm(secs), 0)?;
    fs::write(dir.join("calm.wav"), song)?;
    create_test_file(
        dir,
        "songs.json",
        r#"[{"id": 1, "file": "calm.wav", "keywords": ["calm", "piano"], "artist": "Test", "source": "test"}]"#,
    )
}
