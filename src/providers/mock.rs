/*!
 * Mock collaborators for testing.
 *
 * Deterministic stand-ins for every provider trait:
 * - `MockTextGenerator` - canned or custom completions, records prompts
 * - `MockSynthesizer` - a sine tone WAV of fixed length
 * - `MockTranscriber` - evenly timed words built from a known text
 * - `MockImageGenerator` - small placeholder image bytes
 * Each has a `failing()` variant.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::audio::{AudioCodec, PcmBuffer, WavCodec};
use crate::errors::ProviderError;
use crate::providers::{GenerationOptions, ImageGenerator, Synthesizer, TextGenerator, Transcriber, Transcript};
use crate::subtitles::{tokenize, Token, Word};

/// Sample rate of the synthesized tone
pub const MOCK_SAMPLE_RATE: u32 = 8000;

/// Placeholder image prefix (PNG signature)
pub const MOCK_IMAGE_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn simulated_failure(what: &str) -> ProviderError {
    ProviderError::ApiError {
        message: format!("Simulated {} failure", what),
        status_code: 500,
    }
}

/// Mock text generator
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    /// Fail every request
    failing: bool,
    /// Prompts received, shared between clones
    prompts: Arc<Mutex<Vec<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str, &GenerationOptions) -> String>,
}

impl MockTextGenerator {
    /// Answers plain prompts with `Mock text #n` and JSON prompts with a music choice of id 1
    pub fn working() -> Self {
        Self {
            failing: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::working() }
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str, &GenerationOptions) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ProviderError> {
        let count = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if self.failing {
            return Err(simulated_failure("text generation"));
        }
        if let Some(generator) = self.custom_response {
            return Ok(generator(prompt, options));
        }
        if options.json_response {
            return Ok(r#"{"reasoning": "Mock choice", "id": 1}"#.to_string());
        }
        Ok(format!("Mock text #{}", count))
    }
}

/// Mock synthesizer producing a WAV tone
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    failing: bool,
    duration_secs: f64,
    /// Texts received, shared between clones
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockSynthesizer {
    /// Every call returns a WAV tone of `duration_secs`
    pub fn tone(duration_secs: f64) -> Self {
        Self {
            failing: false,
            duration_secs,
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::tone(1.0) }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    /// Mono 440 Hz tone at half scale
    pub fn tone_pcm(duration_secs: f64) -> PcmBuffer {
        let frames = (duration_secs * MOCK_SAMPLE_RATE as f64).round() as usize;
        let samples = (0..frames)
            .map(|i| 0.5 * (i as f32 * 440.0 * std::f32::consts::TAU / MOCK_SAMPLE_RATE as f32).sin())
            .collect();
        PcmBuffer::new(MOCK_SAMPLE_RATE, 1, samples)
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        self.texts.lock().push(text.to_string());
        if self.failing {
            return Err(simulated_failure("speech synthesis"));
        }
        WavCodec
            .encode(&Self::tone_pcm(self.duration_secs), 0)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }
}

/// Mock transcriber returning a fixed transcript
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    failing: bool,
    transcript: Transcript,
    request_count: Arc<AtomicUsize>,
}

impl MockTranscriber {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            failing: false,
            transcript,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// One word per content token of `text`, each `secs_per_word` long
    pub fn from_text(text: &str, secs_per_word: f64) -> Self {
        let words: Vec<Word> = tokenize(text)
            .into_iter()
            .filter_map(|token| match token {
                Token::Content(word) => Some(word.to_lowercase()),
                Token::Punctuation(_) => None,
            })
            .enumerate()
            .map(|(i, word)| Word::new(word, i as f64 * secs_per_word, (i + 1) as f64 * secs_per_word))
            .collect();
        let duration = words.last().map(|w| w.end);
        Self::new(Transcript { text: text.to_string(), words, duration })
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::new(Transcript::default()) }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8], _file_name: &str) -> Result<Transcript, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(simulated_failure("transcription"));
        }
        Ok(self.transcript.clone())
    }
}

/// Mock image generator
#[derive(Debug, Clone)]
pub struct MockImageGenerator {
    /// Fail from this call index on (0-based)
    fail_from: Option<usize>,
    /// Prompts and sizes received, shared between clones
    requests: Arc<Mutex<Vec<(String, u32, u32)>>>,
}

impl MockImageGenerator {
    pub fn working() -> Self {
        Self { fail_from: None, requests: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn failing() -> Self {
        Self::failing_from(0)
    }

    /// Succeeds for the first `successes` calls, then fails
    pub fn failing_from(successes: usize) -> Self {
        Self { fail_from: Some(successes), ..Self::working() }
    }

    pub fn requests(&self) -> Vec<(String, u32, u32)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>, ProviderError> {
        let index = {
            let mut requests = self.requests.lock();
            requests.push((prompt.to_string(), width, height));
            requests.len() - 1
        };

        if self.fail_from.is_some_and(|from| index >= from) {
            return Err(simulated_failure("image generation"));
        }
        let mut image = MOCK_IMAGE_HEADER.to_vec();
        image.extend_from_slice(format!("{}x{}:{}", width, height, index).as_bytes());
        Ok(image)
    }
}
