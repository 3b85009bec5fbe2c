/*!
 * Cue segmentation.
 *
 * Groups aligned words into subtitle cues with a greedy single pass that
 * respects a word limit and a character limit per cue.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::subtitles::AlignedWord;

/// Default maximum number of words in one cue
pub const DEFAULT_MAX_WORDS_PER_CUE: usize = 10;

/// Default maximum number of characters in one cue
pub const DEFAULT_MAX_CHARS_PER_CUE: usize = 40;

/// Minimum display time of the last cue, in seconds
pub const DEFAULT_MIN_LAST_CUE_SECS: f64 = 2.0;

// @struct: Timed subtitle unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Display text
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into() }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Limits applied while segmenting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Maximum words per cue
    #[serde(default = "default_max_words_per_cue")]
    pub max_words_per_cue: usize,

    /// Maximum characters per cue, counted on the space-joined text
    #[serde(default = "default_max_chars_per_cue")]
    pub max_chars_per_cue: usize,

    /// The last cue is extended to at least this many seconds
    #[serde(default = "default_min_last_cue_secs")]
    pub min_last_cue_secs: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_words_per_cue: DEFAULT_MAX_WORDS_PER_CUE,
            max_chars_per_cue: DEFAULT_MAX_CHARS_PER_CUE,
            min_last_cue_secs: DEFAULT_MIN_LAST_CUE_SECS,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_words_per_cue == 0 {
            return Err(ConfigError::InvalidCueLimit { name: "max_words_per_cue", value: 0 });
        }
        if self.max_chars_per_cue == 0 {
            return Err(ConfigError::InvalidCueLimit { name: "max_chars_per_cue", value: 0 });
        }
        if !self.min_last_cue_secs.is_finite() || self.min_last_cue_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "min_last_cue_secs",
                reason: format!("must be a non-negative number, got {}", self.min_last_cue_secs),
            });
        }
        Ok(())
    }
}

fn default_max_words_per_cue() -> usize {
    DEFAULT_MAX_WORDS_PER_CUE
}

fn default_max_chars_per_cue() -> usize {
    DEFAULT_MAX_CHARS_PER_CUE
}

fn default_min_last_cue_secs() -> f64 {
    DEFAULT_MIN_LAST_CUE_SECS
}

/// Segment aligned words into cues.
///
/// A word that alone exceeds `max_chars_per_cue` still becomes a cue of its
/// own. After the pass the last cue is stretched to `min_last_cue_secs`.
pub fn segment(words: &[AlignedWord], config: &SegmenterConfig) -> Result<Vec<Cue>, ConfigError> {
    config.validate()?;

    let mut cues = Vec::new();
    let mut buffer: Vec<&AlignedWord> = Vec::with_capacity(config.max_words_per_cue);
    let mut buffer_chars = 0;

    for word in words {
        let word_chars = word.text.chars().count();
        let tentative_chars = if buffer.is_empty() {
            word_chars
        } else {
            buffer_chars + 1 + word_chars
        };

        if buffer.len() + 1 > config.max_words_per_cue || tentative_chars > config.max_chars_per_cue {
            if let Some(cue) = flush(&buffer) {
                cues.push(cue);
            }
            if word_chars > config.max_chars_per_cue {
                debug!("Word {:?} is longer than {} chars, placing it in its own cue", word.text, config.max_chars_per_cue);
            }
            buffer.clear();
            buffer.push(word);
            buffer_chars = word_chars;
        } else {
            buffer.push(word);
            buffer_chars = tentative_chars;
        }
    }

    if let Some(cue) = flush(&buffer) {
        cues.push(cue);
    }

    enforce_min_last_cue(&mut cues, config.min_last_cue_secs);

    Ok(cues)
}

/// Extend the last cue so it lasts at least `min_secs`
pub fn enforce_min_last_cue(cues: &mut [Cue], min_secs: f64) {
    if let Some(last) = cues.last_mut() {
        if last.duration() < min_secs {
            debug!("Extending last cue from {:.3}s to {:.3}s", last.duration(), min_secs);
            last.end = last.start + min_secs;
        }
    }
}

fn flush(buffer: &[&AlignedWord]) -> Option<Cue> {
    let first = buffer.first()?;
    let last = buffer.last()?;
    let text = buffer.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
    Some(Cue::new(first.start, last.end, text))
}
