/*!
 * Word/punctuation alignment.
 *
 * Transcription services return two views of the same speech: a list of
 * timestamped words without punctuation and the full punctuated text. This
 * module merges them so each timed word carries the punctuation that follows it.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AlignmentDegraded;

// @const: Word runs or runs of non-space punctuation, in text order
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+|[^\w\s]+").expect("token pattern is valid")
});

// @struct: Raw transcription word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    // @field: Word text as transcribed
    #[serde(alias = "word")]
    pub text: String,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self { text: text.into(), start, end }
    }
}

// @struct: Timed word with its trailing punctuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedWord {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl AlignedWord {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into() }
    }
}

/// A transcript token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A maximal run of word characters
    Content(String),
    /// A maximal run of other non-whitespace characters
    Punctuation(String),
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Content(s) | Self::Punctuation(s) => s,
        }
    }

    pub fn is_punctuation(&self) -> bool {
        matches!(self, Self::Punctuation(_))
    }
}

/// Aligner output: one word per input word plus every soft fallback taken
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub words: Vec<AlignedWord>,
    pub degraded: Vec<AlignmentDegraded>,
}

impl Alignment {
    /// Whether every word was matched to a transcript token
    pub fn is_exact(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Split text into content and punctuation tokens, preserving order
pub fn tokenize(text: &str) -> Vec<Token> {
    TOKEN_REGEX
        .find_iter(text)
        .map(|m| {
            let s = m.as_str();
            if s.chars().next().is_some_and(is_word_char) {
                Token::Content(s.to_string())
            } else {
                Token::Punctuation(s.to_string())
            }
        })
        .collect()
}

/// Align timestamped words with the punctuated transcript.
///
/// Matching is positional: the n-th content token is taken as the text of
/// the n-th word. A punctuation token directly after a content token is
/// appended to that word. Tokens left after the last word are merged into it.
pub fn align_words(words: &[Word], full_text: &str) -> Alignment {
    let tokens = tokenize(full_text);
    let mut cursor = 0;
    let mut alignment = Alignment {
        words: Vec::with_capacity(words.len()),
        degraded: Vec::new(),
    };

    for (position, word) in words.iter().enumerate() {
        let mut matched: Option<String> = None;

        while cursor < tokens.len() {
            let token = &tokens[cursor];
            cursor += 1;
            if let Token::Content(content) = token {
                let mut text = content.clone();
                if let Some(Token::Punctuation(punct)) = tokens.get(cursor) {
                    text.push_str(punct);
                    cursor += 1;
                }
                matched = Some(text);
                break;
            }
        }

        let text = match matched {
            Some(text) => text,
            None => {
                let raw_text = word.text.trim().to_string();
                let degraded = AlignmentDegraded { position, raw_text: raw_text.clone() };
                warn!("{}", degraded);
                alignment.degraded.push(degraded);
                raw_text
            }
        };

        alignment.words.push(AlignedWord::new(word.start, word.end, text));
    }

    if cursor < tokens.len() {
        let remainder = join_tokens(&tokens[cursor..]);
        match alignment.words.last_mut() {
            Some(last) => {
                debug!("Merging {} leftover transcript token(s) into last word: {:?}", tokens.len() - cursor, remainder);
                let needs_space = last.text.chars().last().is_some_and(is_word_char)
                    && remainder.chars().next().is_some_and(is_word_char);
                if needs_space {
                    last.text.push(' ');
                }
                last.text.push_str(&remainder);
            }
            None => {
                warn!("No words to attach leftover transcript text to, dropping {:?}", remainder);
            }
        }
    }

    alignment
}

// Space-joined, with no space before punctuation tokens
fn join_tokens(tokens: &[Token]) -> String {
    let mut joined = String::new();
    for token in tokens {
        if !joined.is_empty() && !token.is_punctuation() {
            joined.push(' ');
        }
        joined.push_str(token.as_str());
    }
    joined
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
