/*!
 * # RapidClip - short narrated videos from a theme
 *
 * A Rust library that turns a theme into a vertical video: an AI-written
 * narration, word-timed subtitles, generated slot images, optional
 * background music and an optional watermark.
 *
 * ## Features
 *
 * - Word/punctuation alignment of machine transcriptions
 * - Subtitle cue segmentation under word and character limits
 * - SRT serialization
 * - Narration speed-up to fit a maximum duration
 * - Loudness-relative background music mixing
 * - Timeline assembly with zoom, fades, subtitles and watermark
 * - Collaborators for OpenAI, ElevenLabs and Replicate
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitles`: Alignment, segmentation and SRT output
 * - `audio`: Codecs, loudness, speed-up and music mixing
 * - `timeline`: Slot planning, composition and ffmpeg rendering
 * - `providers`: Text, speech, transcription and image collaborators
 * - `music_library`: Song catalogue and model-driven choice
 * - `prompts`: Prompt templates
 * - `app_controller`: Request orchestration
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations and artifact storage
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod music_library;
pub mod prompts;
pub mod providers;
pub mod subtitles;
pub mod timeline;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{ClipOutput, ClipRequest, Controller, RequestContext};
pub use errors::{AppError, AudioError, ConfigError, ProviderError, TimelineError};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use subtitles::{build_subtitles, AlignedWord, Cue, SegmenterConfig, Word};
pub use timeline::{Timeline, TimelineAssembler};
