/*!
 * Subtitle generation from transcriptions.
 *
 * - `alignment`: merges timestamped words with the punctuated transcript
 * - `segmentation`: groups aligned words into cues
 * - `srt`: serializes cues to SRT text
 */

pub mod alignment;
pub mod segmentation;
pub mod srt;

pub use alignment::{align_words, tokenize, AlignedWord, Alignment, Token, Word};
pub use segmentation::{enforce_min_last_cue, segment, Cue, SegmenterConfig};
pub use srt::{format_timestamp, to_srt, write_srt};

/// Align, segment and serialize in one step.
///
/// Returns the cues, the SRT text and the alignment so soft failures stay visible.
pub fn build_subtitles(
    words: &[Word],
    full_text: &str,
    config: &SegmenterConfig,
) -> Result<(Vec<Cue>, String, Alignment), crate::errors::ConfigError> {
    let alignment = align_words(words, full_text);
    let cues = segment(&alignment.words, config)?;
    let srt = to_srt(&cues);
    Ok((cues, srt, alignment))
}
