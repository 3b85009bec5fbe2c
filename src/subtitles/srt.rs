use std::io::Write;

use anyhow::{Context, Result};

use crate::subtitles::Cue;

// @module: SRT serialization

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Hours do not wrap at 24. The fractional second is truncated to
/// milliseconds, so 2.3 renders as `00:00:02,299`.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let whole = seconds.trunc();
    let total_secs = whole as u64;
    let millis = (((seconds - whole) * 1000.0) as u64).min(999);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Serialize cues to SRT text, numbering from 1
pub fn to_srt(cues: &[Cue]) -> String {
    let mut content = String::new();
    for (i, cue) in cues.iter().enumerate() {
        content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        ));
    }
    content
}

/// Write cues as SRT to any writer
pub fn write_srt<W: Write>(writer: &mut W, cues: &[Cue]) -> Result<()> {
    writer
        .write_all(to_srt(cues).as_bytes())
        .context("Failed to write SRT content")?;
    Ok(())
}
