/*!
 * Integration tests for the offline subtitle workflow
 */

use anyhow::Result;

use rapidclip::file_utils::FileManager;
use rapidclip::providers::Transcript;
use rapidclip::subtitles::{build_subtitles, write_srt, SegmenterConfig};

use crate::common;

const VERBOSE_TRANSCRIPTION: &str = r#"{
    "task": "transcribe",
    "language": "english",
    "duration": 3.2,
    "text": "Hmm... so, the Moon is drifting away! About 3.8 centimeters a year.",
    "words": [
        {"word": "Hmm", "start": 0.0, "end": 0.4},
        {"word": "so", "start": 0.5, "end": 0.7},
        {"word": "the", "start": 0.7, "end": 0.8},
        {"word": "Moon", "start": 0.8, "end": 1.1},
        {"word": "is", "start": 1.1, "end": 1.2},
        {"word": "drifting", "start": 1.2, "end": 1.6},
        {"word": "away", "start": 1.6, "end": 1.9},
        {"word": "About", "start": 2.0, "end": 2.2},
        {"word": "3.8", "start": 2.2, "end": 2.5},
        {"word": "centimeters", "start": 2.5, "end": 2.9},
        {"word": "a", "start": 2.9, "end": 3.0},
        {"word": "year", "start": 3.0, "end": 3.2}
    ]
}"#;

/// Transcription JSON on disk to SRT on disk
#[test]
fn test_subtitle_workflow_withVerboseTranscription_shouldWriteSrt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "transcript.json", VERBOSE_TRANSCRIPTION)?;

    let transcript: Transcript = serde_json::from_str(&FileManager::read_to_string(&input)?)?;
    assert_eq!(transcript.words.len(), 12);
    assert_eq!(transcript.duration, Some(3.2));

    let (cues, _, alignment) = build_subtitles(&transcript.words, &transcript.text, &SegmenterConfig::default())?;

    // "3.8" is two content tokens, so the last words shift and the remainder is merged
    assert_eq!(alignment.words.len(), 12);
    let joined = alignment.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
    assert!(joined.starts_with("Hmm... so, the Moon is drifting away!"));
    assert!(joined.ends_with("year."));

    let output = temp_dir.path().join("moon.srt");
    let mut file = std::fs::File::create(&output)?;
    write_srt(&mut file, &cues)?;
    drop(file);

    let content = FileManager::read_to_string(&output)?;
    assert!(content.starts_with("1\n00:00:00,000 --> "));
    assert_eq!(content.matches(" --> ").count(), cues.len());
    assert!(cues.last().map(|c| c.duration() >= 2.0).unwrap_or(false));
    Ok(())
}

#[test]
fn test_subtitle_workflow_withCustomLimits_shouldProduceMoreCues() -> Result<()> {
    let transcript: Transcript = serde_json::from_str(VERBOSE_TRANSCRIPTION)?;

    let (wide, _, _) = build_subtitles(&transcript.words, &transcript.text, &SegmenterConfig::default())?;
    let narrow_config = SegmenterConfig { max_words_per_cue: 3, max_chars_per_cue: 15, ..Default::default() };
    let (narrow, _, _) = build_subtitles(&transcript.words, &transcript.text, &narrow_config)?;

    assert!(narrow.len() > wide.len());
    assert!(narrow.iter().all(|c| c.word_count() <= 3));
    Ok(())
}
