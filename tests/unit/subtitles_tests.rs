/*!
 * Tests for word alignment, cue segmentation and SRT output
 */

use rapidclip::subtitles::{
    align_words, build_subtitles, enforce_min_last_cue, segment, tokenize, to_srt, AlignedWord, Cue, SegmenterConfig,
    Token,
};
use rapidclip::errors::ConfigError;

use crate::common;

fn content_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter_map(|t| match t {
            Token::Content(s) => Some(s),
            Token::Punctuation(_) => None,
        })
        .collect()
}

/// Aligning then joining keeps the transcript's content tokens in order
#[test]
fn test_alignWords_withMatchingOrder_shouldReproduceContentTokens() {
    let text = "Well... this is, hmm, a tiny test! Right?";
    let words = common::words(&[
        ("well", 0.0, 0.3),
        ("this", 0.3, 0.5),
        ("is", 0.5, 0.6),
        ("hmm", 0.6, 0.9),
        ("a", 0.9, 1.0),
        ("tiny", 1.0, 1.3),
        ("test", 1.3, 1.6),
        ("right", 1.6, 2.0),
    ]);

    let alignment = align_words(&words, text);
    let joined = alignment.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");

    assert!(alignment.is_exact());
    assert_eq!(alignment.words.len(), words.len());
    assert_eq!(content_tokens(&joined), content_tokens(text));
    assert_eq!(alignment.words[0].text, "Well...");
    assert_eq!(alignment.words[7].text, "Right?");
}

#[test]
fn test_alignWords_withHelloExample_shouldKeepTiming() {
    let words = common::words(&[("hello", 0.0, 0.5)]);
    let alignment = align_words(&words, "Hello!");
    assert_eq!(alignment.words, vec![AlignedWord::new(0.0, 0.5, "Hello!")]);
}

#[test]
fn test_alignWords_withMoreWordsThanTokens_shouldDegradeToRawText() {
    let words = common::words(&[("one", 0.0, 0.5), ("two", 0.5, 1.0)]);
    let alignment = align_words(&words, "One.");

    assert_eq!(alignment.words[0].text, "One.");
    assert_eq!(alignment.words[1].text, "two");
    assert_eq!(alignment.degraded.len(), 1);
    assert_eq!(alignment.degraded[0].position, 1);
}

#[test]
fn test_alignWords_withLeftoverTokens_shouldMergeIntoLastWord() {
    let words = common::words(&[("so", 0.0, 0.5)]);
    let alignment = align_words(&words, "So, it goes.");

    assert_eq!(alignment.words.len(), 1);
    assert_eq!(alignment.words[0].text, "So,it goes.");
}

#[test]
fn test_alignWords_withLeftoverAfterPunctuation_shouldNotInsertSpace() {
    let words = common::words(&[("hello", 0.0, 0.5)]);
    let alignment = align_words(&words, "Hello, world");

    assert_eq!(alignment.words, vec![AlignedWord::new(0.0, 0.5, "Hello,world")]);
}

#[test]
fn test_alignWords_withNoWords_shouldBeEmpty() {
    let alignment = align_words(&[], "Nothing was timed.");
    assert!(alignment.words.is_empty());
}

/// Every cue honors both limits unless it is a single oversized word
#[test]
fn test_segment_withLongText_shouldRespectLimits() {
    let config = SegmenterConfig { max_words_per_cue: 4, max_chars_per_cue: 20, ..Default::default() };
    let text = "a quick brown fox jumps over the incomprehensibilities of lazy dogs at dawn";
    let aligned: Vec<AlignedWord> = text
        .split_whitespace()
        .enumerate()
        .map(|(i, w)| AlignedWord::new(i as f64 * 0.4, (i + 1) as f64 * 0.4, w))
        .collect();

    let cues = segment(&aligned, &config).unwrap();

    for cue in &cues {
        let oversized_single = cue.word_count() == 1 && cue.text.chars().count() > config.max_chars_per_cue;
        assert!(cue.word_count() <= config.max_words_per_cue, "{:?}", cue);
        assert!(cue.text.chars().count() <= config.max_chars_per_cue || oversized_single, "{:?}", cue);
    }
    assert!(cues.iter().any(|c| c.text == "incomprehensibilities"));
    let rejoined = cues.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    assert_eq!(rejoined, text);
}

#[test]
fn test_segment_shouldKeepCuesOrderedAndDisjoint() {
    let aligned: Vec<AlignedWord> = (0..25)
        .map(|i| AlignedWord::new(i as f64 * 0.3, i as f64 * 0.3 + 0.25, format!("w{}", i)))
        .collect();

    let cues = segment(&aligned, &SegmenterConfig::default()).unwrap();

    for pair in cues.windows(2) {
        assert!(pair[0].start <= pair[1].start);
        assert!(pair[0].end <= pair[1].start);
    }
    assert!(cues.last().unwrap().duration() >= 2.0);
}

#[test]
fn test_enforceMinLastCue_withShortLastCue_shouldExtendTo2s() {
    let mut cues = vec![Cue::new(0.0, 1.0, "a"), Cue::new(1.0, 2.0, "b"), Cue::new(2.0, 2.3, "c")];
    enforce_min_last_cue(&mut cues, 2.0);
    assert_eq!(cues[2], Cue::new(2.0, 4.0, "c"));
    assert_eq!(cues[1], Cue::new(1.0, 2.0, "b"));
}

#[test]
fn test_segment_withZeroCharLimit_shouldBeConfigError() {
    let config = SegmenterConfig { max_chars_per_cue: 0, ..Default::default() };
    let result = segment(&[AlignedWord::new(0.0, 1.0, "x")], &config);
    assert!(matches!(result, Err(ConfigError::InvalidCueLimit { .. })));
}

#[test]
fn test_toSrt_withTwoCues_shouldNumberFromOne() {
    let srt = to_srt(&[Cue::new(0.0, 1.5, "Hello there."), Cue::new(1.5, 3.5, "General Kenobi!")]);
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:01,500\nHello there.\n\n2\n00:00:01,500 --> 00:00:03,500\nGeneral Kenobi!\n\n"
    );
}

#[test]
fn test_toSrt_withDecimalTimes_shouldTruncateFractionalMilliseconds() {
    // 2.3 - 2 is 0.29999... in binary floating point
    let srt = to_srt(&[Cue::new(2.3, 4.5, "c")]);
    assert!(srt.contains("00:00:02,299 --> 00:00:04,500"));
}

#[test]
fn test_buildSubtitles_withHelloExample_shouldExtendShortCue() {
    let words = common::words(&[("hello", 0.0, 0.5)]);
    let (cues, srt, alignment) = build_subtitles(&words, "Hello!", &SegmenterConfig::default()).unwrap();

    assert!(alignment.is_exact());
    assert_eq!(cues, vec![Cue::new(0.0, 2.0, "Hello!")]);
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,000\nHello!"));
}
