/*!
 * Tests for slot planning, timeline assembly and the ffmpeg command line
 */

use std::path::PathBuf;

use rapidclip::audio::{AudioFormat, AudioTrack};
use rapidclip::errors::{AppError, TimelineError};
use rapidclip::subtitles::Cue;
use rapidclip::timeline::{final_duration, plan_slots, required_images, FfmpegRenderer, RenderPaths, TimelineAssembler};

fn cues(count: usize) -> Vec<Cue> {
    (0..count).map(|i| Cue::new(i as f64 * 2.0, i as f64 * 2.0 + 2.0, format!("cue {}", i))).collect()
}

fn audio(secs: f64) -> AudioTrack {
    AudioTrack { bytes: vec![0; 16], format: AudioFormat::Mp3, duration_secs: secs, loudness_dbfs: -20.0 }
}

fn images(count: usize) -> Vec<PathBuf> {
    (0..count).map(|i| PathBuf::from(format!("img_{}.png", i + 1))).collect()
}

#[test]
fn test_requiredImages_shouldBeCeilOfHalfWithMinimumOne() {
    assert_eq!(required_images(0), 1);
    assert_eq!(required_images(1), 1);
    assert_eq!(required_images(2), 1);
    assert_eq!(required_images(5), 3);
    assert_eq!(required_images(6), 3);
}

#[test]
fn test_planSlots_withFiveCues_shouldPairCues() {
    let plans = plan_slots(&cues(5));

    assert_eq!(plans.len(), 3);
    assert!(plans[0].is_background());
    assert_eq!(plans[0].text, "cue 0 cue 1");
    assert_eq!(plans[1].cues, 2..4);
    assert_eq!((plans[1].start, plans[1].end), (4.0, Some(8.0)));
    assert_eq!(plans[2].cues, 4..5);
    assert_eq!(plans[2].end, Some(10.0));
}

#[test]
fn test_finalDuration_withSubtitlesPastAudio_shouldFollowSubtitles() {
    assert_eq!(final_duration(9.0, &cues(5), None), 10.0);
    assert_eq!(final_duration(12.0, &cues(5), None), 12.0);
    assert_eq!(final_duration(12.0, &cues(5), Some(7.5)), 7.5);
}

#[test]
fn test_assemble_shouldSpanBackgroundOverWholeVideo() {
    let timeline = TimelineAssembler::default()
        .assemble(audio(9.0), &images(3), &cues(5), Some("  @channel "), None)
        .unwrap();

    assert_eq!(timeline.slot_count(), 3);
    assert_eq!(timeline.duration, 10.0);
    assert!(timeline.background.duration.is_none());
    assert!(timeline.background.fade.is_none());
    assert_eq!(timeline.overlays[0].duration, Some(4.0));
    assert_eq!(timeline.overlays[0].fade.unwrap().fade_in, 0.5);
    assert_eq!(timeline.watermark.as_ref().unwrap().text, "@channel");
    assert_eq!(timeline.subtitles.y, 1620);
}

#[test]
fn test_assemble_withWrongImageCount_shouldFail() {
    let result = TimelineAssembler::default().assemble(audio(9.0), &images(2), &cues(5), None, None);
    assert!(matches!(
        result,
        Err(AppError::Timeline(TimelineError::ImageCountMismatch { expected: 3, actual: 2 }))
    ));
}

#[test]
fn test_assemble_withNoCues_shouldUseSingleBackground() {
    let timeline = TimelineAssembler::default().assemble(audio(4.0), &images(1), &[], Some("   "), None).unwrap();

    assert_eq!(timeline.slot_count(), 1);
    assert_eq!(timeline.duration, 4.0);
    assert!(timeline.watermark.is_none());
}

#[test]
fn test_buildArgs_shouldInputEverySlotThenAudio() {
    let timeline = TimelineAssembler::default()
        .assemble(audio(9.0), &images(3), &cues(5), Some("wm"), None)
        .unwrap();
    let paths = RenderPaths {
        audio: PathBuf::from("/tmp/a.mp3"),
        subtitles: PathBuf::from("/tmp/s.srt"),
        output: PathBuf::from("/tmp/out.mp4"),
    };

    let args = FfmpegRenderer::build_args(&timeline, &paths);

    let inputs: Vec<&String> = args.windows(2).filter(|w| w[0] == "-i").map(|w| &w[1]).collect();
    assert_eq!(inputs, vec!["img_1.png", "img_2.png", "img_3.png", "/tmp/a.mp3"]);
    assert!(args.iter().any(|a| a == "3:a"));
    assert_eq!(args.last().unwrap(), "/tmp/out.mp4");

    let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
    assert!(graph.contains("subtitles="));
    assert!(graph.contains("drawtext="));
    assert!(graph.ends_with("[vout]"));
}
