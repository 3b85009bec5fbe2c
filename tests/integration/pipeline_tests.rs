/*!
 * End-to-end pipeline tests with mock collaborators, the WAV codec and a
 * recording renderer
 */

use indicatif::{MultiProgress, ProgressDrawTarget};
use std::sync::Arc;

use rapidclip::app_config::Config;
use rapidclip::audio::{AudioCodec, WavCodec};
use rapidclip::errors::AppError;
use rapidclip::file_utils::FileManager;
use rapidclip::music_library::MusicLibrary;
use rapidclip::providers::mock::{MockImageGenerator, MockTranscriber, MOCK_IMAGE_HEADER};
use rapidclip::timeline::required_images;
use rapidclip::{ClipRequest, Controller};

use crate::common::{self, MockSet, RecordingRenderer};

fn controller(config: Config, mocks: &MockSet, renderer: &RecordingRenderer, music: Option<MusicLibrary>) -> Controller {
    common::init_logging();
    Controller::with_parts(
        config,
        mocks.collaborators(),
        Arc::new(WavCodec),
        Arc::new(renderer.clone()),
        music,
    )
    .with_progress(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
}

#[tokio::test]
async fn test_run_withMockCollaborators_shouldProduceEveryArtifact() {
    let temp = common::create_temp_dir().unwrap();
    let mocks = MockSet::new(9.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let request = ClipRequest { watermark: Some("@rapidclip".to_string()), ..ClipRequest::new("octopuses", "en") };
    let output = controller.run(request).await.unwrap();

    assert_eq!(output.directory, temp.path().join(&output.request_id));
    assert_eq!(FileManager::read_to_string(&output.script).unwrap(), common::SCRIPT);
    assert!(output.narration.ends_with(format!("{}.wav", output.request_id)));
    assert!(FileManager::read_to_string(&output.subtitles).unwrap().starts_with("1\n00:00:00,000 --> "));

    assert_eq!(output.cues.len(), 3);
    assert_eq!(output.cues[0].text, "Did you know... octopuses have three");
    assert_eq!(output.cues[2].text, "Haha, nature is wild.");
    assert_eq!(output.images.len(), required_images(output.cues.len()));
    for image in &output.images {
        assert!(FileManager::read_bytes(image).unwrap().starts_with(MOCK_IMAGE_HEADER));
    }
    assert!(output.music.is_none());
    assert!(output.speed_factor.is_none());
    assert!(FileManager::file_exists(&output.video));

    let timelines = renderer.rendered();
    assert_eq!(timelines.len(), 1);
    assert_eq!(timelines[0].slot_count(), output.images.len());
    assert_eq!(timelines[0].duration, 9.0);
    assert_eq!(timelines[0].watermark.as_ref().unwrap().text, "@rapidclip");
    assert_eq!(output.video_duration, 9.0);
}

#[tokio::test]
async fn test_run_shouldPromptWithTheScriptLanguageAndPreviousPrompts() {
    let temp = common::create_temp_dir().unwrap();
    let mocks = MockSet::new(9.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    controller.run(ClipRequest::new("octopuses", "pt")).await.unwrap();

    let prompts = mocks.text.prompts();
    assert!(prompts[0].contains("'octopuses' in Portuguese"));
    // one script prompt, then one prompt per image
    assert_eq!(prompts.len(), 1 + mocks.images.requests().len());
    assert!(!prompts[1].contains("already used"));
    assert!(prompts[2].contains("1. A glowing octopus in a deep blue sea"));
    assert_eq!(mocks.speech.texts(), vec![common::SCRIPT.to_string()]);
    assert!(mocks.images.requests().iter().all(|(_, w, h)| (*w, *h) == (1080, 1920)));
}

#[tokio::test]
async fn test_run_withMaxDuration_shouldOverwriteNarration() {
    let temp = common::create_temp_dir().unwrap();
    let mocks = MockSet::new(12.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let request = ClipRequest { max_duration: Some(8.0), ..ClipRequest::new("octopuses", "en") };
    let output = controller.run(request).await.unwrap();

    assert!((output.speed_factor.unwrap() - 1.5).abs() < 1e-9);
    let stored = WavCodec.decode(&FileManager::read_bytes(&output.narration).unwrap()).unwrap();
    assert!(stored.duration_secs() < 12.0);
    assert!(output.video_duration <= 8.0);
}

#[tokio::test]
async fn test_run_withMaxDurationAboveNarration_shouldKeepNarration() {
    let temp = common::create_temp_dir().unwrap();
    let mocks = MockSet::new(9.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let request = ClipRequest { max_duration: Some(30.0), ..ClipRequest::new("octopuses", "en") };
    let output = controller.run(request).await.unwrap();

    assert!(output.speed_factor.is_none());
    let stored = WavCodec.decode(&FileManager::read_bytes(&output.narration).unwrap()).unwrap();
    assert!((stored.duration_secs() - 9.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_run_withMusicLibrary_shouldMixChosenSong() {
    let temp = common::create_temp_dir().unwrap();
    let library_path = common::write_music_library(temp.path(), 4.0).unwrap();
    let library = MusicLibrary::load(&library_path).unwrap();
    let mocks = MockSet::new(9.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(&temp.path().join("out")), &mocks, &renderer, Some(library));

    let output = controller.run(ClipRequest::new("octopuses", "en")).await.unwrap();

    assert_eq!(output.music, Some(temp.path().join("calm.wav")));
    let mixed = output.directory.join(format!("{}_mixed.wav", output.request_id));
    assert!(FileManager::file_exists(&mixed));

    let timeline = &renderer.rendered()[0];
    assert!((timeline.audio.duration_secs - 9.0).abs() < 1e-3);
    assert!(mocks.text.prompts().last().unwrap().contains("Songs (JSON)"));
}

#[tokio::test]
async fn test_run_withMusicDisabledOnRequest_shouldSkipChoice() {
    let temp = common::create_temp_dir().unwrap();
    let library_path = common::write_music_library(temp.path(), 4.0).unwrap();
    let library = MusicLibrary::load(&library_path).unwrap();
    let mocks = MockSet::new(9.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(&temp.path().join("out")), &mocks, &renderer, Some(library));

    let request = ClipRequest { music: false, ..ClipRequest::new("octopuses", "en") };
    let output = controller.run(request).await.unwrap();

    assert!(output.music.is_none());
    assert!(mocks.text.prompts().iter().all(|p| !p.contains("Songs (JSON)")));
}

#[tokio::test]
async fn test_run_withFailingImageGenerator_shouldAbortAndKeepArtifacts() {
    let temp = common::create_temp_dir().unwrap();
    let mut mocks = MockSet::new(9.0);
    mocks.images = MockImageGenerator::failing_from(1);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let result = controller.run(ClipRequest::new("octopuses", "en")).await;

    assert!(matches!(result, Err(AppError::Provider(_))));
    assert!(renderer.rendered().is_empty());

    let request_dir = std::fs::read_dir(temp.path()).unwrap().next().unwrap().unwrap().path();
    let files: Vec<String> = std::fs::read_dir(&request_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(files.iter().any(|f| f.ends_with("_script.txt")));
    assert!(files.iter().any(|f| f.ends_with(".srt")));
    assert!(files.iter().any(|f| f.ends_with("_img_1.png")));
    assert!(!files.iter().any(|f| f.ends_with("_img_2.png")));
}

#[tokio::test]
async fn test_run_withFailingTranscriber_shouldNotCallImageGenerator() {
    let temp = common::create_temp_dir().unwrap();
    let mut mocks = MockSet::new(9.0);
    mocks.transcriber = MockTranscriber::failing();
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let result = controller.run(ClipRequest::new("octopuses", "en")).await;

    assert!(result.is_err());
    assert_eq!(mocks.transcriber.request_count(), 1);
    assert!(mocks.images.requests().is_empty());
}

#[tokio::test]
async fn test_runBatch_withThreeThemes_shouldIsolateArtifacts() {
    let temp = common::create_temp_dir().unwrap();
    let mocks = MockSet::new(9.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let requests = ["octopuses", "volcanoes", "tides"].map(|theme| ClipRequest::new(theme, "en")).to_vec();
    let results = controller.run_batch(requests).await;

    assert_eq!(results.len(), 3);
    let mut directories: Vec<_> = results
        .iter()
        .map(|(_, result)| result.as_ref().unwrap().directory.clone())
        .collect();
    directories.sort();
    directories.dedup();
    assert_eq!(directories.len(), 3);
    assert_eq!(renderer.rendered().len(), 3);
}

#[test]
fn test_runBatch_withNoRequests_shouldReturnNothing() {
    let temp = common::create_temp_dir().unwrap();
    let mocks = MockSet::new(1.0);
    let renderer = RecordingRenderer::default();
    let controller = controller(common::test_config(temp.path()), &mocks, &renderer, None);

    let results = tokio_test::block_on(controller.run_batch(Vec::new()));

    assert!(results.is_empty());
    assert!(mocks.text.prompts().is_empty());
}
