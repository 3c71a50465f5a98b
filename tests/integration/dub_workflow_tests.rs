/*!
 * End-to-end tests of the dubbing workflow with mock backends
 */

use std::fs;
use anyhow::Result;
use srtdub::app_controller::{Controller, DubOutcome};
use srtdub::mux::RecordingMuxer;
use srtdub::speech::MockSpeechEngine;
use crate::common;

fn controller(engine: MockSpeechEngine, muxer: RecordingMuxer) -> Controller {
    Controller::with_backends(common::test_config(), Box::new(engine), Box::new(muxer)).without_progress()
}

/// Test the two-cue scenario: track length and energy placement
#[tokio::test]
async fn test_run_withTwoCueVideo_shouldDubAndPlaceSpeech() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video_with_subtitle(temp_dir.path(), "movie", common::TWO_CUE_SRT)?;
    let engine = MockSpeechEngine::working();
    let muxer = RecordingMuxer::new(".de");

    let report = controller(engine.clone(), muxer.clone()).run(&video).await?;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(engine.texts(), vec!["hi", "bye"]);

    let track = common::read_track(&temp_dir.path().join("movie.de.wav"));
    assert_eq!(track.sample_rate(), 24_000);
    assert_eq!(track.channels(), 1);
    assert_eq!(track.frames(), 168_000);
    assert!(track.rms_between(1.0, 1.3) > 0.1);
    assert!(track.rms_between(5.0, 5.3) > 0.1);
    assert_eq!(track.rms_between(0.0, 1.0), 0.0);
    assert_eq!(track.rms_between(2.0, 5.0), 0.0);
    assert_eq!(track.rms_between(6.0, 7.0), 0.0);

    let requests = muxer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].video, video);
    assert_eq!(requests[0].audio, temp_dir.path().join("movie.de.wav"));
    assert!(!requests[0].keep_original);
    assert!(temp_dir.path().join("movie.de.mp4").exists());

    Ok(())
}

/// Test that one failing cue leaves silence but the video is still dubbed
#[tokio::test]
async fn test_run_withFailingCue_shouldStillDub() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video_with_subtitle(temp_dir.path(), "movie", common::TWO_CUE_SRT)?;

    let report = controller(MockSpeechEngine::failing_on(&[1]), RecordingMuxer::new(".de"))
        .run(&video)
        .await?;

    match &report.outcomes[0] {
        DubOutcome::Dubbed { report, .. } => {
            assert_eq!(report.placed, vec![2]);
            assert_eq!(report.skipped, vec![1]);
        }
        other => panic!("expected Dubbed, got {:?}", other),
    }

    let track = common::read_track(&temp_dir.path().join("movie.de.wav"));
    assert_eq!(track.frames(), 168_000);
    assert_eq!(track.rms_between(1.0, 2.0), 0.0);
    assert!(track.rms_between(5.0, 5.3) > 0.1);

    Ok(())
}

/// Test that a video without subtitle is skipped and nothing runs
#[tokio::test]
async fn test_run_withoutSubtitle_shouldSkipWithoutSynthesis() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "movie.mp4", "")?;
    let engine = MockSpeechEngine::working();
    let muxer = RecordingMuxer::new(".de");

    let report = controller(engine.clone(), muxer.clone()).run(&video).await?;

    assert_eq!(report.skipped(), 1);
    match &report.outcomes[0] {
        DubOutcome::Skipped { reason, .. } => assert!(reason.contains("movie.de.srt")),
        other => panic!("expected Skipped, got {:?}", other),
    }
    assert_eq!(engine.call_count(), 0);
    assert!(muxer.requests().is_empty());

    Ok(())
}

/// Test that a mux failure leaves no container behind
#[tokio::test]
async fn test_run_withFailingMuxer_shouldFailWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video_with_subtitle(temp_dir.path(), "movie", common::TWO_CUE_SRT)?;

    let report = controller(MockSpeechEngine::working(), RecordingMuxer::failing(".de"))
        .run(&video)
        .await?;

    assert_eq!(report.failed(), 1);
    match &report.outcomes[0] {
        DubOutcome::Failed { error, .. } => assert!(error.contains("mock mux failure")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!temp_dir.path().join("movie.de.mp4").exists());

    Ok(())
}

/// Test that a bad subtitle fails only its own video
#[tokio::test]
async fn test_run_withOneMalformedSubtitle_shouldContinueBatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_video_with_subtitle(dir, "a_broken", "1\nnot a time line\ntext\n")?;
    common::create_video_with_subtitle(dir, "b_empty", "\n\n")?;
    common::create_video_with_subtitle(dir, "c_good", common::TWO_CUE_SRT)?;
    let muxer = RecordingMuxer::new(".de");

    let report = controller(MockSpeechEngine::working(), muxer.clone()).run(dir).await?;

    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(&report.outcomes[0], DubOutcome::Failed { error, .. } if error.contains("Malformed")));
    assert!(matches!(&report.outcomes[1], DubOutcome::Failed { error, .. } if error.contains("no cues")));
    assert!(matches!(&report.outcomes[2], DubOutcome::Dubbed { .. }));
    assert_eq!(report.summary(), "1 dubbed, 0 skipped, 2 failed");
    assert_eq!(muxer.requests().len(), 1);
    assert!(!dir.join("a_broken.de.wav").exists());

    Ok(())
}

/// Test that existing outputs are kept unless forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_video_with_subtitle(dir, "movie", common::TWO_CUE_SRT)?;
    common::create_test_file(dir, "movie.de.mp4", "earlier dub")?;
    let engine = MockSpeechEngine::working();

    let report = controller(engine.clone(), RecordingMuxer::new(".de")).run(dir).await?;

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(engine.call_count(), 0);
    assert_eq!(fs::read_to_string(dir.join("movie.de.mp4"))?, "earlier dub");

    let report = controller(engine.clone(), RecordingMuxer::new(".de"))
        .force_overwrite(true)
        .run(dir)
        .await?;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(fs::read_to_string(dir.join("movie.de.mp4"))?, "muxed");

    Ok(())
}

/// Test that audio-only runs stop before muxing
#[tokio::test]
async fn test_run_withAudioOnly_shouldWriteTrackOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video_with_subtitle(temp_dir.path(), "movie", common::TWO_CUE_SRT)?;
    let muxer = RecordingMuxer::new(".de");

    let report = controller(MockSpeechEngine::working(), muxer.clone())
        .audio_only(true)
        .run(&video)
        .await?;

    assert!(matches!(&report.outcomes[0], DubOutcome::TrackOnly { .. }));
    assert!(temp_dir.path().join("movie.de.wav").exists());
    assert!(muxer.requests().is_empty());

    Ok(())
}

/// Test that a subtitle file as input builds only its track
#[tokio::test]
async fn test_run_withSubtitleInput_shouldBuildTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_file(temp_dir.path(), "talk.de.srt", common::TWO_CUE_SRT)?;
    let muxer = RecordingMuxer::new(".de");

    let report = controller(MockSpeechEngine::working(), muxer.clone()).run(&subtitle).await?;

    match &report.outcomes[0] {
        DubOutcome::TrackOnly { track, .. } => {
            assert_eq!(track, &temp_dir.path().join("talk.de.wav"));
            assert_eq!(common::read_track(track).frames(), 168_000);
        }
        other => panic!("expected TrackOnly, got {:?}", other),
    }
    assert!(muxer.requests().is_empty());

    Ok(())
}

/// Test that a missing input is an error for the whole run
#[tokio::test]
async fn test_run_withMissingInput_shouldError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let result = controller(MockSpeechEngine::working(), RecordingMuxer::new(".de"))
        .run(&temp_dir.path().join("missing.mp4"))
        .await;

    assert!(result.is_err());

    Ok(())
}

/// Test that keeping the original audio reaches the muxer
#[tokio::test]
async fn test_run_withKeepOriginal_shouldPassFlagToMuxer() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video_with_subtitle(temp_dir.path(), "movie", common::TWO_CUE_SRT)?;
    let muxer = RecordingMuxer::new(".de");
    let mut config = common::test_config();
    config.keep_original = true;

    let controller = Controller::with_backends(config, Box::new(MockSpeechEngine::working()), Box::new(muxer.clone()))
        .without_progress();
    controller.run(&video).await?;

    assert!(muxer.requests()[0].keep_original);

    Ok(())
}

/// Test that a failing engine still yields a silent, full-length dub
#[tokio::test]
async fn test_run_withFailingEngine_shouldDubSilentTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video_with_subtitle(temp_dir.path(), "movie", common::TWO_CUE_SRT)?;

    let report = controller(MockSpeechEngine::failing(), RecordingMuxer::new(".de"))
        .run(&video)
        .await?;

    assert_eq!(report.succeeded(), 1);
    let track = common::read_track(&temp_dir.path().join("movie.de.wav"));
    assert_eq!(track.frames(), 168_000);
    assert!(track.samples().iter().all(|s| *s == 0.0));

    Ok(())
}

/// Test that an empty directory is not an error
#[tokio::test]
async fn test_run_withEmptyDirectory_shouldReturnEmptyReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let report = controller(MockSpeechEngine::working(), RecordingMuxer::new(".de"))
        .run(temp_dir.path())
        .await?;

    assert!(report.outcomes.is_empty());

    Ok(())
}
