/*!
 * End-to-end tests of the conversion workflow with fake tools
 */

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

use mkvembed::app_config::{Config, EmbedMode};
use mkvembed::app_controller::ConversionOutcome;
use mkvembed::errors::ConversionError;
use mkvembed::language_utils::{resolve, SubtitleLanguage};
use mkvembed::planner::Strategy;
use mkvembed::subtitle_scanner::scan_embedded;
use mkvembed::video::Video;

use crate::common::{self, FakeContainerInspector, FakeToolRunner, RunnerBehavior};

fn langs(codes: &[&str]) -> BTreeSet<SubtitleLanguage> {
    codes.iter().map(|c| resolve(c)).collect()
}

#[tokio::test]
async fn test_convertVideo_withGermanContainerAndEnglishSidecar_shouldEmbedEnglish() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let show = common::create_fake_container(dir, "show.mkv", &["ger"])?;
    let subtitle = common::create_test_subtitle(dir, "show.en.srt")?;
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &inspector, &runner, None)?;

    let mut video = Video::from_path(&show);
    let outcome = controller.convert_video(&mut video, &langs(&["eng", "deu"])).await?;

    assert_eq!(
        outcome,
        ConversionOutcome::Converted {
            path: show.clone(),
            strategy: Strategy::SingleStream {
                language: resolve("eng"),
                subtitle: subtitle.clone(),
            },
        }
    );

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "ffmpeg");
    assert!(calls[0].args.contains(&"language=eng".to_string()));
    assert!(calls[0].args.contains(&"-metadata:s:s:1".to_string()));
    assert!(calls[0].args.contains(&subtitle.to_string_lossy().to_string()));

    assert_eq!(scan_embedded(&inspector, &show), langs(&["deu", "eng"]));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_runTwice_secondRunShouldBeNoOpWithSamePath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &inspector, &runner, None)?;
    let targets = controller.target_languages();

    let first = controller.convert_video(&mut Video::from_path(&source), &targets).await?;
    let second = controller.convert_video(&mut Video::from_path(&source), &targets).await?;

    assert!(first.is_converted());
    assert_eq!(first.path(), dir.join("movie.mkv"));
    assert_eq!(second, ConversionOutcome::AlreadyConverted(dir.join("movie.mkv")));
    assert_eq!(runner.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withEmptyTargets_shouldFailWithoutSideEffects() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &inspector, &runner, None)?;

    let result = controller.convert_video(&mut Video::from_path(&source), &BTreeSet::new()).await;

    assert!(matches!(result, Err(ConversionError::NoTargetLanguages)));
    assert!(runner.calls().is_empty());
    assert!(inspector.calls().is_empty());
    assert!(!dir.join("movie.mkv").exists());
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withTargetsAlreadyEmbedded_shouldNotRunTools() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mkv", &["en", "fr"])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    common::create_test_subtitle(dir, "movie.de.srt")?;
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &inspector, &runner, None)?;

    let outcome = controller.convert_video(&mut Video::from_path(&source), &langs(&["eng", "fra"])).await?;

    assert_eq!(outcome, ConversionOutcome::AlreadyConverted(source));
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withRenamedOutputAndTargetsInSource_shouldNotRunTools() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "Man.of.Steel.2013.mkv", &["eng"])?;
    common::create_test_subtitle(dir, "Man.of.Steel.2013.fr.srt")?;
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &inspector, &runner, None)?;

    let outcome = controller.convert_video(&mut Video::from_path(&source), &langs(&["eng"])).await?;

    assert_eq!(outcome, ConversionOutcome::AlreadyConverted(source));
    assert!(runner.calls().is_empty());
    assert!(!dir.join("Man of Steel.mkv").exists());
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withRenamedOutputAndForceCopy_shouldRemuxSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "Man.of.Steel.2013.mkv", &["eng"])?;
    common::create_test_subtitle(dir, "Man.of.Steel.2013.fr.srt")?;
    let config = Config {
        force_copy: true,
        ..Config::default()
    };
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(config, &FakeContainerInspector::new(), &runner, None)?;

    let outcome = controller.convert_video(&mut Video::from_path(&source), &langs(&["eng"])).await?;

    assert!(outcome.is_converted());
    assert_eq!(outcome.path(), dir.join("Man of Steel.mkv"));
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].args.contains(&"-metadata:s:s:1".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withMissingVideo_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &FakeContainerInspector::new(), &runner, None)?;

    let mut video = Video::from_path(temp_dir.path().join("gone.mkv"));
    let result = controller.convert_video(&mut video, &langs(&["eng"])).await;

    assert!(matches!(result, Err(ConversionError::MissingVideo(_))));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withoutSidecars_shouldHaveNothingToEmbed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_fake_container(temp_dir.path(), "movie.mp4", &[])?;
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &FakeContainerInspector::new(), &runner, None)?;

    let outcome = controller.convert_video(&mut Video::from_path(&source), &langs(&["eng"])).await?;

    assert_eq!(outcome, ConversionOutcome::NothingToEmbed(source));
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_inMultiMode_shouldEmbedEveryLanguageWithMkvmerge() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    common::create_test_subtitle(dir, "movie.fr.srt")?;
    let config = Config {
        languages: vec!["en".to_string(), "fr".to_string()],
        mode: EmbedMode::Multi,
        ..Config::default()
    };
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(config, &inspector, &runner, None)?;
    let targets = controller.target_languages();

    let outcome = controller.convert_video(&mut Video::from_path(&source), &targets).await?;

    let output = dir.join("movie.mkv");
    assert_eq!(outcome.path(), output);
    assert!(matches!(outcome, ConversionOutcome::Converted { strategy: Strategy::MultiStream { .. }, .. }));
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "mkvmerge");
    assert_eq!(scan_embedded(&inspector, &output), langs(&["eng", "fra"]));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withExistingOutput_shouldExtendIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    let output = common::create_fake_container(dir, "movie.mkv", &["eng"])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    common::create_test_subtitle(dir, "movie.de.srt")?;
    let config = Config {
        languages: vec!["en".to_string(), "de".to_string()],
        mode: EmbedMode::Multi,
        ..Config::default()
    };
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(config, &inspector, &runner, None)?;
    let targets = controller.target_languages();

    let outcome = controller.convert_video(&mut Video::from_path(&source), &targets).await?;

    // Only German is missing, so the existing output is the remux input
    let calls = runner.calls();
    assert_eq!(calls[0].program, "ffmpeg");
    assert_eq!(calls[0].args.iter().filter(|a| a.as_str() == "-i").count(), 2);
    assert!(calls[0].args.contains(&output.to_string_lossy().to_string()));
    assert!(!calls[0].args.contains(&source.to_string_lossy().to_string()));
    assert_eq!(outcome.path(), output);
    assert_eq!(scan_embedded(&inspector, &output), langs(&["eng", "deu"]));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withForceCopy_shouldRebuildFromSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_fake_container(dir, "movie.mkv", &["eng"])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let config = Config {
        force_copy: true,
        ..Config::default()
    };
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(config, &FakeContainerInspector::new(), &runner, None)?;
    let targets = controller.target_languages();

    let outcome = controller.convert_video(&mut Video::from_path(&source), &targets).await?;

    assert!(outcome.is_converted());
    assert!(runner.calls()[0].args.contains(&source.to_string_lossy().to_string()));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withForcedMkvmerge_shouldUseMkvmergeForOneSubtitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let config = Config {
        force_mkvmerge: true,
        ..Config::default()
    };
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(config, &FakeContainerInspector::new(), &runner, None)?;
    let targets = controller.target_languages();

    controller.convert_video(&mut Video::from_path(&source), &targets).await?;

    assert_eq!(runner.calls()[0].program, "mkvmerge");
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withProvidedSubtitles_shouldSkipDiscovery() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let elsewhere = common::create_test_subtitle(dir, "subs/english.srt")?;
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &FakeContainerInspector::new(), &runner, None)?;
    let subtitles = BTreeMap::from([(elsewhere.clone(), resolve("eng"))]);

    controller
        .convert_video_with_subtitles(&mut Video::from_path(&source), &langs(&["eng"]), Some(&subtitles))
        .await?;

    assert!(runner.calls()[0].args.contains(&elsewhere.to_string_lossy().to_string()));
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withDeleteSubtitles_shouldRemoveEmbeddedSidecarOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    let english = common::create_test_subtitle(dir, "movie.en.srt")?;
    let german = common::create_test_subtitle(dir, "movie.de.srt")?;
    let config = Config {
        delete_subtitles: true,
        ..Config::default()
    };
    let controller = common::controller_with(config, &FakeContainerInspector::new(), &FakeToolRunner::new(), None)?;
    let targets = controller.target_languages();

    controller.convert_video(&mut Video::from_path(&source), &targets).await?;

    assert!(!english.exists());
    assert!(german.exists());
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withFailingTool_shouldReturnError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let runner = FakeToolRunner::with_behavior(RunnerBehavior::Fail(1));
    let controller = common::controller_with(Config::default(), &FakeContainerInspector::new(), &runner, None)?;
    let targets = controller.target_languages();

    let result = controller.convert_video(&mut Video::from_path(&source), &targets).await;

    assert!(matches!(result, Err(ConversionError::ToolFailed { .. })));
    assert!(!dir.join("movie.mkv").exists());
    Ok(())
}

#[tokio::test]
async fn test_convertVideo_withMissingTool_shouldReturnNotFound() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let runner = FakeToolRunner::with_behavior(RunnerBehavior::NotFound);
    let controller = common::controller_with(Config::default(), &FakeContainerInspector::new(), &runner, None)?;
    let targets = controller.target_languages();

    let result = controller.convert_video(&mut Video::from_path(&source), &targets).await;

    assert!(matches!(result, Err(ConversionError::ToolNotFound(tool)) if tool == "ffmpeg"));
    Ok(())
}

#[tokio::test]
async fn test_convertVideos_shouldSkipFailuresAndReportProgress() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let good = common::create_fake_container(dir, "good.mp4", &[])?;
    common::create_test_subtitle(dir, "good.en.srt")?;
    let missing = dir.join("missing.mp4");
    let done = common::create_fake_container(dir, "done.mkv", &["eng"])?;
    let controller = common::controller_with(Config::default(), &FakeContainerInspector::new(), &FakeToolRunner::new(), None)?;

    let videos = vec![Video::from_path(&good), Video::from_path(&missing), Video::from_path(&done)];
    let mut progress = Vec::new();
    let converted = controller
        .convert_videos_with_progress(videos, |current, total| progress.push((current, total)))
        .await;

    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].outcome.path(), dir.join("good.mkv"));
    assert_eq!(converted[1].outcome, ConversionOutcome::AlreadyConverted(done));
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    Ok(())
}

#[tokio::test]
async fn test_convertVideos_withCorruptExistingOutput_shouldStillConvert() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let source = common::create_fake_container(dir, "movie.mp4", &[])?;
    common::create_test_file(dir, "movie.mkv", "corrupt")?;
    common::create_test_subtitle(dir, "movie.en.srt")?;
    let inspector = FakeContainerInspector::new();
    let runner = FakeToolRunner::new();
    let controller = common::controller_with(Config::default(), &inspector, &runner, None)?;

    let converted = controller.convert_videos(vec![Video::from_path(&source)]).await;

    assert_eq!(converted.len(), 1);
    assert!(runner.calls()[0].args.contains(&source.to_string_lossy().to_string()));
    assert_eq!(scan_embedded(&inspector, &dir.join("movie.mkv")), langs(&["eng"]));
    Ok(())
}
