use anyhow::Result;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::app_config::{normalize_extension, Config, EmbedMode};
use crate::errors::ConversionError;
use crate::file_utils::FileManager;
use crate::filing::LibraryLayout;
use crate::language_utils::SubtitleLanguage;
use crate::metadata::{self, MetadataFetcher, OmdbClient};
use crate::planner::{self, PlanPolicy, Strategy};
use crate::remux::{self, ProcessRunner, RemuxOptions, ToolRunner, Verbosity};
use crate::subtitle_scanner::{self, ContainerInspector, MatroskaInspector};
use crate::video::{GroupingAttribute, Video};

// @module: Application controller for subtitle embedding

/// How a conversion ended
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// The container already held every target language
    AlreadyConverted(PathBuf),
    /// Subtitles were embedded with the given strategy
    Converted {
        path: PathBuf,
        strategy: Strategy,
    },
    /// No sidecar subtitle was left to embed
    NothingToEmbed(PathBuf),
}

impl ConversionOutcome {
    /// Path of the resulting container
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyConverted(path) | Self::NothingToEmbed(path) => path,
            Self::Converted { path, .. } => path,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyConverted(path) => write!(f, "already converted: {:?}", path),
            Self::Converted { path, strategy } => write!(f, "converted with {}: {:?}", strategy, path),
            Self::NothingToEmbed(path) => write!(f, "nothing to embed: {:?}", path),
        }
    }
}

/// A video of a batch together with its outcome
#[derive(Debug, Clone)]
pub struct ConvertedVideo {
    pub video: Video,
    pub outcome: ConversionOutcome,
}

/// Main application controller for subtitle embedding
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    inspector: Box<dyn ContainerInspector>,
    runner: Box<dyn ToolRunner>,
    fetcher: Option<Box<dyn MetadataFetcher>>,
    layout: LibraryLayout,
    // @field: Attributes of the browse-by link trees
    attributes: Vec<GroupingAttribute>,
    remux_options: RemuxOptions,
}

impl Controller {
    // @method: Create a controller with the production inspector, runner and fetcher
    pub fn with_config(config: Config) -> Result<Self> {
        let runner = ProcessRunner::new(config.tools.timeout_secs);
        let fetcher: Option<Box<dyn MetadataFetcher>> = if config.metadata.enabled {
            Some(Box::new(OmdbClient::new(
                config.metadata.api_key.clone(),
                config.metadata.endpoint.clone(),
                config.metadata.timeout_secs,
            )))
        } else {
            None
        };

        Self::with_components(config, Box::new(MatroskaInspector), Box::new(runner), fetcher)
    }

    // @method: Create a controller from explicit components
    pub fn with_components(
        config: Config,
        inspector: Box<dyn ContainerInspector>,
        runner: Box<dyn ToolRunner>,
        fetcher: Option<Box<dyn MetadataFetcher>>,
    ) -> Result<Self> {
        config.validate()?;

        let attributes = config.filing.grouping_attributes()?;
        let layout = LibraryLayout::new(config.filing.clone());
        let remux_options = RemuxOptions::new(
            &config.tools,
            Verbosity::from(config.log_level),
            config.delete_subtitles,
        );

        Ok(Self {
            config,
            inspector,
            runner,
            fetcher,
            layout,
            attributes,
            remux_options,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Target languages of this run
    pub fn target_languages(&self) -> BTreeSet<SubtitleLanguage> {
        self.config.target_languages()
    }

    fn policy(&self) -> PlanPolicy {
        PlanPolicy {
            single: self.config.mode == EmbedMode::Single,
            force_multi: self.config.force_mkvmerge,
        }
    }

    // Output directory is the library when one is set, the video's folder otherwise
    fn output_dir(&self, video: &Video) -> PathBuf {
        match &self.config.save_dir {
            Some(save_dir) => self.layout.destination_dir(video, save_dir),
            None => video
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    async fn enrich(&self, video: &mut Video) {
        if let Some(fetcher) = &self.fetcher {
            metadata::enrich_if_missing(video, fetcher.as_ref()).await;
        }
    }

    /// Convert a video, discovering its sidecar subtitles
    pub async fn convert_video(
        &self,
        video: &mut Video,
        targets: &BTreeSet<SubtitleLanguage>,
    ) -> Result<ConversionOutcome, ConversionError> {
        self.convert_video_with_subtitles(video, targets, None).await
    }

    /// Convert a video so its container holds the target languages
    ///
    /// When `subtitles` is given it replaces sidecar discovery. An existing
    /// output that already has embedded subtitles becomes the remux input, so
    /// earlier conversions are extended rather than redone.
    pub async fn convert_video_with_subtitles(
        &self,
        video: &mut Video,
        targets: &BTreeSet<SubtitleLanguage>,
        subtitles: Option<&BTreeMap<PathBuf, SubtitleLanguage>>,
    ) -> Result<ConversionOutcome, ConversionError> {
        if targets.is_empty() {
            info!("No video to convert: at least one language must be selected");
            return Err(ConversionError::NoTargetLanguages);
        }

        let source = video.path.clone();
        if !FileManager::file_exists(&source) {
            return Err(ConversionError::MissingVideo(source));
        }

        if self.config.save_dir.is_some() {
            self.enrich(video).await;
        }

        let output_dir = self.output_dir(video);
        let output_path = FileManager::generate_output_path(
            &output_dir,
            &video.output_stem(),
            &self.config.video_extension,
        );
        debug!("Output path of {} is {:?}", video, output_path);

        let mut input = source.clone();
        let mut embedded = BTreeSet::new();

        if FileManager::file_exists(&output_path) && !self.config.force_copy {
            embedded = subtitle_scanner::scan_embedded(self.inspector.as_ref(), &output_path);
            info!("Embedded subtitles : {:?}", embedded);

            if planner::is_satisfied(targets, &embedded) {
                info!("Video already converted: {:?}", output_path);
                return Ok(ConversionOutcome::AlreadyConverted(output_path));
            }
            if !embedded.is_empty() {
                input = output_path.clone();
            }
        }
        if input == source {
            embedded = subtitle_scanner::scan_embedded(self.inspector.as_ref(), &source);
            info!("Embedded subtitles : {:?}", embedded);

            if planner::is_satisfied(targets, &embedded) && !self.config.force_copy {
                info!("Video already holds every target language: {:?}", source);
                self.file(video, &source).await;
                return Ok(ConversionOutcome::AlreadyConverted(source));
            }
        }

        let discovered;
        let available = match subtitles {
            Some(subtitles) => subtitles,
            None => {
                let default_language = targets.iter().next().copied().unwrap_or(SubtitleLanguage::Undefined);
                let extensions = [normalize_extension(&self.config.subtitle_extension)];
                discovered = subtitle_scanner::scan_external(&source, default_language, &extensions);
                &discovered
            }
        };

        let plan = planner::plan(targets, &embedded, available, self.policy());
        info!("Conversion plan for {}: {}", video, plan.strategy);

        let path = match &plan.strategy {
            Strategy::NoOp => {
                let existing = if FileManager::file_exists(&output_path) { output_path } else { input };
                self.file(video, &existing).await;
                return Ok(ConversionOutcome::NothingToEmbed(existing));
            }
            Strategy::SingleStream { language, subtitle } => {
                FileManager::ensure_dir(&output_dir)?;
                let existing = subtitle_scanner::count_embedded(self.inspector.as_ref(), &input);
                remux::ffmpeg_convert(
                    self.runner.as_ref(),
                    &self.remux_options,
                    &input,
                    subtitle,
                    *language,
                    existing,
                    &output_path,
                )
                .await?
            }
            Strategy::MultiStream { subtitles } => {
                FileManager::ensure_dir(&output_dir)?;
                remux::mkvmerge_convert(
                    self.runner.as_ref(),
                    &self.remux_options,
                    &input,
                    subtitles,
                    &output_path,
                )
                .await?
            }
        };

        self.file(video, &path).await;
        Ok(ConversionOutcome::Converted {
            path,
            strategy: plan.strategy,
        })
    }

    // Browse-by links are best-effort and never fail the conversion
    async fn file(&self, video: &mut Video, path: &Path) {
        let Some(save_dir) = &self.config.save_dir else {
            return;
        };
        if !self.config.create_soft_links || !video.is_movie() {
            return;
        }

        if video.is_missing_any(&self.attributes) {
            self.enrich(video).await;
        }

        match self.layout.link_views(video, save_dir, path, &self.attributes) {
            Ok(links) => debug!("{} link(s) created for {}", links.len(), video),
            Err(e) => error!("Failed to create links for {}: {}", video, e),
        }
    }

    /// Convert a batch of videos one after the other
    ///
    /// Failed videos are logged and left out of the result.
    pub async fn convert_videos(&self, videos: Vec<Video>) -> Vec<ConvertedVideo> {
        self.convert_videos_with_progress(videos, |_, _| {}).await
    }

    /// Convert a batch, reporting `(done, total)` after each video
    pub async fn convert_videos_with_progress<F>(&self, videos: Vec<Video>, mut on_progress: F) -> Vec<ConvertedVideo>
    where
        F: FnMut(usize, usize),
    {
        let targets = self.target_languages();
        let total = videos.len();
        let mut converted = Vec::with_capacity(total);

        if targets.is_empty() {
            warn!("No video to convert: at least one language must be selected");
            return converted;
        }

        for (index, mut video) in videos.into_iter().enumerate() {
            match self.convert_video(&mut video, &targets).await {
                Ok(outcome) => {
                    debug!("{}: {}", video, outcome);
                    converted.push(ConvertedVideo { video, outcome });
                }
                Err(e) => error!("Conversion of {} failed: {}", video, e),
            }
            on_progress(index + 1, total);
        }

        info!("{}/{} video(s) processed", converted.len(), total);
        converted
    }
}
