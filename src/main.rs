// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};

use mkvembed::app_config::{self, Config, EmbedMode};
use mkvembed::file_utils::FileManager;
use mkvembed::{Controller, Video};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for mkvembed
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// mkvembed - Embed sidecar subtitles into Matroska videos
///
/// Finds the subtitle files next to each video and embeds the languages the
/// container is still missing, using ffmpeg or mkvmerge.
#[derive(Parser, Debug)]
#[command(name = "mkvembed")]
#[command(version)]
#[command(about = "Embed sidecar subtitles into mkv videos")]
#[command(long_about = "mkvembed embeds the subtitle files lying next to a video into an mkv container.

EXAMPLES:
    mkvembed movie.mp4                          # Embed the default language
    mkvembed -l fr movie.mkv                    # Embed French subtitles
    mkvembed --multi -l en -l de /videos/       # Embed English and German in a whole directory
    mkvembed -s /library -d /downloads/         # File converted videos into a library
    mkvembed completions bash > mkvembed.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Subtitle language to embed (code or name); repeat for several
    #[arg(short, long = "language")]
    languages: Vec<String>,

    /// Embed every requested language instead of the first one only
    #[arg(long)]
    multi: bool,

    /// Do not take existing converted videos into account
    #[arg(long)]
    force_copy: bool,

    /// Always embed with mkvmerge
    #[arg(long)]
    force_mkvmerge: bool,

    /// Delete subtitle files once embedded
    #[arg(short, long)]
    delete_subtitles: bool,

    /// Library directory where converted videos are filed
    #[arg(short, long)]
    save_dir: Option<PathBuf>,

    /// Do not create browse-by symbolic links in the library
    #[arg(long)]
    no_links: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color of a log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with the most verbose level; the effective
    // level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mkvembed", &mut std::io::stdout());
            Ok(())
        }
        None => run_embed(cli).await,
    }
}

// @loads: Config file, created with defaults when missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

// @applies: Command line overrides on top of the file values
fn apply_overrides(config: &mut Config, options: &CommandLineOptions) {
    if !options.languages.is_empty() {
        config.languages = options.languages.clone();
    }
    if options.multi {
        config.mode = EmbedMode::Multi;
    }
    if options.force_copy {
        config.force_copy = true;
    }
    if options.force_mkvmerge {
        config.force_mkvmerge = true;
    }
    if options.delete_subtitles {
        config.delete_subtitles = true;
    }
    if let Some(save_dir) = &options.save_dir {
        config.save_dir = Some(save_dir.clone());
    }
    if options.no_links {
        config.create_soft_links = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_embed(options: CommandLineOptions) -> Result<()> {
    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    let mut config = load_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;
    log::set_max_level(level_filter(config.log_level));

    let paths = if FileManager::file_exists(&input_path) {
        vec![input_path.clone()]
    } else if FileManager::dir_exists(&input_path) {
        FileManager::find_videos(&input_path)?
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    };

    if paths.is_empty() {
        warn!("No video found in {:?}", input_path);
        return Ok(());
    }

    let videos: Vec<Video> = paths.iter().map(Video::from_path).collect();
    let total = videos.len();

    let controller = Controller::with_config(config)?;
    info!(
        "Embedding {} in {} video(s)",
        controller
            .target_languages()
            .iter()
            .map(|l| l.code())
            .collect::<Vec<_>>()
            .join(", "),
        total
    );

    let start_time = std::time::Instant::now();

    let progress_bar = (total > 1).then(|| {
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} videos ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("#>-"));
        pb.set_message("Converting videos");
        pb
    });

    let converted = controller
        .convert_videos_with_progress(videos, |done, _| {
            if let Some(pb) = &progress_bar {
                pb.set_position(done as u64);
            }
        })
        .await;

    if let Some(pb) = &progress_bar {
        pb.finish_with_message("Done");
    }

    let failed = total - converted.len();
    for item in &converted {
        info!("{}: {}", item.video, item.outcome);
    }
    info!(
        "Finished {} video(s) in {:.1}s",
        converted.len(),
        start_time.elapsed().as_secs_f64()
    );

    if failed > 0 {
        error!("{} video(s) could not be converted", failed);
    }

    Ok(())
}
