/*!
 * Remux executors.
 *
 * Both executors copy every stream of the input container and append
 * sidecar subtitles tagged with their language: ffmpeg for one subtitle,
 * mkvmerge for several. Tools are run through [`ToolRunner`] so the
 * process layer can be replaced.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::{LogLevel, ToolsConfig};
use crate::errors::ConversionError;
use crate::language_utils::SubtitleLanguage;

/// Verbosity handed to the external tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Informational output
    #[default]
    Normal,
    /// Everything the tools can print
    Verbose,
}

impl From<LogLevel> for Verbosity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error | LogLevel::Warn => Verbosity::Quiet,
            LogLevel::Info => Verbosity::Normal,
            LogLevel::Debug | LogLevel::Trace => Verbosity::Verbose,
        }
    }
}

/// Captured result of a tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn from_status(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code: status.code(),
            stdout: String::from_utf8_lossy(stdout).to_string(),
            stderr: String::from_utf8_lossy(stderr).to_string(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external program to completion
#[async_trait]
pub trait ToolRunner: Send + Sync + Debug {
    /// Run `program` with `args`, capturing its output
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ConversionError>;
}

/// Runner spawning real processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Create a runner; a zero timeout waits forever
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ConversionError> {
        debug!("Launching : '{} {}'", program, args.join(" "));

        let future = Command::new(program).args(args).kill_on_drop(true).output();

        let result = match self.timeout {
            Some(duration) => tokio::select! {
                result = future => result,
                _ = tokio::time::sleep(duration) => {
                    return Err(ConversionError::ToolTimeout {
                        tool: program.to_string(),
                        secs: duration.as_secs(),
                    });
                }
            },
            None => future.await,
        };

        match result {
            Ok(output) => Ok(ToolOutput::from_status(output.status, &output.stdout, &output.stderr)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConversionError::ToolNotFound(program.to_string()))
            }
            Err(e) => Err(ConversionError::Io(e)),
        }
    }
}

/// Settings shared by both executors
#[derive(Debug, Clone)]
pub struct RemuxOptions {
    pub ffmpeg_path: String,
    pub mkvmerge_path: String,
    pub verbosity: Verbosity,
    /// Remove consumed sidecars after a successful run
    pub delete_subtitles: bool,
}

impl RemuxOptions {
    pub fn new(tools: &ToolsConfig, verbosity: Verbosity, delete_subtitles: bool) -> Self {
        Self {
            ffmpeg_path: tools.ffmpeg_path.clone(),
            mkvmerge_path: tools.mkvmerge_path.clone(),
            verbosity,
            delete_subtitles,
        }
    }
}

impl Default for RemuxOptions {
    fn default() -> Self {
        Self::new(&ToolsConfig::default(), Verbosity::default(), false)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Arguments of the ffmpeg single-stream remux
///
/// `existing_subtitles` is the number of subtitle tracks already in the
/// input; the new track is appended after them and gets the language tag.
pub fn ffmpeg_args(
    input: &Path,
    subtitle: &Path,
    language: SubtitleLanguage,
    existing_subtitles: usize,
    output: &Path,
    verbosity: Verbosity,
) -> Vec<String> {
    let mut args = vec!["-y".to_string()];
    if verbosity != Verbosity::Verbose {
        args.extend(["-loglevel".to_string(), "panic".to_string()]);
    }
    args.extend([
        "-i".to_string(),
        path_arg(input),
        "-i".to_string(),
        path_arg(subtitle),
        "-map".to_string(),
        "0".to_string(),
        "-map".to_string(),
        "1".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        format!("-metadata:s:s:{}", existing_subtitles),
        format!("language={}", language.code()),
        path_arg(output),
    ]);
    args
}

/// Arguments of the mkvmerge multi-stream remux
pub fn mkvmerge_args(
    input: &Path,
    subtitles: &[(SubtitleLanguage, PathBuf)],
    output: &Path,
    verbosity: Verbosity,
) -> Vec<String> {
    let mut args = Vec::new();
    match verbosity {
        Verbosity::Quiet => args.push("-q".to_string()),
        Verbosity::Verbose => args.push("-v".to_string()),
        Verbosity::Normal => {}
    }
    args.extend(["-o".to_string(), path_arg(output), path_arg(input)]);
    for (language, subtitle) in subtitles {
        args.push("--language".to_string());
        args.push(format!("0:{}", language.code()));
        args.push(path_arg(subtitle));
    }
    args
}

// The tool cannot write over its own input; it writes next to it instead
fn remux_target(input: &Path, output: &Path) -> Result<Option<tempfile::TempPath>, ConversionError> {
    if input != output {
        return Ok(None);
    }
    let dir = output.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let suffix = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix(".remux-")
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_temp_path();
    Ok(Some(temp))
}

fn log_tool_output(tool: &str, input: &Path, output: &ToolOutput) {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    info!("Converting video {} with {}", file_name, tool);
    if !output.stdout.trim().is_empty() {
        debug!("{}", output.stdout.trim_end());
    }
    if !output.stderr.trim().is_empty() {
        warn!("{}", output.stderr.trim_end());
    }
}

fn delete_consumed(subtitles: &[PathBuf]) {
    for subtitle in subtitles {
        match std::fs::remove_file(subtitle) {
            Ok(()) => info!("Subtitle file removed: {:?}", subtitle.file_name().unwrap_or_default()),
            Err(e) => warn!("Could not remove subtitle file {:?}: {}", subtitle, e),
        }
    }
}

async fn run_into<R: ToolRunner + ?Sized>(
    runner: &R,
    program: &str,
    input: &Path,
    output: &Path,
    args_for: impl FnOnce(&Path) -> Vec<String>,
    accept: impl Fn(&ToolOutput) -> bool,
) -> Result<(), ConversionError> {
    let temp = remux_target(input, output)?;
    let target = temp.as_deref().unwrap_or(output);

    let args = args_for(target);
    let result = runner.run(program, &args).await?;
    log_tool_output(program, input, &result);

    if !accept(&result) {
        return Err(ConversionError::ToolFailed {
            tool: program.to_string(),
            status: result.code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr: result.stderr.trim().to_string(),
        });
    }

    if let Some(temp) = temp {
        temp.persist(output).map_err(|e| ConversionError::Io(e.error))?;
    }
    info!("Conversion finished: {:?}", output);
    Ok(())
}

/// Embed one subtitle with ffmpeg
pub async fn ffmpeg_convert<R: ToolRunner + ?Sized>(
    runner: &R,
    options: &RemuxOptions,
    input: &Path,
    subtitle: &Path,
    language: SubtitleLanguage,
    existing_subtitles: usize,
    output: &Path,
) -> Result<PathBuf, ConversionError> {
    if !subtitle.is_file() {
        debug!("Subtitle does not exist : {:?}", subtitle);
        return Err(ConversionError::MissingSubtitle(subtitle.to_path_buf()));
    }
    debug!("One subtitle to embed, language {}", language);

    run_into(
        runner,
        &options.ffmpeg_path,
        input,
        output,
        |target| ffmpeg_args(input, subtitle, language, existing_subtitles, target, options.verbosity),
        ToolOutput::success,
    )
    .await?;

    if options.delete_subtitles {
        delete_consumed(&[subtitle.to_path_buf()]);
    }
    Ok(output.to_path_buf())
}

/// Embed several subtitles in one mkvmerge run
///
/// mkvmerge exits with 1 when it completed with warnings; only 2 and above
/// are failures.
pub async fn mkvmerge_convert<R: ToolRunner + ?Sized>(
    runner: &R,
    options: &RemuxOptions,
    input: &Path,
    subtitles: &[(SubtitleLanguage, PathBuf)],
    output: &Path,
) -> Result<PathBuf, ConversionError> {
    for (language, subtitle) in subtitles {
        debug!("... embed {} subtitle", language);
        if !subtitle.is_file() {
            debug!("Subtitle does not exist : {:?}", subtitle);
            return Err(ConversionError::MissingSubtitle(subtitle.clone()));
        }
    }

    run_into(
        runner,
        &options.mkvmerge_path,
        input,
        output,
        |target| mkvmerge_args(input, subtitles, target, options.verbosity),
        |result| matches!(result.code, Some(0) | Some(1)),
    )
    .await?;

    if options.delete_subtitles {
        let consumed: Vec<PathBuf> = subtitles.iter().map(|(_, p)| p.clone()).collect();
        delete_consumed(&consumed);
    }
    Ok(output.to_path_buf())
}
