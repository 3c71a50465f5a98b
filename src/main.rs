// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use log::{error, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use srtdub::app_config::{self, Config};
use srtdub::Controller;

/// Exit status when the input path does not exist
const EXIT_INPUT_NOT_FOUND: i32 = 2;

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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dub videos from their subtitle files (default command)
    Dub(DubArgs),

    /// Generate shell completions for srtdub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct DubArgs {
    /// Video file, subtitle file, or directory of videos
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Token before `.srt` used to find a video's subtitle (e.g. ".de" for movie.de.srt)
    #[arg(long)]
    srt_suffix: Option<String>,

    /// Voice passed to the speech engine
    #[arg(short, long)]
    voice: Option<String>,

    /// Sample rate of the dub track in Hz
    #[arg(long, visible_alias = "sr")]
    sample_rate: Option<u32>,

    /// Speaking rate in words per minute
    #[arg(long)]
    wpm: Option<u32>,

    /// Keep the original audio as an additional, non-default track
    #[arg(short, long)]
    keep_original: bool,

    /// Language of the dub track (ISO 639-1 or 639-2)
    #[arg(long)]
    language: Option<String>,

    /// Token inserted before the extension of the dubbed video
    #[arg(long)]
    output_suffix: Option<String>,

    /// Process subdirectories as well
    #[arg(short, long)]
    recursive: bool,

    /// Re-dub videos whose output already exists
    #[arg(short, long)]
    force_overwrite: bool,

    /// Only write the dub track, do not mux
    #[arg(short, long)]
    audio_only: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// srtdub - dub videos from their subtitles
///
/// Speaks every subtitle cue with a text-to-speech engine, lines the speech up
/// with the subtitle timestamps and muxes the result into the video.
#[derive(Parser, Debug)]
#[command(name = "srtdub")]
#[command(version)]
#[command(about = "Subtitle-driven video dubbing")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "srtdub reads <video><suffix>.srt next to each video, speaks every cue with a
text-to-speech engine and muxes the generated track into <video><suffix>.<ext>.

EXAMPLES:
    srtdub movie.mp4                         # Uses movie.de.srt and voice Anna, replaces audio
    srtdub /videos --keep-original           # Whole folder, original audio kept as second track
    srtdub /videos --voice Markus --wpm 185  # Different voice and speaking rate
    srtdub movie.de.srt                      # Only build movie.de.wav
    srtdub completions bash > srtdub.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line flags override the file.

EXIT STATUS:
    0 when at least one item succeeded or nothing failed, 1 when every
    processed item failed or the configuration is invalid, 2 when the input
    path does not exist.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    dub: DubArgs,
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

    // @returns: Color escape and emoji for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", ""),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}{}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling, the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srtdub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Dub(args)) => run_dub(args).await,
        None => run_dub(cli.dub).await,
    }
}

/// Load the configuration file, creating a default one if it is missing
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

/// Override config values with the ones given on the command line
fn apply_overrides(config: &mut Config, options: &DubArgs) {
    if let Some(suffix) = &options.srt_suffix {
        config.subtitle_suffix = suffix.clone();
    }
    if let Some(voice) = &options.voice {
        config.voice = voice.clone();
    }
    if let Some(sample_rate) = options.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(wpm) = options.wpm {
        config.words_per_minute = wpm;
    }
    if let Some(language) = &options.language {
        config.language = language.clone();
    }
    if let Some(output_suffix) = &options.output_suffix {
        config.output_suffix = output_suffix.clone();
    }
    if options.keep_original {
        config.keep_original = true;
    }
    if options.recursive {
        config.recursive = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_dub(options: DubArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let input_path = match &options.input_path {
        Some(path) => path.clone(),
        None => {
            CommandLineOptions::command().print_help()?;
            return Ok(());
        }
    };

    if !input_path.exists() {
        error!("Input path does not exist: {}", input_path.display());
        std::process::exit(EXIT_INPUT_NOT_FOUND);
    }

    let mut config = load_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?
        .force_overwrite(options.force_overwrite)
        .audio_only(options.audio_only);

    let report = controller.run(&input_path).await?;

    if report.failed() > 0 && report.succeeded() == 0 {
        std::process::exit(1);
    }

    Ok(())
}
