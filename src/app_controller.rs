use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::audio::{AssemblyReport, Timeline, TrackExporter};
use crate::errors::DubError;
use crate::file_utils::{FileManager, FileType};
use crate::mux::{FfmpegMuxer, Muxer};
use crate::speech::{CommandSpeechEngine, SegmentSynthesizer, SpeechEngine};
use crate::subtitle_processor::CueSequence;

// @module: Application controller for dubbing videos

/// Result of processing one input item
#[derive(Debug)]
pub enum DubOutcome {
    /// Video muxed with its new track
    Dubbed { video: PathBuf, output: PathBuf, report: AssemblyReport },
    /// Track written, muxing not requested
    TrackOnly { subtitle: PathBuf, track: PathBuf, report: AssemblyReport },
    /// Nothing done for this item
    Skipped { item: PathBuf, reason: String },
    /// Processing stopped with an error
    Failed { item: PathBuf, error: String },
}

impl DubOutcome {
    fn item_name(path: &Path) -> String {
        path.file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    }
}

impl fmt::Display for DubOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DubOutcome::Dubbed { video, output, report } => write!(
                f,
                "[DONE] {} -> {} ({})",
                Self::item_name(video),
                output.display(),
                report.summary()
            ),
            DubOutcome::TrackOnly { subtitle, track, report } => write!(
                f,
                "[DONE] {} -> {} ({})",
                Self::item_name(subtitle),
                track.display(),
                report.summary()
            ),
            DubOutcome::Skipped { item, reason } => {
                write!(f, "[SKIP] {}: {}", Self::item_name(item), reason)
            }
            DubOutcome::Failed { item, error } => {
                write!(f, "[FAIL] {}: {}", Self::item_name(item), error)
            }
        }
    }
}

/// Outcomes of a whole run, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DubOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DubOutcome::Dubbed { .. } | DubOutcome::TrackOnly { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, DubOutcome::Skipped { .. })).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, DubOutcome::Failed { .. })).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} dubbed, {} skipped, {} failed",
            self.succeeded(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Main application controller for subtitle dubbing
pub struct Controller {
    // @field: App configuration
    config: Config,
    engine: Box<dyn SpeechEngine>,
    muxer: Box<dyn Muxer>,
    force_overwrite: bool,
    audio_only: bool,
    progress: MultiProgress,
}

impl Controller {
    // @method: Create a controller using the external tools named in the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let engine = CommandSpeechEngine::new(&config.speech.program, &config.speech.output_extension)
            .with_transcoder(&config.mux.program)
            .with_timeout(config.speech.timeout());

        let muxer = FfmpegMuxer::new(config.language_tag()?, &config.output_suffix)
            .with_program(&config.mux.program)
            .with_audio_codec(&config.mux.audio_codec)
            .with_faststart(config.mux.faststart)
            .with_timeout(config.mux.timeout());

        Ok(Self::with_backends(config, Box::new(engine), Box::new(muxer)))
    }

    /// Create a controller with explicit speech and mux backends
    pub fn with_backends(config: Config, engine: Box<dyn SpeechEngine>, muxer: Box<dyn Muxer>) -> Self {
        Self {
            config,
            engine,
            muxer,
            force_overwrite: false,
            audio_only: false,
            progress: MultiProgress::new(),
        }
    }

    /// Re-dub videos whose output already exists
    pub fn force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Stop after writing the dub track
    pub fn audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    /// Hide progress bars (tests, non-interactive runs)
    pub fn without_progress(mut self) -> Self {
        self.progress = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process a video, a subtitle file, or every video in a folder.
    ///
    /// Only a missing input is an error; failures of individual items are
    /// recorded in the report and never stop the run.
    pub async fn run(&self, input: &Path) -> Result<BatchReport> {
        if !input.exists() {
            return Err(anyhow!("Input path does not exist: {:?}", input));
        }

        let mut report = BatchReport::default();

        if input.is_file() && FileManager::detect_file_type(input) == FileType::Subtitle {
            let outcome = self.process_subtitle(input).await;
            Self::log_outcome(&outcome);
            report.outcomes.push(outcome);
            return Ok(report);
        }

        let found = FileManager::find_videos(input, self.config.recursive)?;
        let outputs: Vec<PathBuf> = found.iter().map(|v| self.muxer.output_path(v)).collect();
        let videos: Vec<PathBuf> = found
            .into_iter()
            .filter(|v| {
                let is_output = outputs.contains(v);
                if is_output {
                    debug!("Ignoring earlier dub output {:?}", v);
                }
                !is_output
            })
            .collect();

        if videos.is_empty() {
            warn!("No video files found in {:?}", input);
            return Ok(report);
        }

        let folder_pb = self.progress.add(ProgressBar::new(videos.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));
        let start_time = std::time::Instant::now();

        for video in &videos {
            folder_pb.set_message(format!("Processing: {}", DubOutcome::item_name(video)));

            let outcome = self.process_video(video).await;
            Self::log_outcome(&outcome);
            report.outcomes.push(outcome);

            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();

        if videos.len() > 1 {
            info!(
                "Folder processing completed in {}: {}",
                Self::format_duration(start_time.elapsed()),
                report.summary()
            );
        }

        Ok(report)
    }

    /// Dub one video from its matching subtitle file
    pub async fn process_video(&self, video: &Path) -> DubOutcome {
        let subtitle = match FileManager::find_matching_subtitle(video, &self.config.subtitle_suffix) {
            Some(path) => path,
            None => {
                let err = DubError::MissingSubtitle {
                    video: video.to_path_buf(),
                    expected: FileManager::subtitle_path_for(video, &self.config.subtitle_suffix),
                };
                return DubOutcome::Skipped {
                    item: video.to_path_buf(),
                    reason: err.to_string(),
                };
            }
        };

        let output = self.muxer.output_path(video);
        if !self.audio_only && output.exists() && !self.force_overwrite {
            return DubOutcome::Skipped {
                item: video.to_path_buf(),
                reason: format!("{} already exists (use -f to force overwrite)", output.display()),
            };
        }

        info!("Dubbing {} from {}", DubOutcome::item_name(video), DubOutcome::item_name(&subtitle));

        let (track, report) = match self.build_dub_track(&subtitle).await {
            Ok(result) => result,
            Err(e) => {
                return DubOutcome::Failed {
                    item: video.to_path_buf(),
                    error: e.to_string(),
                }
            }
        };

        if self.audio_only {
            return DubOutcome::TrackOnly { subtitle, track, report };
        }

        match self.muxer.mux(video, &track, self.config.keep_original).await {
            Ok(output) => DubOutcome::Dubbed {
                video: video.to_path_buf(),
                output,
                report,
            },
            Err(e) => DubOutcome::Failed {
                item: video.to_path_buf(),
                error: DubError::from(e).to_string(),
            },
        }
    }

    /// Build only the dub track for a subtitle file
    pub async fn process_subtitle(&self, subtitle: &Path) -> DubOutcome {
        match self.build_dub_track(subtitle).await {
            Ok((track, report)) => DubOutcome::TrackOnly {
                subtitle: subtitle.to_path_buf(),
                track,
                report,
            },
            Err(e) => DubOutcome::Failed {
                item: subtitle.to_path_buf(),
                error: e.to_string(),
            },
        }
    }

    /// Parse, synthesize, assemble and export the track for one subtitle file
    pub async fn build_dub_track(&self, subtitle: &Path) -> Result<(PathBuf, AssemblyReport), DubError> {
        let cues = CueSequence::from_file(subtitle)?;
        debug!("{}", cues);

        let timeline = self.assemble(&cues).await;
        let (buffer, report) = timeline.finish();

        if !report.skipped.is_empty() {
            warn!(
                "{} of {} cues contribute silence: {:?}",
                report.skipped.len(),
                cues.len(),
                report.skipped
            );
        }

        let track_path = FileManager::dub_track_path(subtitle);
        let exporter = TrackExporter::new(self.config.sample_rate, self.config.channels);
        let track = exporter.export(buffer, &track_path)?;

        Ok((track, report))
    }

    /// Synthesize every cue in order and mix it onto a fresh timeline
    pub async fn assemble(&self, cues: &CueSequence) -> Timeline {
        let mut timeline = Timeline::for_cues(
            cues,
            self.config.sample_rate,
            self.config.channels,
            self.config.trailing_padding(),
        );

        let synthesizer = SegmentSynthesizer::new(
            self.engine.as_ref(),
            &self.config.voice,
            self.config.words_per_minute,
            self.config.sample_rate,
            self.config.channels,
        );

        let cue_pb = self.progress.add(ProgressBar::new(cues.len() as u64));
        cue_pb.set_style(Self::bar_style("cues"));
        cue_pb.set_message(format!("{} ({})", self.engine.name(), self.config.voice));

        for cue in cues {
            let outcome = synthesizer.render(cue).await;
            timeline.apply(cue, outcome);
            cue_pb.inc(1);
        }

        cue_pb.finish_and_clear();
        timeline
    }

    fn log_outcome(outcome: &DubOutcome) {
        match outcome {
            DubOutcome::Dubbed { .. } | DubOutcome::TrackOnly { .. } => info!("{}", outcome),
            DubOutcome::Skipped { .. } => warn!("{}", outcome),
            DubOutcome::Failed { .. } => error!("{}", outcome),
        }
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
