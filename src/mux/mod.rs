/*!
 * Muxing the dub track into the source video.
 *
 * - `Muxer`: capability trait for combining a video with a new audio track
 * - `FfmpegMuxer`: ffmpeg-based implementation (video stream copied, audio encoded)
 * - `mock::RecordingMuxer`: records calls for tests
 */

use async_trait::async_trait;
use log::{debug, info};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::errors::MuxError;
use crate::process_utils::{self, RunError};

pub mod mock;

pub use mock::RecordingMuxer;

/// Common trait for muxing backends
#[async_trait]
pub trait Muxer: Send + Sync + Debug {
    /// Where the muxed container for `video` will be written
    fn output_path(&self, video: &Path) -> PathBuf;

    /// Combine `video` with `audio` as the default audio track.
    /// With `keep_original`, the source audio streams follow as non-default tracks.
    ///
    /// # Returns
    /// * `Result<PathBuf, MuxError>` - The written container, or an error
    async fn mux(&self, video: &Path, audio: &Path, keep_original: bool) -> Result<PathBuf, MuxError>;
}

/// Build the output path `<stem><suffix>.<ext>` next to `video`
pub fn suffixed_output_path(video: &Path, suffix: &str) -> PathBuf {
    let stem = video.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match video.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    video.with_file_name(file_name)
}

/// ffmpeg-driven muxer
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: String,
    audio_codec: String,
    language_tag: String,
    output_suffix: String,
    faststart: bool,
    timeout: Option<Duration>,
}

impl FfmpegMuxer {
    /// `language_tag` is written as stream metadata; `output_suffix` is
    /// inserted between the video stem and its extension.
    pub fn new(language_tag: impl Into<String>, output_suffix: impl Into<String>) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            audio_codec: "aac".to_string(),
            language_tag: language_tag.into(),
            output_suffix: output_suffix.into(),
            faststart: true,
            timeout: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = codec.into();
        self
    }

    pub fn with_faststart(mut self, faststart: bool) -> Self {
        self.faststart = faststart;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments for one mux run writing to `output`
    pub fn build_args(&self, video: &Path, audio: &Path, keep_original: bool, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            video.to_string_lossy().to_string(),
            "-i".into(),
            audio.to_string_lossy().to_string(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
        ];

        // Generated track first, then whatever audio the source has
        if keep_original {
            args.extend(["-map".into(), "0:a?".into()]);
        }

        args.extend([
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            self.audio_codec.clone(),
            "-shortest".into(),
        ]);

        if keep_original {
            args.extend(["-disposition:a".into(), "0".into()]);
        }

        args.extend([
            "-metadata:s:a:0".into(),
            format!("language={}", self.language_tag),
            "-disposition:a:0".into(),
            "default".into(),
        ]);

        if self.faststart && Self::supports_faststart(output) {
            args.extend(["-movflags".into(), "+faststart".into()]);
        }

        args.push(output.to_string_lossy().to_string());
        args
    }

    fn supports_faststart(output: &Path) -> bool {
        output
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                matches!(ext.as_str(), "mp4" | "m4v" | "mov")
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn output_path(&self, video: &Path) -> PathBuf {
        suffixed_output_path(video, &self.output_suffix)
    }

    async fn mux(&self, video: &Path, audio: &Path, keep_original: bool) -> Result<PathBuf, MuxError> {
        let output = self.output_path(video);
        let output_err = |message: String| MuxError::Output {
            path: output.clone(),
            message,
        };

        if output == video {
            return Err(output_err("output would overwrite the source video".to_string()));
        }

        // ffmpeg picks the container from the extension, so the staging file keeps it
        let extension = video
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staged = tempfile::Builder::new()
            .prefix(".srtdub-")
            .suffix(&extension)
            .tempfile_in(&parent)
            .map_err(|e| output_err(e.to_string()))?;

        let args = self.build_args(video, audio, keep_original, staged.path());
        debug!("{} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command.args(&args);
        let result = process_utils::run_command(command, self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Spawn(err) => MuxError::Spawn {
                    program: self.program.clone(),
                    message: err.to_string(),
                },
                RunError::TimedOut(limit) => MuxError::Timeout(limit.as_secs()),
            })?;

        if !result.status.success() {
            // staged file is removed on drop
            return Err(MuxError::MuxFailed {
                status: process_utils::describe_status(&result),
                stderr: process_utils::filter_ffmpeg_stderr(&String::from_utf8_lossy(&result.stderr)),
            });
        }

        staged
            .persist(&output)
            .map_err(|e| output_err(e.error.to_string()))?;

        info!("Muxed {}", output.display());
        Ok(output)
    }
}
