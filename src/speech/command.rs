/*!
 * Speech engine backed by an external program.
 *
 * The program is invoked the way macOS `say` expects:
 * `<program> -v <voice> -r <wpm> -o <output file> -f <text file>`.
 * Output that is not WAV is converted with ffmpeg before decoding.
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::audio::AudioBuffer;
use crate::errors::SynthesisError;
use crate::process_utils::{self, RunError};
use crate::speech::SpeechEngine;

/// Runs an external TTS program once per cue
#[derive(Debug, Clone)]
pub struct CommandSpeechEngine {
    program: String,
    output_extension: String,
    transcoder: String,
    timeout: Option<Duration>,
}

impl CommandSpeechEngine {
    pub fn new(program: impl Into<String>, output_extension: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            output_extension: output_extension.into().trim_start_matches('.').to_string(),
            transcoder: "ffmpeg".to_string(),
            timeout: None,
        }
    }

    /// Program used to convert non-WAV output
    pub fn with_transcoder(mut self, transcoder: impl Into<String>) -> Self {
        self.transcoder = transcoder.into();
        self
    }

    /// Give up on a cue after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to the engine program
    pub fn engine_args(voice: &str, words_per_minute: u32, output: &Path, text_file: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            voice.to_string(),
            "-r".to_string(),
            words_per_minute.to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
            "-f".to_string(),
            text_file.to_string_lossy().to_string(),
        ]
    }

    fn is_wav(&self) -> bool {
        self.output_extension.eq_ignore_ascii_case("wav")
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<(), SynthesisError> {
        let mut command = Command::new(program);
        command.args(args);

        let output = process_utils::run_command(command, self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Spawn(err) => SynthesisError::Spawn {
                    program: program.to_string(),
                    message: err.to_string(),
                },
                RunError::TimedOut(limit) => SynthesisError::Timeout(limit.as_secs()),
            })?;

        if !output.status.success() {
            return Err(SynthesisError::EngineFailed {
                status: process_utils::describe_status(&output),
                stderr: process_utils::filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(())
    }

    async fn to_wav(&self, rendered: &Path, workdir: &Path) -> Result<PathBuf, SynthesisError> {
        if self.is_wav() {
            return Ok(rendered.to_path_buf());
        }

        let wav = workdir.join("segment.wav");
        let args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            rendered.to_string_lossy().to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            wav.to_string_lossy().to_string(),
        ];
        self.run(&self.transcoder, &args).await?;
        Ok(wav)
    }
}

impl Default for CommandSpeechEngine {
    fn default() -> Self {
        Self::new("say", "aiff")
    }
}

#[async_trait]
impl SpeechEngine for CommandSpeechEngine {
    async fn synthesize(&self, text: &str, voice: &str, words_per_minute: u32) -> Result<AudioBuffer, SynthesisError> {
        // Removed with everything in it when this call returns, on any path
        let workdir = tempfile::Builder::new().prefix("srtdub-cue-").tempdir()?;

        let text_file = workdir.path().join("segment.txt");
        tokio::fs::write(&text_file, text).await?;

        let rendered = workdir.path().join(format!("segment.{}", self.output_extension));
        let args = Self::engine_args(voice, words_per_minute, &rendered, &text_file);
        self.run(&self.program, &args).await?;

        if !rendered.exists() {
            return Err(SynthesisError::Decode(format!(
                "{} reported success but wrote no file",
                self.program
            )));
        }

        let wav = self.to_wav(&rendered, workdir.path()).await?;
        AudioBuffer::read_wav(&wav).map_err(|e| SynthesisError::Decode(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.program
    }
}
