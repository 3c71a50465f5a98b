use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Voice passed to the speech engine
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speaking rate in words per minute
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,

    /// Sample rate of the dub track in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Channel count of the dub track
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Silence appended after the last cue, in milliseconds (at least 1000)
    #[serde(default = "default_trailing_padding_ms")]
    pub trailing_padding_ms: u64,

    /// Token between the video stem and `.srt` (e.g. ".de" for "movie.de.srt")
    #[serde(default = "default_subtitle_suffix")]
    pub subtitle_suffix: String,

    /// Token between the video stem and its extension for the dubbed output
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Language of the dub track (ISO 639-1 or 639-2)
    #[serde(default = "default_language")]
    pub language: String,

    /// Keep the source audio streams as additional, non-default tracks
    #[serde(default)]
    pub keep_original: bool,

    /// Descend into subdirectories when the input is a folder
    #[serde(default)]
    pub recursive: bool,

    /// Speech engine settings
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Muxer settings
    #[serde(default)]
    pub mux: MuxConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// External speech engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    // @field: Engine program (invoked as `<program> -v <voice> -r <wpm> -o <out> -f <text>`)
    #[serde(default = "default_speech_program")]
    pub program: String,

    // @field: Extension of the file the engine writes
    #[serde(default = "default_speech_output_extension")]
    pub output_extension: String,

    // @field: Per-cue timeout in seconds, 0 waits indefinitely
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: default_speech_program(),
            output_extension: default_speech_output_extension(),
            timeout_secs: 0,
        }
    }
}

impl SpeechConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// External muxer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MuxConfig {
    // @field: ffmpeg binary, also used to transcode engine output
    #[serde(default = "default_mux_program")]
    pub program: String,

    // @field: Codec for the muxed audio tracks
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    // @field: Move the index to the front of MP4/MOV outputs
    #[serde(default = "default_true")]
    pub faststart: bool,

    // @field: Timeout in seconds, 0 waits indefinitely
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            program: default_mux_program(),
            audio_codec: default_audio_codec(),
            faststart: true,
            timeout_secs: 0,
        }
    }
}

impl MuxConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_voice() -> String {
    "Anna".to_string()
}

fn default_words_per_minute() -> u32 {
    200
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_channels() -> u16 {
    1
}

fn default_trailing_padding_ms() -> u64 {
    1000
}

fn default_subtitle_suffix() -> String {
    ".de".to_string()
}

fn default_output_suffix() -> String {
    ".de".to_string()
}

fn default_language() -> String {
    "de".to_string()
}

fn default_speech_program() -> String {
    "say".to_string()
}

fn default_speech_output_extension() -> String {
    "aiff".to_string()
}

fn default_mux_program() -> String {
    "ffmpeg".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.voice.trim().is_empty() {
            return Err(anyhow!("Voice must not be empty"));
        }

        if self.words_per_minute == 0 {
            return Err(anyhow!("Words per minute must be greater than zero"));
        }

        if self.sample_rate == 0 {
            return Err(anyhow!("Sample rate must be greater than zero"));
        }

        if self.channels == 0 {
            return Err(anyhow!("Channel count must be greater than zero"));
        }

        if self.trailing_padding_ms < 1000 {
            return Err(anyhow!(
                "Trailing padding must be at least 1000 ms, got {}",
                self.trailing_padding_ms
            ));
        }

        if self.output_suffix.is_empty() {
            return Err(anyhow!("Output suffix must not be empty, the source video would be overwritten"));
        }

        if self.speech.program.trim().is_empty() || self.mux.program.trim().is_empty() {
            return Err(anyhow!("Speech engine and muxer programs must be set"));
        }

        // Validate the track language
        let _name = crate::language_utils::get_language_name(&self.language)?;

        Ok(())
    }

    /// Trailing silence after the last cue
    pub fn trailing_padding(&self) -> Duration {
        Duration::from_millis(self.trailing_padding_ms)
    }

    /// ISO 639-2/T tag written into the container
    pub fn language_tag(&self) -> Result<String> {
        crate::language_utils::normalize_to_part2t(&self.language)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            voice: default_voice(),
            words_per_minute: default_words_per_minute(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            trailing_padding_ms: default_trailing_padding_ms(),
            subtitle_suffix: default_subtitle_suffix(),
            output_suffix: default_output_suffix(),
            language: default_language(),
            keep_original: false,
            recursive: false,
            speech: SpeechConfig::default(),
            mux: MuxConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
