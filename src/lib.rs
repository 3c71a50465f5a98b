/*!
 * # srtdub - dub videos from their subtitles
 *
 * A Rust library that turns a timed subtitle file into a spoken audio track
 * and muxes it into the matching video.
 *
 * ## Features
 *
 * - Parse SRT subtitles into timed cues
 * - Render each cue with an external text-to-speech program (macOS `say` by default)
 * - Place every rendered fragment at its cue's start time on one shared track
 * - Keep going when single cues fail to render (they stay silent)
 * - Export the track as WAV and mux it into the video with ffmpeg
 * - Optionally keep the original audio as a secondary track
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Cue parsing
 * - `speech`: Speech engines and per-cue synthesis
 * - `audio`: Audio buffers, timeline assembly and track export
 * - `mux`: Container muxing
 * - `file_utils`: Video and subtitle discovery
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod mux;
pub mod process_utils;
pub mod speech;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchReport, Controller, DubOutcome};
pub use audio::{AudioBuffer, Timeline, TrackExporter};
pub use subtitle_processor::{Cue, CueSequence};
pub use speech::{SegmentOutcome, SegmentSynthesizer, SpeechEngine};
pub use mux::{FfmpegMuxer, Muxer};
pub use errors::{DubError, ExportError, MuxError, SubtitleError, SynthesisError};
