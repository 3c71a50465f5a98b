/*!
 * Error types for the srtdub application.
 *
 * Errors are grouped by the stage that raises them. Cue-level failures
 * (`SynthesisError`) are recovered by the pipeline; file-level failures
 * (`SubtitleError`, `ExportError`, `MuxError`, `DubError`) end the current
 * item without affecting the rest of a batch.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing a subtitle file
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A block could not be parsed into a cue
    #[error("Malformed subtitle block {block}: {reason}")]
    MalformedSubtitle {
        /// 1-based position of the offending block
        block: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The file contained no cues at all
    #[error("Subtitle contains no cues")]
    EmptyCueSequence,

    /// The subtitle file could not be read
    #[error("Failed to read subtitle file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from rendering a single cue with the speech engine
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The engine process could not be started
    #[error("Failed to start speech engine '{program}': {message}")]
    Spawn { program: String, message: String },

    /// The engine exited with a failure status
    #[error("Speech engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    /// The engine did not finish in time
    #[error("Speech engine timed out after {0} seconds")]
    Timeout(u64),

    /// The rendered audio could not be decoded
    #[error("Failed to decode rendered audio: {0}")]
    Decode(String),

    /// Temporary files for the cue could not be prepared
    #[error("Failed to prepare temporary files: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from writing the assembled track
#[derive(Error, Debug)]
pub enum ExportError {
    /// The destination could not be created or written
    #[error("Failed to write audio track {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    /// The buffer format cannot be encoded
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Errors from the external muxer
#[derive(Error, Debug)]
pub enum MuxError {
    /// The muxer process could not be started
    #[error("Failed to start muxer '{program}': {message}")]
    Spawn { program: String, message: String },

    /// The muxer exited with a failure status
    #[error("Muxer exited with {status}: {stderr}")]
    MuxFailed { status: String, stderr: String },

    /// The muxer did not finish in time
    #[error("Muxer timed out after {0} seconds")]
    Timeout(u64),

    /// The output could not be staged or moved into place
    #[error("Failed to place muxed output {path:?}: {message}")]
    Output { path: PathBuf, message: String },
}

/// Errors that end the processing of one video/subtitle pair
#[derive(Error, Debug)]
pub enum DubError {
    /// No subtitle file matched the video
    #[error("No subtitle found for {video:?} (expected {expected:?})")]
    MissingSubtitle { video: PathBuf, expected: PathBuf },

    /// Subtitle parsing failed
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Writing the dub track failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Muxing failed
    #[error("Mux error: {0}")]
    Mux(#[from] MuxError),
}
