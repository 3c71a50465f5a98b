/*!
 * Mock muxer for testing.
 *
 * Writes a small placeholder file instead of running ffmpeg and remembers
 * every request so tests can check what the pipeline asked for.
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::MuxError;
use crate::mux::{suffixed_output_path, Muxer};

/// One recorded mux request
#[derive(Debug, Clone, PartialEq)]
pub struct MuxRequest {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub keep_original: bool,
}

/// Muxer that records requests and optionally fails
#[derive(Debug, Clone)]
pub struct RecordingMuxer {
    output_suffix: String,
    fail: bool,
    requests: Arc<Mutex<Vec<MuxRequest>>>,
}

impl RecordingMuxer {
    pub fn new(output_suffix: impl Into<String>) -> Self {
        Self {
            output_suffix: output_suffix.into(),
            fail: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A muxer whose every run exits with an error
    pub fn failing(output_suffix: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(output_suffix)
        }
    }

    pub fn requests(&self) -> Vec<MuxRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Muxer for RecordingMuxer {
    fn output_path(&self, video: &Path) -> PathBuf {
        suffixed_output_path(video, &self.output_suffix)
    }

    async fn mux(&self, video: &Path, audio: &Path, keep_original: bool) -> Result<PathBuf, MuxError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(MuxRequest {
                video: video.to_path_buf(),
                audio: audio.to_path_buf(),
                keep_original,
            });
        }

        if self.fail {
            return Err(MuxError::MuxFailed {
                status: "exit code 1".to_string(),
                stderr: "mock mux failure".to_string(),
            });
        }

        let output = self.output_path(video);
        tokio::fs::write(&output, b"muxed")
            .await
            .map_err(|e| MuxError::Output {
                path: output.clone(),
                message: e.to_string(),
            })?;
        Ok(output)
    }
}
