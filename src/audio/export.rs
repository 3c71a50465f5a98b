use std::io::BufWriter;
use std::path::{Path, PathBuf};
use log::debug;
use tempfile::NamedTempFile;

use crate::audio::AudioBuffer;
use crate::errors::ExportError;

// @module: Persisting the assembled track

/// Writes finished tracks as 16-bit PCM WAV in a fixed format
#[derive(Debug, Clone)]
pub struct TrackExporter {
    sample_rate: u32,
    channels: u16,
}

impl TrackExporter {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self { sample_rate, channels }
    }

    /// Write `buffer` to `path`, converting it to the exporter's format first.
    ///
    /// The file is staged next to `path` and renamed into place once fully
    /// written, so a failed export never leaves a truncated file behind.
    pub fn export<P: AsRef<Path>>(&self, buffer: AudioBuffer, path: P) -> Result<PathBuf, ExportError> {
        let path = path.as_ref();
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(ExportError::UnsupportedFormat(format!(
                "{} Hz / {} channel(s)",
                self.sample_rate, self.channels
            )));
        }

        let buffer = buffer.normalized(self.sample_rate, self.channels);
        let write_err = |message: String| ExportError::Write {
            path: path.to_path_buf(),
            message,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut staged = NamedTempFile::new_in(&parent).map_err(|e| write_err(e.to_string()))?;

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        {
            let mut writer = hound::WavWriter::new(BufWriter::new(staged.as_file_mut()), spec)
                .map_err(|e| write_err(e.to_string()))?;
            for sample in buffer.samples() {
                writer
                    .write_sample(to_pcm16(*sample))
                    .map_err(|e| write_err(e.to_string()))?;
            }
            writer.finalize().map_err(|e| write_err(e.to_string()))?;
        }

        staged.persist(path).map_err(|e| write_err(e.error.to_string()))?;

        debug!(
            "Exported {:.3}s of audio to {}",
            buffer.duration_secs(),
            path.display()
        );
        Ok(path.to_path_buf())
    }
}

/// Clamp a mixed sample and scale it to i16
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
