/*!
 * Audio buffers and the dub track pipeline stages built on them.
 *
 * - `AudioBuffer`: interleaved f32 PCM with its format
 * - `timeline`: silence-initialized track that cues are overlaid onto
 * - `export`: WAV writer for the finished track
 */

use std::path::Path;

pub mod export;
pub mod timeline;

pub use export::TrackExporter;
pub use timeline::{AssemblyReport, Timeline};

/// Interleaved PCM samples in the range [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples.
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        AudioBuffer {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Create a buffer of `frames` frames of silence
    pub fn silence(frames: usize, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        AudioBuffer {
            samples: vec![0.0; frames * channels as usize],
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root mean square of the samples in `[from, to)` seconds, all channels
    pub fn rms_between(&self, from: f64, to: f64) -> f32 {
        let channels = self.channels as usize;
        let first = ((from.max(0.0) * self.sample_rate as f64) as usize).min(self.frames());
        let last = ((to.max(0.0) * self.sample_rate as f64) as usize).min(self.frames());
        if last <= first {
            return 0.0;
        }

        let window = &self.samples[first * channels..last * channels];
        let sum: f64 = window.iter().map(|s| (*s as f64) * (*s as f64)).sum();
        (sum / window.len() as f64).sqrt() as f32
    }

    /// Convert to the given rate and channel count.
    ///
    /// Channels are averaged down to mono first, then duplicated out to the
    /// target layout. Rate conversion uses linear interpolation.
    pub fn normalized(self, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        if self.sample_rate == sample_rate && self.channels == channels {
            return self;
        }

        let mono = self.into_mono();
        let resampled = mono.resampled(sample_rate);
        resampled.with_channels(channels)
    }

    /// Average all channels into one
    pub fn into_mono(self) -> Self {
        if self.channels == 1 {
            return self;
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }

    /// Linear-interpolation resample of a mono buffer
    fn resampled(self, target_rate: u32) -> Self {
        if self.sample_rate == target_rate || self.sample_rate == 0 || self.samples.is_empty() {
            return AudioBuffer {
                sample_rate: target_rate,
                ..self
            };
        }

        let source = &self.samples;
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_len = ((source.len() as f64) / ratio).round() as usize;
        let last = source.len() - 1;

        let samples = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = (pos.floor() as usize).min(last);
                let next = (idx + 1).min(last);
                let frac = (pos - idx as f64) as f32;
                source[idx] + (source[next] - source[idx]) * frac
            })
            .collect();

        AudioBuffer {
            samples,
            sample_rate: target_rate,
            channels: 1,
        }
    }

    /// Duplicate a mono buffer across `channels`
    fn with_channels(self, channels: u16) -> Self {
        if channels == 1 {
            return self;
        }

        let samples = self
            .samples
            .iter()
            .flat_map(|s| std::iter::repeat_n(*s, channels as usize))
            .collect();

        AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
            channels,
        }
    }

    /// Decode a WAV file (integer or float PCM)
    pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Self, hound::Error> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<f32>, _>>()?
            }
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
        };

        Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
    }
}
