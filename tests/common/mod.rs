/*!
 * Common test utilities for the srtdub test suite
 */

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use srtdub::app_config::Config;
use srtdub::audio::AudioBuffer;

/// Two cues, at 1s and 5s
pub const TWO_CUE_SRT: &str = "1
00:00:01,000 --> 00:00:02,000
hi

2
00:00:05,000 --> 00:00:06,000
bye
";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a placeholder video and its `.de.srt` subtitle, returns the video path
pub fn create_video_with_subtitle(dir: &Path, stem: &str, srt: &str) -> Result<PathBuf> {
    let video = create_test_file(dir, &format!("{}.mp4", stem), "not really a video")?;
    create_test_file(dir, &format!("{}.de.srt", stem), srt)?;
    Ok(video)
}

/// Config used by controller tests: defaults, 24 kHz mono
pub fn test_config() -> Config {
    Config::default()
}

/// Writes a mono 16-bit WAV with a constant level
pub fn write_test_wav(path: &Path, seconds: f64, sample_rate: u32, level: f32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = (seconds * sample_rate as f64) as usize;
    for _ in 0..frames {
        writer.write_sample((level * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Loads a WAV written by the exporter
pub fn read_track(path: &Path) -> AudioBuffer {
    AudioBuffer::read_wav(path).expect("track should be a readable WAV")
}
