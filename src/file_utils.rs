use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @const: Extensions treated as video input
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "mov", "m4v", "webm", "avi"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    /// Detect if a file is a subtitle file (SRT), a supported video, or neither
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if ext == "srt" {
            FileType::Subtitle
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Video
        } else {
            FileType::Unknown
        }
    }

    /// Videos under `input`, sorted by path.
    ///
    /// A file input yields itself if it is a video. A directory yields its
    /// direct children, or its whole tree when `recursive` is set.
    pub fn find_videos<P: AsRef<Path>>(input: P, recursive: bool) -> Result<Vec<PathBuf>> {
        let input = input.as_ref();

        if input.is_file() {
            return Ok(match Self::detect_file_type(input) {
                FileType::Video => vec![input.to_path_buf()],
                _ => Vec::new(),
            });
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut videos = Vec::new();
        for entry in WalkDir::new(input).max_depth(max_depth).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::detect_file_type(path) == FileType::Video {
                videos.push(path.to_path_buf());
            }
        }

        videos.sort();
        Ok(videos)
    }

    /// Expected subtitle for a video: `<stem><suffix>.srt` in the same directory
    pub fn subtitle_path_for<P: AsRef<Path>>(video: P, subtitle_suffix: &str) -> PathBuf {
        let video = video.as_ref();
        let stem = video.file_stem().unwrap_or_default().to_string_lossy();
        video.with_file_name(format!("{}{}.srt", stem, subtitle_suffix))
    }

    /// The subtitle for `video` if it exists
    pub fn find_matching_subtitle<P: AsRef<Path>>(video: P, subtitle_suffix: &str) -> Option<PathBuf> {
        let candidate = Self::subtitle_path_for(video, subtitle_suffix);
        Self::file_exists(&candidate).then_some(candidate)
    }

    /// Dub track for a subtitle: `<subtitle stem>.wav` next to it
    pub fn dub_track_path<P: AsRef<Path>>(subtitle: P) -> PathBuf {
        subtitle.as_ref().with_extension("wav")
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Video file
    Video,
    /// Unknown file type
    Unknown,
}
