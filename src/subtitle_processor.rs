use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};
use crate::errors::SubtitleError;

// @module: Subtitle parsing into timed cues

// @const: SRT time range regex, hours may exceed two digits, short fields are accepted
static TIME_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})").unwrap()
});

// @struct: Single timed subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: 1-based position in the source file
    pub index: usize,

    // @field: Start offset in seconds
    pub start: f64,

    // @field: End offset in seconds
    pub end: f64,

    // @field: Spoken text, may contain line breaks
    pub text: String,
}

impl Cue {
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Cue {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Nominal duration in seconds, negative for degenerate cues
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the cue ends at or before its start
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }

    /// Parse an SRT timestamp (`H:MM:SS,mmm`) to fractional seconds
    pub fn parse_timestamp(timestamp: &str) -> Result<f64, SubtitleError> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(SubtitleError::MalformedSubtitle {
                block: 0,
                reason: format!("invalid timestamp '{}'", timestamp),
            });
        }

        let mut values = [0u64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| SubtitleError::MalformedSubtitle {
                block: 0,
                reason: format!("invalid timestamp '{}'", timestamp),
            })?;
        }

        let [hours, minutes, seconds, millis] = values;
        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(SubtitleError::MalformedSubtitle {
                block: 0,
                reason: format!("timestamp component out of range in '{}'", timestamp),
            });
        }

        Self::to_seconds(hours, minutes, seconds, millis).ok_or_else(|| SubtitleError::MalformedSubtitle {
            block: 0,
            reason: format!("timestamp out of range in '{}'", timestamp),
        })
    }

    /// Format seconds as an SRT timestamp (HH:MM:SS,mmm), rounded to the millisecond
    pub fn format_timestamp(seconds: f64) -> String {
        let ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let secs = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end)
    }

    /// `None` when the whole seconds do not fit in a u64
    fn to_seconds(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<f64> {
        let whole = hours
            .checked_mul(3600)?
            .checked_add(minutes * 60)?
            .checked_add(seconds)?;
        Some(whole as f64 + millis as f64 / 1000.0)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Ordered, non-empty list of cues from one subtitle file
#[derive(Debug, Clone)]
pub struct CueSequence {
    /// File the cues were read from
    pub source_file: PathBuf,

    cues: Vec<Cue>,
}

impl CueSequence {
    /// Wrap already-built cues, rejecting an empty list
    pub fn from_cues(source_file: PathBuf, cues: Vec<Cue>) -> Result<Self, SubtitleError> {
        if cues.is_empty() {
            return Err(SubtitleError::EmptyCueSequence);
        }
        Ok(CueSequence { source_file, cues })
    }

    /// Read and parse an SRT file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SubtitleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let cues = Self::parse_srt_string(&content)?;
        Self::from_cues(path.to_path_buf(), cues)
    }

    /// Parse SRT content into cues, in input order.
    ///
    /// Blocks are separated by blank lines. Each block is an index line, a
    /// time range line and zero or more text lines. A block that is too short
    /// or has an unreadable time range fails the whole parse.
    pub fn parse_srt_string(content: &str) -> Result<Vec<Cue>, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut cues = Vec::new();
        let mut block: Vec<&str> = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    cues.push(Self::parse_block(&block, cues.len() + 1)?);
                    block.clear();
                }
            } else {
                block.push(line.trim_end_matches('\r'));
            }
        }

        // Input without a trailing blank line
        if !block.is_empty() {
            cues.push(Self::parse_block(&block, cues.len() + 1)?);
        }

        let degenerate = cues.iter().filter(|c| c.is_degenerate()).count();
        if degenerate > 0 {
            warn!("Found {} cue(s) ending at or before their start", degenerate);
        }

        let out_of_order = cues.windows(2).filter(|w| w[1].start < w[0].start).count();
        if out_of_order > 0 {
            debug!("{} cue(s) start earlier than their predecessor", out_of_order);
        }

        Ok(cues)
    }

    fn parse_block(lines: &[&str], position: usize) -> Result<Cue, SubtitleError> {
        if lines.len() < 2 {
            return Err(SubtitleError::MalformedSubtitle {
                block: position,
                reason: format!("expected at least 2 lines, found {}", lines.len()),
            });
        }

        let caps = TIME_RANGE_REGEX.captures(lines[1]).ok_or_else(|| {
            SubtitleError::MalformedSubtitle {
                block: position,
                reason: format!("invalid time range '{}'", lines[1].trim()),
            }
        })?;

        let start = Self::captured_seconds(&caps, 1, position)?;
        let end = Self::captured_seconds(&caps, 5, position)?;
        let text = lines[2..].join("\n").trim().to_string();

        Ok(Cue::new(position, start, end, text))
    }

    fn captured_seconds(caps: &regex::Captures, start_idx: usize, position: usize) -> Result<f64, SubtitleError> {
        let mut values = [0u64; 4];
        for (offset, slot) in values.iter_mut().enumerate() {
            let raw = caps.get(start_idx + offset).map_or("", |m| m.as_str());
            *slot = raw.parse().map_err(|_| SubtitleError::MalformedSubtitle {
                block: position,
                reason: format!("invalid timestamp component '{}'", raw),
            })?;
        }

        let [hours, minutes, seconds, millis] = values;
        if minutes >= 60 || seconds >= 60 {
            return Err(SubtitleError::MalformedSubtitle {
                block: position,
                reason: "timestamp component out of range".to_string(),
            });
        }

        Cue::to_seconds(hours, minutes, seconds, millis).ok_or_else(|| SubtitleError::MalformedSubtitle {
            block: position,
            reason: "timestamp out of range".to_string(),
        })
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Latest end time across all cues, regardless of their order
    pub fn max_end(&self) -> f64 {
        self.cues.iter().map(|c| c.end).fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a CueSequence {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl fmt::Display for CueSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Sequence")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        writeln!(f, "Ends at: {}", Cue::format_timestamp(self.max_end()))
    }
}
