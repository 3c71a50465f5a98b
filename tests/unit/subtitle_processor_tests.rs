/*!
 * Tests for cue parsing
 */

use std::fmt::Write;
use std::path::PathBuf;
use anyhow::Result;
use srtdub::errors::SubtitleError;
use srtdub::subtitle_processor::{Cue, CueSequence};
use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let seconds = Cue::parse_timestamp(ts).unwrap();
    assert!((seconds - 5025.678).abs() < 1e-9);

    let formatted = Cue::format_timestamp(seconds);
    assert_eq!(formatted, ts);
}

/// Test that invalid timestamps are rejected
#[test]
fn test_timestamp_parsing_withOutOfRangeMinutes_shouldFail() {
    assert!(Cue::parse_timestamp("00:61:00,000").is_err());
    assert!(Cue::parse_timestamp("00:00:00").is_err());
    assert!(Cue::parse_timestamp("aa:00:00,000").is_err());
}

/// Test cue display formatting
#[test]
fn test_cue_display_withValidCue_shouldFormatAsSrtBlock() {
    let cue = Cue::new(3, 5.0, 10.25, "Test subtitle");
    let mut output = String::new();
    write!(output, "{}", cue).unwrap();

    assert_eq!(output, "3\n00:00:05,000 --> 00:00:10,250\nTest subtitle\n\n");
}

/// Test parsing SRT string content
#[test]
fn test_parse_srt_string_withValidContent_shouldParseCorrectly() -> Result<()> {
    let srt_content = "1\n00:00:01,000 --> 00:00:04,000\nHello world\n\n2\n00:00:05,000 --> 00:00:08,500\nTest subtitle\nSecond line\n\n";

    let cues = CueSequence::parse_srt_string(srt_content)?;

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].index, 1);
    assert_eq!(cues[0].start, 1.0);
    assert_eq!(cues[0].end, 4.0);
    assert_eq!(cues[0].text, "Hello world");

    assert_eq!(cues[1].index, 2);
    assert_eq!(cues[1].start, 5.0);
    assert_eq!(cues[1].end, 8.5);
    assert_eq!(cues[1].text, "Test subtitle\nSecond line");

    Ok(())
}

/// Test that parsed timestamps format back to the original strings
#[test]
fn test_parse_srt_string_withManyBlocks_shouldRoundTripTimestamps() -> Result<()> {
    let ranges = [
        ("00:00:00,001", "00:00:01,999"),
        ("00:01:02,345", "00:01:04,000"),
        ("01:59:59,999", "02:00:00,000"),
        ("10:00:00,500", "10:00:03,070"),
    ];
    let mut srt = String::new();
    for (i, (start, end)) in ranges.iter().enumerate() {
        srt.push_str(&format!("{}\n{} --> {}\nLine {}\n\n", i + 1, start, end, i + 1));
    }

    let cues = CueSequence::parse_srt_string(&srt)?;

    assert_eq!(cues.len(), ranges.len());
    for (cue, (start, end)) in cues.iter().zip(ranges.iter()) {
        assert_eq!(cue.format_start_time(), *start);
        assert_eq!(cue.format_end_time(), *end);
    }

    Ok(())
}

/// Test that input order is kept even when times go backwards
#[test]
fn test_parse_srt_string_withUnorderedCues_shouldKeepInputOrder() -> Result<()> {
    let srt = "7\n00:00:09,000 --> 00:00:10,000\nlater\n\n3\n00:00:01,000 --> 00:00:02,000\nearlier\n";

    let cues = CueSequence::parse_srt_string(srt)?;

    assert_eq!(cues[0].text, "later");
    assert_eq!(cues[1].text, "earlier");
    assert_eq!(cues[0].index, 1);
    assert_eq!(cues[1].index, 2);

    Ok(())
}

/// Test that the last block is captured without a trailing blank line
#[test]
fn test_parse_srt_string_withoutTrailingBlankLine_shouldCaptureLastBlock() -> Result<()> {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nfirst\n\n2\n00:00:03,000 --> 00:00:04,000\nlast";

    let cues = CueSequence::parse_srt_string(srt)?;

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[1].text, "last");

    Ok(())
}

/// Test tolerance for BOM, CRLF line endings and padded text
#[test]
fn test_parse_srt_string_withBomAndCrlf_shouldParse() -> Result<()> {
    let srt = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\n  Hallo  \r\n\r\n";

    let cues = CueSequence::parse_srt_string(srt)?;

    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Hallo");

    Ok(())
}

/// Test that a block with a single line fails the parse
#[test]
fn test_parse_srt_string_withShortBlock_shouldFailMalformed() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nok\n\n2\n\n";

    let result = CueSequence::parse_srt_string(srt);

    match result {
        Err(SubtitleError::MalformedSubtitle { block, .. }) => assert_eq!(block, 2),
        other => panic!("expected MalformedSubtitle, got {:?}", other),
    }
}

/// Test that an unreadable time range fails the parse
#[test]
fn test_parse_srt_string_withBadTimeLine_shouldFailMalformed() {
    let srt = "1\nsoon --> later\nhello\n";

    assert!(matches!(
        CueSequence::parse_srt_string(srt),
        Err(SubtitleError::MalformedSubtitle { block: 1, .. })
    ));
}

/// Test that a cue with no text lines is kept with empty text
#[test]
fn test_parse_srt_string_withIndexAndTimeOnly_shouldYieldEmptyText() -> Result<()> {
    let cues = CueSequence::parse_srt_string("1\n00:00:01,000 --> 00:00:02,000\n")?;

    assert_eq!(cues.len(), 1);
    assert!(cues[0].text.is_empty());

    Ok(())
}

/// Test that degenerate cues are accepted
#[test]
fn test_parse_srt_string_withEndBeforeStart_shouldKeepDegenerateCue() -> Result<()> {
    let cues = CueSequence::parse_srt_string("1\n00:00:03,000 --> 00:00:02,000\nbackwards\n")?;

    assert!(cues[0].is_degenerate());
    assert_eq!(cues[0].duration(), -1.0);

    Ok(())
}

/// Test that an empty file is an empty cue sequence error
#[test]
fn test_from_file_withBlankFile_shouldFailEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "empty.de.srt", "\n\n  \n")?;

    assert!(matches!(CueSequence::from_file(&path), Err(SubtitleError::EmptyCueSequence)));

    Ok(())
}

/// Test reading a subtitle file from disk
#[test]
fn test_from_file_withTwoCues_shouldRecordSourceAndMaxEnd() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "movie.de.srt", common::TWO_CUE_SRT)?;

    let cues = CueSequence::from_file(&path)?;

    assert_eq!(cues.source_file, path);
    assert_eq!(cues.len(), 2);
    assert_eq!(cues.max_end(), 6.0);

    Ok(())
}

/// Test that a missing file is reported as a read error
#[test]
fn test_from_file_withMissingFile_shouldFailRead() {
    let result = CueSequence::from_file(PathBuf::from("/nonexistent/movie.de.srt"));
    assert!(matches!(result, Err(SubtitleError::Read { .. })));
}

/// Test that max_end does not depend on cue order
#[test]
fn test_max_end_withLongestCueFirst_shouldReturnLatestEnd() -> Result<()> {
    let cues = CueSequence::from_cues(
        PathBuf::from("x.srt"),
        vec![Cue::new(1, 0.0, 12.0, "long"), Cue::new(2, 3.0, 4.0, "short")],
    )?;

    assert_eq!(cues.max_end(), 12.0);

    Ok(())
}

/// Test that hours too large to convert fail the parse instead of overflowing
#[test]
fn test_parse_srt_string_withHugeHours_shouldFailMalformed() {
    let srt = "1\n9999999999999999999:00:00,000 --> 9999999999999999999:00:01,000\nhi\n";

    match CueSequence::parse_srt_string(srt) {
        Err(SubtitleError::MalformedSubtitle { block, reason }) => {
            assert_eq!(block, 1);
            assert!(reason.contains("out of range"));
        }
        other => panic!("expected MalformedSubtitle, got {:?}", other),
    }
    assert!(Cue::parse_timestamp("9999999999999999999:00:00,000").is_err());
}

/// Test that hand-written timestamps with short fields are accepted
#[test]
fn test_parse_srt_string_withShortFields_shouldParse() -> Result<()> {
    let cues = CueSequence::parse_srt_string("1\n0:0:1,5 --> 0:1:02,250\nkurz\n")?;

    assert!((cues[0].start - 1.005).abs() < 1e-9);
    assert_eq!(cues[0].end, 62.25);
    assert_eq!(cues[0].format_start_time(), "00:00:01,005");

    Ok(())
}

/// Test that short fields still respect their ranges
#[test]
fn test_parse_srt_string_withShortFieldOutOfRange_shouldFailMalformed() {
    let srt = "1\n0:75:1,5 --> 0:76:0,0\nzu spät\n";

    assert!(matches!(
        CueSequence::parse_srt_string(srt),
        Err(SubtitleError::MalformedSubtitle { block: 1, .. })
    ));
}
