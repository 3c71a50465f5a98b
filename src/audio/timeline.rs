use std::time::Duration;
use log::{debug, warn};

use crate::audio::AudioBuffer;
use crate::speech::SegmentOutcome;
use crate::subtitle_processor::{Cue, CueSequence};

// @module: Timeline assembly of synthesized cues

/// Which cues ended up on the timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    /// Indices of cues whose fragment was overlaid
    pub placed: Vec<usize>,

    /// Indices of cues that contribute silence
    pub skipped: Vec<usize>,

    /// Frames cut off because a fragment ran past the end of the track
    pub truncated_frames: usize,
}

impl AssemblyReport {
    pub fn summary(&self) -> String {
        format!(
            "{} cue(s) placed, {} skipped",
            self.placed.len(),
            self.skipped.len()
        )
    }
}

/// Fixed-length track that fragments are mixed into at their cue offsets
#[derive(Debug)]
pub struct Timeline {
    buffer: AudioBuffer,
    report: AssemblyReport,
}

impl Timeline {
    /// Track length for a cue sequence: the latest cue end plus padding
    pub fn duration_for(cues: &CueSequence, padding: Duration) -> f64 {
        cues.max_end() + padding.as_secs_f64()
    }

    /// Allocate a silent track long enough for every cue in `cues`.
    /// The length is fixed here and never changes during assembly.
    pub fn for_cues(cues: &CueSequence, sample_rate: u32, channels: u16, padding: Duration) -> Self {
        Self::with_duration(Self::duration_for(cues, padding), sample_rate, channels)
    }

    /// Allocate a silent track of `duration_secs`
    pub fn with_duration(duration_secs: f64, sample_rate: u32, channels: u16) -> Self {
        let frames = (duration_secs.max(0.0) * sample_rate as f64).round() as usize;
        debug!(
            "Allocating timeline of {:.3}s ({} frames @ {} Hz, {} ch)",
            duration_secs, frames, sample_rate, channels
        );

        Timeline {
            buffer: AudioBuffer::silence(frames, sample_rate, channels),
            report: AssemblyReport::default(),
        }
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn report(&self) -> &AssemblyReport {
        &self.report
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// Frame at which a cue starting at `start` seconds is placed
    pub fn offset_frames(&self, start: f64) -> usize {
        (start.max(0.0) * self.buffer.sample_rate() as f64).round() as usize
    }

    /// Record the outcome of synthesizing `cue`
    pub fn apply(&mut self, cue: &Cue, outcome: SegmentOutcome) {
        match outcome {
            SegmentOutcome::Rendered(fragment) => self.overlay(cue, fragment),
            SegmentOutcome::Skipped(_) => self.skip(cue),
        }
    }

    /// Mix `fragment` into the track starting at `cue.start`.
    ///
    /// The fragment keeps its own length; it is not fitted to the cue's
    /// nominal duration. Samples past the end of the track are dropped; a
    /// fragment with no sample inside the track counts as skipped.
    pub fn overlay(&mut self, cue: &Cue, fragment: AudioBuffer) {
        if cue.is_degenerate() {
            warn!(
                "Cue {} has non-positive duration ({:.3}s), placing it at its start anyway",
                cue.index,
                cue.duration()
            );
        }

        let fragment = if fragment.sample_rate() != self.buffer.sample_rate()
            || fragment.channels() != self.buffer.channels()
        {
            fragment.normalized(self.buffer.sample_rate(), self.buffer.channels())
        } else {
            fragment
        };

        let channels = self.buffer.channels() as usize;
        let offset = self.offset_frames(cue.start) * channels;
        let track = self.buffer.samples_mut();
        let offset = offset.min(track.len());

        let available = track.len().saturating_sub(offset);
        let usable = fragment.samples().len().min(available);
        let dropped = (fragment.samples().len() - usable) / channels;
        if dropped > 0 {
            debug!("Cue {} runs past the end of the track, dropping {} frames", cue.index, dropped);
            self.report.truncated_frames += dropped;
        }

        if usable == 0 {
            warn!(
                "Cue {} starts at {:.3}s, after the end of the track, leaving it out",
                cue.index, cue.start
            );
            self.report.skipped.push(cue.index);
            return;
        }

        for (slot, sample) in track[offset..offset + usable].iter_mut().zip(fragment.samples()) {
            *slot += *sample;
        }

        self.report.placed.push(cue.index);
    }

    /// Leave silence where `cue` would have been
    pub fn skip(&mut self, cue: &Cue) {
        self.report.skipped.push(cue.index);
    }

    /// Build a track from precomputed outcomes, one per cue in sequence order
    pub fn assemble<I>(cues: &CueSequence, outcomes: I, sample_rate: u32, channels: u16, padding: Duration) -> Self
    where
        I: IntoIterator<Item = SegmentOutcome>,
    {
        let mut timeline = Self::for_cues(cues, sample_rate, channels, padding);
        for (cue, outcome) in cues.iter().zip(outcomes) {
            timeline.apply(cue, outcome);
        }
        timeline
    }

    /// Finish assembly, handing out the track and the report
    pub fn finish(self) -> (AudioBuffer, AssemblyReport) {
        (self.buffer, self.report)
    }
}
