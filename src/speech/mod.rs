/*!
 * Speech synthesis for individual cues.
 *
 * - `SpeechEngine`: capability trait for anything that turns text into audio
 * - `command::CommandSpeechEngine`: drives an external TTS program (macOS `say` by default)
 * - `mock::MockSpeechEngine`: deterministic tones for tests and dry runs
 * - `SegmentSynthesizer`: renders one cue and turns failures into skips
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::fmt::Debug;

use crate::audio::AudioBuffer;
use crate::errors::SynthesisError;
use crate::subtitle_processor::Cue;

pub mod command;
pub mod mock;

pub use command::CommandSpeechEngine;
pub use mock::{MockBehavior, MockSpeechEngine};

/// Common trait for text-to-speech backends
///
/// A call blocks the pipeline until the backend has produced the whole
/// fragment or failed.
#[async_trait]
pub trait SpeechEngine: Send + Sync + Debug {
    /// Render `text` with `voice` at `words_per_minute`
    ///
    /// # Returns
    /// * `Result<AudioBuffer, SynthesisError>` - Audio in the engine's native format, or an error
    async fn synthesize(&self, text: &str, voice: &str, words_per_minute: u32) -> Result<AudioBuffer, SynthesisError>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// What a cue contributes to the timeline
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// Audio normalized to the timeline format
    Rendered(AudioBuffer),
    /// Silence, with the reason
    Skipped(String),
}

impl SegmentOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, SegmentOutcome::Rendered(_))
    }
}

/// Renders cues one at a time with a fixed voice and target format
#[derive(Debug)]
pub struct SegmentSynthesizer<'a> {
    engine: &'a dyn SpeechEngine,
    voice: String,
    words_per_minute: u32,
    sample_rate: u32,
    channels: u16,
}

impl<'a> SegmentSynthesizer<'a> {
    pub fn new(engine: &'a dyn SpeechEngine, voice: impl Into<String>, words_per_minute: u32, sample_rate: u32, channels: u16) -> Self {
        Self {
            engine,
            voice: voice.into(),
            words_per_minute,
            sample_rate,
            channels,
        }
    }

    /// Render one cue.
    ///
    /// Engine failures are logged and reported as `Skipped`; they never
    /// propagate to the caller.
    pub async fn render(&self, cue: &Cue) -> SegmentOutcome {
        if cue.text.trim().is_empty() {
            debug!("Cue {} has no text, leaving silence", cue.index);
            return SegmentOutcome::Skipped("empty text".to_string());
        }

        match self.engine.synthesize(&cue.text, &self.voice, self.words_per_minute).await {
            Ok(fragment) if fragment.is_empty() => {
                warn!("{} rendered no audio for cue {}, leaving silence", self.engine.name(), cue.index);
                SegmentOutcome::Skipped("engine produced no audio".to_string())
            }
            Ok(fragment) => {
                debug!(
                    "Cue {}: rendered {:.3}s ({} Hz, {} ch) for a {:.3}s slot",
                    cue.index,
                    fragment.duration_secs(),
                    fragment.sample_rate(),
                    fragment.channels(),
                    cue.duration()
                );
                SegmentOutcome::Rendered(fragment.normalized(self.sample_rate, self.channels))
            }
            Err(e) => {
                warn!("Speech synthesis failed for cue {}: {}", cue.index, e);
                SegmentOutcome::Skipped(e.to_string())
            }
        }
    }
}
