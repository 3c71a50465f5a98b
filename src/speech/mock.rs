/*!
 * Mock speech engine for testing.
 *
 * Renders a sine tone instead of speech so that timeline placement can be
 * checked by looking for energy:
 * - `MockSpeechEngine::working()` - Always renders
 * - `MockSpeechEngine::failing()` - Always fails like a crashed TTS process
 * - `MockSpeechEngine::failing_on(&[2])` - Fails only on the given calls
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::AudioBuffer;
use crate::errors::SynthesisError;
use crate::speech::SpeechEngine;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails on the listed 1-based call numbers
    FailOnCalls(Vec<usize>),
    /// Always fails
    Failing,
    /// Succeeds with an empty fragment
    Empty,
}

/// Tone generator standing in for a TTS engine
#[derive(Debug, Clone)]
pub struct MockSpeechEngine {
    behavior: MockBehavior,
    sample_rate: u32,
    channels: u16,
    fragment_secs: Option<f64>,
    amplitude: f32,
    call_count: Arc<AtomicUsize>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechEngine {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            sample_rate: 22_050,
            channels: 1,
            fragment_secs: None,
            amplitude: 0.5,
            call_count: Arc::new(AtomicUsize::new(0)),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self::new(MockBehavior::FailOnCalls(calls.to_vec()))
    }

    /// Native format of the rendered tone
    pub fn with_format(mut self, sample_rate: u32, channels: u16) -> Self {
        self.sample_rate = sample_rate;
        self.channels = channels;
        self
    }

    /// Fixed fragment length instead of one derived from word count
    pub fn with_fragment_secs(mut self, seconds: f64) -> Self {
        self.fragment_secs = Some(seconds);
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn fragment_length(&self, text: &str, words_per_minute: u32) -> f64 {
        self.fragment_secs.unwrap_or_else(|| {
            let words = text.split_whitespace().count().max(1) as f64;
            words * 60.0 / words_per_minute.max(1) as f64
        })
    }

    fn tone(&self, seconds: f64) -> AudioBuffer {
        let frames = (seconds * self.sample_rate as f64).round() as usize;
        let step = 2.0 * std::f32::consts::PI * 440.0 / self.sample_rate as f32;
        let samples = (0..frames)
            .flat_map(|i| {
                let value = self.amplitude * (step * i as f32).sin();
                std::iter::repeat_n(value, self.channels as usize)
            })
            .collect();
        AudioBuffer::new(samples, self.sample_rate, self.channels)
    }
}

#[async_trait]
impl SpeechEngine for MockSpeechEngine {
    async fn synthesize(&self, text: &str, _voice: &str, words_per_minute: u32) -> Result<AudioBuffer, SynthesisError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }

        let fail = match &self.behavior {
            MockBehavior::Working | MockBehavior::Empty => false,
            MockBehavior::Failing => true,
            MockBehavior::FailOnCalls(calls) => calls.contains(&call),
        };

        if fail {
            return Err(SynthesisError::EngineFailed {
                status: "exit code 1".to_string(),
                stderr: format!("mock failure on call {}", call),
            });
        }

        if self.behavior == MockBehavior::Empty {
            return Ok(AudioBuffer::new(Vec::new(), self.sample_rate, self.channels));
        }

        Ok(self.tone(self.fragment_length(text, words_per_minute)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
