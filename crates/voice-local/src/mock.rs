use crate::{
    AsrSegment, AsrStream, AsrStreamConfig, Result, SpeechRenderer, TranscribeError, Transcriber,
    TtsConfig, TtsEngine, UtteranceRecognizer,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;

pub struct MockAsr {
    _cfg: AsrStreamConfig,
    counter: u64,
}

impl MockAsr {
    pub fn new(config: AsrStreamConfig) -> Self {
        Self {
            _cfg: config,
            counter: 0,
        }
    }
}

impl AsrStream for MockAsr {
    fn push_audio(&mut self, _pcm_s16le: &[i16]) {
        // ignore in mock
    }

    fn poll(&mut self) -> Option<AsrSegment> {
        // Return a fake segment every call up to 3
        if self.counter >= 3 {
            return None;
        }
        let idx = self.counter;
        self.counter += 1;
        Some(AsrSegment {
            start_ms: idx * 1000,
            end_ms: (idx + 1) * 1000,
            text: format!("Mock utterance {}", idx + 1),
            ts: Some(OffsetDateTime::now_utc()),
        })
    }
}

/// Recogniser returning fixed phrases in order, then empty text.
///
/// The length of every utterance it was given is recorded in [`heard`].
///
/// [`heard`]: ScriptedRecognizer::heard
pub struct ScriptedRecognizer {
    phrases: VecDeque<String>,
    heard: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
            heard: Arc::default(),
        }
    }

    pub fn heard(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.heard)
    }
}

impl UtteranceRecognizer for ScriptedRecognizer {
    fn recognize(&mut self, pcm_s16le: &[i16], _sample_rate_hz: u32) -> Result<String> {
        self.heard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(pcm_s16le.len());
        Ok(self.phrases.pop_front().unwrap_or_default())
    }
}

/// Replays a fixed list of listen outcomes.
///
/// Each outcome is delivered after `pace`. Once the script is exhausted every
/// call waits `idle` and reports [`TranscribeError::Unrecognized`], like a
/// microphone in a quiet room.
pub struct ScriptedTranscriber {
    script: VecDeque<Result<String, TranscribeError>>,
    pace: Duration,
    idle: Duration,
}

impl ScriptedTranscriber {
    pub fn new(script: impl IntoIterator<Item = Result<String, TranscribeError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            pace: Duration::ZERO,
            idle: Duration::from_millis(10),
        }
    }

    /// Script consisting only of successful transcripts
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(phrases.into_iter().map(|p| Ok(p.into())))
    }

    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Delay before each scripted outcome, simulating time spent talking
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

impl Transcriber for ScriptedTranscriber {
    fn listen_once(&mut self) -> Result<String, TranscribeError> {
        match self.script.pop_front() {
            Some(outcome) => {
                if !self.pace.is_zero() {
                    std::thread::sleep(self.pace);
                }
                outcome.map(|text| text.to_lowercase())
            }
            None => {
                std::thread::sleep(self.idle);
                Err(TranscribeError::Unrecognized)
            }
        }
    }
}

/// Speech renderer that records every utterance. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SpeechRenderer for RecordingSpeaker {
    fn speak(&mut self, text: &str) {
        self.spoken
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text.to_string());
    }
}

pub struct MockTts {
    cfg: TtsConfig,
}

impl TtsEngine for MockTts {
    fn new(config: TtsConfig) -> Self
    where
        Self: Sized,
    {
        Self { cfg: config }
    }

    fn synthesize(&mut self, text: &str) -> Vec<i16> {
        // Short 440Hz tone whose length follows the text length
        let sr = self.sample_rate_hz();
        let dur_s = (text.len() as f32 / 10.0).clamp(0.2, 1.0);
        let frames = (sr as f32 * dur_s) as usize;
        let step = 2.0 * std::f32::consts::PI * 440.0 / sr as f32;
        (0..frames)
            .map(|n| ((n as f32 * step).sin() * 3000.0) as i16)
            .collect()
    }

    fn sample_rate_hz(&self) -> u32 {
        self.cfg.sample_rate_hz.max(8000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_transcriber_replays_then_goes_quiet() {
        let mut t = ScriptedTranscriber::new(vec![
            Ok("Assist".to_string()),
            Err(TranscribeError::Service("offline".to_string())),
        ])
        .with_idle(Duration::from_millis(1));

        assert_eq!(t.listen_once(), Ok("assist".to_string()));
        assert!(matches!(t.listen_once(), Err(TranscribeError::Service(_))));
        assert_eq!(t.listen_once(), Err(TranscribeError::Unrecognized));
    }

    #[test]
    fn test_scripted_recognizer_runs_dry() {
        let mut r = ScriptedRecognizer::new(["assist"]);
        assert_eq!(r.recognize(&[1, 2, 3], 16000).unwrap(), "assist");
        assert_eq!(r.recognize(&[4], 16000).unwrap(), "");
        assert_eq!(*r.heard().lock().unwrap(), vec![3, 1]);
    }

    #[test]
    fn test_recording_speaker_shares_record() {
        let speaker = RecordingSpeaker::new();
        let mut handle = speaker.clone();
        handle.speak("move left");
        assert_eq!(speaker.spoken(), vec!["move left".to_string()]);
    }

    #[test]
    fn test_mock_tts_length_is_bounded() {
        let mut tts = MockTts::new(TtsConfig {
            voice: None,
            sample_rate_hz: 8000,
        });
        assert_eq!(tts.synthesize("a").len(), 1600);
        assert_eq!(tts.synthesize(&"x".repeat(100)).len(), 8000);
    }
}
