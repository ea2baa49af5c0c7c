//! Energy-based utterance segmentation in front of a whole-utterance
//! recogniser.

use crate::pcm::rms;
use crate::{AsrSegment, AsrStream, UtteranceRecognizer};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use time::OffsetDateTime;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// RMS level (i16 scale) at or above which a frame counts as speech
    pub energy_threshold: f32,
    pub frame_ms: u32,
    /// Utterances with less speech than this are dropped as noise
    pub min_speech_ms: u64,
    /// Silence after speech that closes the utterance
    pub trailing_silence_ms: u64,
    /// Utterances are cut at this length even while speech continues
    pub max_utterance_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 500.0,
            frame_ms: 20,
            min_speech_ms: 200,
            trailing_silence_ms: 800,
            max_utterance_ms: 8000,
        }
    }
}

/// A finished stretch of speech, with offsets from the start of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub pcm: Vec<i16>,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Splits a continuous PCM feed into utterances separated by silence.
pub struct Endpointer {
    config: EndpointConfig,
    sample_rate_hz: u32,
    frame_len: usize,
    pending: Vec<i16>,
    utterance: Vec<i16>,
    speech_samples: u64,
    silence_samples: u64,
    in_speech: bool,
    start_sample: u64,
    position: u64,
}

impl Endpointer {
    pub fn new(sample_rate_hz: u32, config: EndpointConfig) -> Self {
        let sample_rate_hz = sample_rate_hz.max(1);
        let frame_len = (u64::from(sample_rate_hz) * u64::from(config.frame_ms.max(1)) / 1000)
            .max(1) as usize;
        Self {
            config,
            sample_rate_hz,
            frame_len,
            pending: Vec::new(),
            utterance: Vec::new(),
            speech_samples: 0,
            silence_samples: 0,
            in_speech: false,
            start_sample: 0,
            position: 0,
        }
    }

    /// Feed PCM and collect every utterance it completes.
    pub fn push(&mut self, pcm: &[i16]) -> Vec<Utterance> {
        self.pending.extend_from_slice(pcm);
        let mut done = Vec::new();
        let mut consumed = 0;
        while self.pending.len() - consumed >= self.frame_len {
            let frame = self.pending[consumed..consumed + self.frame_len].to_vec();
            consumed += self.frame_len;
            if let Some(utterance) = self.push_frame(&frame) {
                done.push(utterance);
            }
        }
        self.pending.drain(..consumed);
        done
    }

    pub fn is_in_speech(&self) -> bool {
        self.in_speech
    }

    fn push_frame(&mut self, frame: &[i16]) -> Option<Utterance> {
        let loud = rms(frame) >= self.config.energy_threshold;
        let len = frame.len() as u64;
        let mut finished = None;

        if self.in_speech {
            self.utterance.extend_from_slice(frame);
            if loud {
                self.speech_samples += len;
                self.silence_samples = 0;
            } else {
                self.silence_samples += len;
            }
            if self.silence_samples >= self.samples(self.config.trailing_silence_ms)
                || self.utterance.len() as u64 >= self.samples(self.config.max_utterance_ms)
            {
                finished = self.finish(self.position + len);
            }
        } else if loud {
            self.in_speech = true;
            self.start_sample = self.position;
            self.utterance.extend_from_slice(frame);
            self.speech_samples = len;
            self.silence_samples = 0;
        }

        self.position += len;
        finished
    }

    fn finish(&mut self, end_sample: u64) -> Option<Utterance> {
        self.in_speech = false;
        let pcm = std::mem::take(&mut self.utterance);
        if self.speech_samples < self.samples(self.config.min_speech_ms) {
            debug!("dropping {} ms of noise", self.millis(self.speech_samples));
            return None;
        }
        Some(Utterance {
            pcm,
            start_ms: self.millis(self.start_sample),
            end_ms: self.millis(end_sample),
        })
    }

    fn samples(&self, ms: u64) -> u64 {
        ms * u64::from(self.sample_rate_hz) / 1000
    }

    fn millis(&self, samples: u64) -> u64 {
        samples * 1000 / u64::from(self.sample_rate_hz)
    }
}

/// [`AsrStream`] that cuts the feed into utterances and hands each one to a
/// whole-utterance recogniser.
pub struct SegmentingAsr<R> {
    recognizer: R,
    endpointer: Endpointer,
    sample_rate_hz: u32,
    ready: VecDeque<AsrSegment>,
}

impl<R: UtteranceRecognizer> SegmentingAsr<R> {
    pub fn new(recognizer: R, sample_rate_hz: u32, endpoint: EndpointConfig) -> Self {
        Self {
            recognizer,
            endpointer: Endpointer::new(sample_rate_hz, endpoint),
            sample_rate_hz,
            ready: VecDeque::new(),
        }
    }
}

impl<R: UtteranceRecognizer> AsrStream for SegmentingAsr<R> {
    fn push_audio(&mut self, pcm_s16le: &[i16]) {
        for utterance in self.endpointer.push(pcm_s16le) {
            debug!(
                "utterance {}..{} ms, recognising",
                utterance.start_ms, utterance.end_ms
            );
            match self.recognizer.recognize(&utterance.pcm, self.sample_rate_hz) {
                Ok(text) => self.ready.push_back(AsrSegment {
                    start_ms: utterance.start_ms,
                    end_ms: utterance.end_ms,
                    text,
                    ts: Some(OffsetDateTime::now_utc()),
                }),
                Err(e) => warn!("recogniser failed: {}", e),
            }
        }
    }

    fn poll(&mut self) -> Option<AsrSegment> {
        self.ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn block(ms: u64, amplitude: i16) -> Vec<i16> {
        let n = (u64::from(RATE) * ms / 1000) as usize;
        (0..n)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn test_speech_then_silence_is_one_utterance() {
        let mut ep = Endpointer::new(RATE, EndpointConfig::default());
        assert!(ep.push(&block(300, 0)).is_empty());
        assert!(ep.push(&block(500, 3000)).is_empty());
        assert!(ep.is_in_speech());
        assert!(ep.push(&block(700, 0)).is_empty());

        let done = ep.push(&block(100, 0));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].start_ms, 300);
        assert_eq!(done[0].end_ms, 1600);
        assert_eq!(done[0].pcm.len(), 16_000 * 13 / 10);
        assert!(!ep.is_in_speech());
    }

    #[test]
    fn test_short_click_is_dropped() {
        let mut ep = Endpointer::new(RATE, EndpointConfig::default());
        ep.push(&block(60, 8000));
        assert!(ep.push(&block(1000, 0)).is_empty());
        assert!(!ep.is_in_speech());
    }

    #[test]
    fn test_long_speech_is_cut() {
        let config = EndpointConfig {
            max_utterance_ms: 1000,
            ..EndpointConfig::default()
        };
        let mut ep = Endpointer::new(RATE, config);
        let done = ep.push(&block(2500, 3000));
        assert_eq!(done.len(), 2);
        assert_eq!(done[0].end_ms, 1000);
        assert_eq!(done[1].start_ms, 1000);
        assert!(ep.is_in_speech());
    }

    #[test]
    fn test_partial_frames_carry_over() {
        let mut ep = Endpointer::new(RATE, EndpointConfig::default());
        let speech = block(400, 3000);
        for chunk in speech.chunks(77) {
            ep.push(chunk);
        }
        let silence = block(900, 0);
        let done: Vec<_> = silence.chunks(101).flat_map(|c| ep.push(c)).collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].start_ms, 0);
    }

    #[cfg(feature = "mock")]
    #[test]
    fn test_recogniser_sees_each_utterance() {
        use crate::ScriptedRecognizer;

        let recognizer = ScriptedRecognizer::new(["Stop"]);
        let heard = recognizer.heard();
        let mut asr = SegmentingAsr::new(recognizer, RATE, EndpointConfig::default());
        asr.push_audio(&block(400, 3000));
        assert!(asr.poll().is_none());
        asr.push_audio(&block(800, 0));

        let segment = asr.poll().unwrap();
        assert_eq!(segment.text, "Stop");
        assert_eq!(segment.start_ms, 0);
        assert_eq!(segment.end_ms, 1200);
        assert!(asr.poll().is_none());
        assert_eq!(*heard.lock().unwrap(), vec![16_000 * 12 / 10]);
    }
}
