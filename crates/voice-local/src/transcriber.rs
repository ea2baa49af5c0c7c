use crate::{AsrStream, TranscribeError, Transcriber};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::trace;

/// Turns a streaming recogniser plus a PCM chunk feed into a [`Transcriber`].
///
/// Each call keeps pushing audio into the recogniser until it emits a
/// segment or `utterance_timeout` elapses. Once every sender of the PCM feed
/// is gone the transcriber reports [`TranscribeError::EndOfInput`].
pub struct AsrTranscriber {
    asr: Box<dyn AsrStream + Send>,
    audio: Receiver<Vec<i16>>,
    utterance_timeout: Duration,
    _source: Option<Box<dyn Send>>,
}

impl AsrTranscriber {
    pub fn new(
        asr: Box<dyn AsrStream + Send>,
        audio: Receiver<Vec<i16>>,
        utterance_timeout: Duration,
    ) -> Self {
        Self {
            asr,
            audio,
            utterance_timeout,
            _source: None,
        }
    }

    /// Keep the producer of the PCM feed (a capture stream) alive for as
    /// long as this transcriber exists.
    pub fn with_source(mut self, source: impl Send + 'static) -> Self {
        self._source = Some(Box::new(source));
        self
    }
}

impl Transcriber for AsrTranscriber {
    fn listen_once(&mut self) -> Result<String, TranscribeError> {
        let deadline = Instant::now() + self.utterance_timeout;
        loop {
            if let Some(segment) = self.asr.poll() {
                let text = segment.text.trim().to_lowercase();
                if text.is_empty() {
                    return Err(TranscribeError::Unrecognized);
                }
                return Ok(text);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TranscribeError::Unrecognized);
            }

            match self.audio.recv_timeout(remaining) {
                Ok(chunk) => {
                    trace!("pushing {} samples to ASR", chunk.len());
                    self.asr.push_audio(&chunk);
                }
                Err(RecvTimeoutError::Timeout) => return Err(TranscribeError::Unrecognized),
                Err(RecvTimeoutError::Disconnected) => return Err(TranscribeError::EndOfInput),
            }
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{
        AsrSegment, AsrStreamConfig, EndpointConfig, MockAsr, ScriptedRecognizer, SegmentingAsr,
    };
    use std::sync::mpsc;

    struct SilentAsr;

    impl AsrStream for SilentAsr {
        fn push_audio(&mut self, _pcm_s16le: &[i16]) {}
        fn poll(&mut self) -> Option<AsrSegment> {
            None
        }
    }

    fn cfg() -> AsrStreamConfig {
        AsrStreamConfig {
            language: Some("en".to_string()),
            sample_rate_hz: 16000,
        }
    }

    #[test]
    fn test_segment_is_lowercased() {
        let (_tx, rx) = mpsc::channel();
        let mut t = AsrTranscriber::new(
            Box::new(MockAsr::new(cfg())),
            rx,
            Duration::from_millis(50),
        );
        assert_eq!(t.listen_once().unwrap(), "mock utterance 1");
    }

    #[test]
    fn test_timeout_is_unrecognized() {
        let (_tx, rx) = mpsc::channel();
        let mut t = AsrTranscriber::new(Box::new(SilentAsr), rx, Duration::from_millis(20));
        assert_eq!(t.listen_once(), Err(TranscribeError::Unrecognized));
    }

    #[test]
    fn test_closed_input_is_end_of_input() {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        drop(tx);
        let mut t = AsrTranscriber::new(Box::new(SilentAsr), rx, Duration::from_secs(1));
        assert_eq!(t.listen_once(), Err(TranscribeError::EndOfInput));
    }

    fn tone(samples: usize, amplitude: i16) -> Vec<i16> {
        (0..samples)
            .map(|n| if n % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn test_fed_capture_channel_yields_commands() {
        // 16 kHz feed in 2048-sample chunks, the shape the microphone delivers
        let rate = 16_000;
        let mut feed = Vec::new();
        feed.extend(tone(rate / 2, 0));
        feed.extend(tone(rate / 2, 4000));
        feed.extend(tone(rate, 0));
        feed.extend(tone(rate / 2, 4000));
        feed.extend(tone(rate, 0));

        let (tx, rx) = mpsc::channel();
        for chunk in feed.chunks(2048) {
            tx.send(chunk.to_vec()).unwrap();
        }
        drop(tx);

        let recognizer = ScriptedRecognizer::new(["Assist", "STOP"]);
        let heard = recognizer.heard();
        let asr = SegmentingAsr::new(recognizer, rate as u32, EndpointConfig::default());
        let mut t = AsrTranscriber::new(Box::new(asr), rx, Duration::from_secs(1))
            .with_source(String::from("capture guard"));

        assert_eq!(t.listen_once(), Ok("assist".to_string()));
        assert_eq!(t.listen_once(), Ok("stop".to_string()));
        assert_eq!(t.listen_once(), Err(TranscribeError::EndOfInput));

        let heard = heard.lock().unwrap();
        assert_eq!(heard.len(), 2);
        assert!(heard.iter().all(|&len| len >= rate / 2));
    }
}
