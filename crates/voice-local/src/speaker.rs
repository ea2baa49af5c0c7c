use crate::{AudioSink, SpeechRenderer, TtsEngine};
use tracing::{info, warn};

/// Renders speech as log lines only. Used when no audio output is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

impl SpeechRenderer for LogSpeaker {
    fn speak(&mut self, text: &str) {
        info!("Speaking: {}", text);
    }
}

/// Synthesizes with a [`TtsEngine`] and plays the result on an [`AudioSink`].
pub struct TtsSpeaker<E> {
    engine: E,
    sink: Box<dyn AudioSink + Send>,
}

impl<E: TtsEngine> TtsSpeaker<E> {
    pub fn new(engine: E, sink: Box<dyn AudioSink + Send>) -> Self {
        Self { engine, sink }
    }
}

impl<E: TtsEngine> SpeechRenderer for TtsSpeaker<E> {
    fn speak(&mut self, text: &str) {
        info!("Speaking: {}", text);
        let pcm = self.engine.synthesize(text);
        if pcm.is_empty() {
            return;
        }
        let rate = self.engine.sample_rate_hz();
        if let Err(e) = self.sink.play_blocking(&pcm, rate) {
            warn!("Speech playback failed: {}", e);
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{MockTts, Result, TtsConfig};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CaptureSink {
        played: Arc<Mutex<Vec<(usize, u32)>>>,
    }

    impl AudioSink for CaptureSink {
        fn play_blocking(&mut self, pcm_s16le: &[i16], sample_rate_hz: u32) -> Result<()> {
            self.played
                .lock()
                .unwrap()
                .push((pcm_s16le.len(), sample_rate_hz));
            Ok(())
        }
    }

    #[test]
    fn test_tts_speaker_plays_synthesized_audio() {
        let sink = CaptureSink::default();
        let tts = MockTts::new(TtsConfig {
            voice: None,
            sample_rate_hz: 16000,
        });
        let mut speaker = TtsSpeaker::new(tts, Box::new(sink.clone()));
        speaker.speak("move left");

        let played = sink.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].1, 16000);
        assert!(played[0].0 > 0);
    }
}
