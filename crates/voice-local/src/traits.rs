use crate::{AsrSegment, Result, TranscribeError, TtsConfig};

/// Incremental speech recogniser fed with mono PCM.
pub trait AsrStream {
    fn push_audio(&mut self, _pcm_s16le: &[i16]);
    fn poll(&mut self) -> Option<AsrSegment>;
}

/// Captures one utterance and returns its transcript.
///
/// Implementations block until an utterance has been heard or the attempt
/// failed. Returned text is lowercase.
pub trait Transcriber {
    fn listen_once(&mut self) -> Result<String, TranscribeError>;
}

impl<T: Transcriber + ?Sized> Transcriber for Box<T> {
    fn listen_once(&mut self) -> Result<String, TranscribeError> {
        (**self).listen_once()
    }
}

pub trait TtsEngine {
    fn new(config: TtsConfig) -> Self
    where
        Self: Sized;
    fn synthesize(&mut self, text: &str) -> Vec<i16>;
    fn sample_rate_hz(&self) -> u32;
}

/// Turns one complete utterance of mono PCM into text.
pub trait UtteranceRecognizer {
    fn recognize(&mut self, pcm_s16le: &[i16], sample_rate_hz: u32) -> Result<String>;
}

/// Plays PCM and returns once playback has finished.
pub trait AudioSink {
    fn play_blocking(&mut self, pcm_s16le: &[i16], sample_rate_hz: u32) -> Result<()>;
}

/// Speaks text aloud. Blocks until the utterance is finished.
pub trait SpeechRenderer {
    fn speak(&mut self, text: &str);
}

impl<T: SpeechRenderer + ?Sized> SpeechRenderer for Box<T> {
    fn speak(&mut self, text: &str) {
        (**self).speak(text)
    }
}
