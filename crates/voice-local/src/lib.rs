//! voice-local: speech capture, transcription and speech rendering
//!
//! The traits here are the narrow seams the guidance core talks through.
//! The default build enables a `mock` backend so that binaries and tests run
//! on any host. The `audio` feature adds microphone capture and speaker
//! playback through `cpal`; `whisper` adds a local Whisper recogniser.

mod types;
pub use types::{AsrSegment, AsrStreamConfig, TtsConfig};

mod error;
pub use error::{Error, Result, TranscribeError};

mod traits;
pub use traits::{
    AsrStream, AudioSink, SpeechRenderer, Transcriber, TtsEngine, UtteranceRecognizer,
};

pub mod pcm;

mod segment;
pub use segment::{EndpointConfig, Endpointer, SegmentingAsr, Utterance};

mod transcriber;
pub use transcriber::AsrTranscriber;

mod line;
pub use line::LineTranscriber;

mod speaker;
pub use speaker::{LogSpeaker, TtsSpeaker};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{MockAsr, MockTts, RecordingSpeaker, ScriptedRecognizer, ScriptedTranscriber};

#[cfg(feature = "audio")]
mod playback;
#[cfg(feature = "audio")]
pub use playback::CpalSink;

#[cfg(feature = "audio")]
mod mic;
#[cfg(feature = "audio")]
pub use mic::{MicCapture, MicConfig, CHUNK_SAMPLES};

#[cfg(feature = "whisper")]
mod whisper;
#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;
