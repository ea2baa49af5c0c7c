use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("audio device error: {0}")]
    Audio(String),
    #[error("speech recogniser error: {0}")]
    Recognizer(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Failure of a single listen attempt.
///
/// `Unrecognized` and `Service` are transient. `EndOfInput` is final: the
/// audio or text source is gone and later attempts cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscribeError {
    #[error("could not understand audio")]
    Unrecognized,
    #[error("could not request results: {0}")]
    Service(String),
    #[error("input ended")]
    EndOfInput,
}
