use crate::{TranscribeError, Transcriber};
use std::io::BufRead;

/// Treats each line of text input as one utterance (typed commands).
pub struct LineTranscriber<R> {
    input: R,
}

impl<R: BufRead> LineTranscriber<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Transcriber for LineTranscriber<R> {
    fn listen_once(&mut self) -> Result<String, TranscribeError> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Err(TranscribeError::EndOfInput),
            Ok(_) => {
                let text = line.trim().to_lowercase();
                if text.is_empty() {
                    Err(TranscribeError::Unrecognized)
                } else {
                    Ok(text)
                }
            }
            Err(e) => Err(TranscribeError::Service(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_lines_become_utterances() {
        let mut t = LineTranscriber::new(Cursor::new("Assist\n\n  STOP now \n"));
        assert_eq!(t.listen_once(), Ok("assist".to_string()));
        assert_eq!(t.listen_once(), Err(TranscribeError::Unrecognized));
        assert_eq!(t.listen_once(), Ok("stop now".to_string()));
        assert_eq!(t.listen_once(), Err(TranscribeError::EndOfInput));
        assert_eq!(t.listen_once(), Err(TranscribeError::EndOfInput));
    }
}
