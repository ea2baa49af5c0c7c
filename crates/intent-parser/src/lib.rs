//! Intent Parser for Voice Commands
//!
//! Maps lowercase speech transcripts onto the three navigation intents
//! (`Start`, `Stop`, `Sleep`) using configurable wake keywords.

mod parser;

pub use parser::{IntentParser, KeywordSet};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("keyword for {0} must not be empty")]
    EmptyKeyword(Intent),
    #[error("invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// High-level command issued by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Begin obstacle guidance
    Start,
    /// Pause guidance and go back to listening
    Stop,
    /// Shut the whole assistant down
    Sleep,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Start => "start",
            Intent::Stop => "stop",
            Intent::Sleep => "sleep",
        };
        f.write_str(name)
    }
}

/// Parse a transcript with the default keyword set
pub fn parse_command(text: &str) -> Result<Option<Intent>> {
    let parser = IntentParser::new(KeywordSet::default())?;
    Ok(parser.parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_commands() {
        let test_cases = vec![
            ("assist me please", Some(Intent::Start)),
            ("stop now", Some(Intent::Stop)),
            ("go to sleep", Some(Intent::Sleep)),
            ("what time is it", None),
        ];

        for (command, expected) in test_cases {
            assert_eq!(parse_command(command).unwrap(), expected, "'{command}'");
        }
    }

    #[test]
    fn test_intent_serde_names() {
        let json = serde_json::to_string(&Intent::Sleep).unwrap();
        assert_eq!(json, "\"sleep\"");
        assert_eq!(Intent::Start.to_string(), "start");
    }
}
