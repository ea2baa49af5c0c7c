//! Keyword parser for voice transcripts

use crate::{Error, Intent, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Words that trigger each intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_stop")]
    pub stop: String,
    #[serde(default = "default_sleep")]
    pub sleep: String,
}

fn default_start() -> String {
    "assist".to_string()
}

fn default_stop() -> String {
    "stop".to_string()
}

fn default_sleep() -> String {
    "sleep".to_string()
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            start: default_start(),
            stop: default_stop(),
            sleep: default_sleep(),
        }
    }
}

/// Main intent parser
///
/// Keywords are matched as case-insensitive substrings. They are checked in
/// the fixed order start, stop, sleep and only the first hit is reported, so
/// "stop assisting" yields [`Intent::Start`].
pub struct IntentParser {
    patterns: Vec<(Intent, Regex)>,
}

impl IntentParser {
    pub fn new(keywords: KeywordSet) -> Result<Self> {
        let ordered = [
            (Intent::Start, keywords.start),
            (Intent::Stop, keywords.stop),
            (Intent::Sleep, keywords.sleep),
        ];

        let mut patterns = Vec::with_capacity(ordered.len());
        for (intent, word) in ordered {
            let word = word.trim();
            if word.is_empty() {
                return Err(Error::EmptyKeyword(intent));
            }
            let regex = RegexBuilder::new(&regex::escape(word))
                .case_insensitive(true)
                .build()?;
            patterns.push((intent, regex));
        }

        Ok(Self { patterns })
    }

    /// Return the first intent whose keyword appears in `text`
    pub fn parse(&self, text: &str) -> Option<Intent> {
        let hit = self
            .patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(intent, _)| *intent);
        if let Some(intent) = hit {
            tracing::debug!("Matched {} in '{}'", intent, text);
        }
        hit
    }
}
