//! Prompt-injection filtering for user text
//!
//! Text is cleaned before it leaves the client: known injection phrasings are
//! replaced by [`REDACTION_MARKER`], the result is cut to the configured
//! maximum length and then trimmed.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Literal substituted for every injection match
pub const REDACTION_MARKER: &str = "[FILTERED]";

/// Default maximum length of sanitized text, in characters
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;

static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?-u:\b)(ignore|disregard|forget)\s+(previous|all|above|prior)\s+(instructions?|prompts?|commands?)",
        r"(?i)(?-u:\b)(system|assistant|user|role)\s*:",
        r"(?i)\[INST\]",
        r"(?i)\[/INST\]",
        r"<\|.*?\|>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("injection pattern is valid"))
    .collect()
});

static DEFAULT_SANITIZER: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::default);

/// Sanitize with the default length limit
pub fn sanitize(input: &str) -> String {
    DEFAULT_SANITIZER.sanitize(input)
}

/// Input cleaner with a configurable length cap
#[derive(Debug, Clone)]
pub struct Sanitizer {
    max_length: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEXT_LENGTH)
    }
}

impl Sanitizer {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Redact, truncate, trim
    pub fn sanitize(&self, input: &str) -> String {
        debug!(input_len = input.len(), "Sanitizer::sanitize: called");
        if input.is_empty() {
            return String::new();
        }

        let mut sanitized = input.to_string();
        for pattern in INJECTION_PATTERNS.iter() {
            if pattern.is_match(&sanitized) {
                debug!(pattern = %pattern.as_str(), "Sanitizer::sanitize: redacting match");
                sanitized = pattern.replace_all(&sanitized, REDACTION_MARKER).into_owned();
            }
        }

        if let Some((cut, _)) = sanitized.char_indices().nth(self.max_length) {
            debug!(max_length = self.max_length, "Sanitizer::sanitize: truncating");
            sanitized.truncate(cut);
        }

        sanitized.trim().to_string()
    }
}
