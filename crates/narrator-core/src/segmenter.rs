//! Sentence segmentation with stable character offsets.
//!
//! Boundaries are purely punctuation driven: a run of CJK/ASCII terminal
//! punctuation (optionally closed by a quote), a doubled ellipsis, or a blank
//! line. Offsets are counted in `char`s of the normalized text so they stay
//! meaningful for logographic scripts.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[。！？!?；;：:]+[”’"]?|…{2,}|\n{2,}"#).expect("sentence boundary regex")
});

/// One narratable unit of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    /// First char offset (inclusive) in the normalized document.
    pub start: usize,
    /// Last char offset (exclusive) in the normalized document.
    pub end: usize,
}

/// Strip carriage returns. Every offset in the crate refers to this form.
pub fn normalize(text: &str) -> String {
    text.replace('\r', "")
}

/// Trim Unicode whitespace plus a stray byte-order mark.
pub(crate) fn trim_text(text: &str) -> &str {
    text.trim_matches(|ch: char| ch.is_whitespace() || ch == '\u{feff}')
}

/// Split `text` into sentences. The input is normalized first.
pub fn segment(text: &str) -> Vec<Sentence> {
    let normalized = normalize(text);
    let mut sentences = Vec::new();

    // Byte/char cursor pair for the end of the previous boundary.
    let mut last_byte = 0usize;
    let mut last_char = 0usize;

    for found in RE_BOUNDARY.find_iter(&normalized) {
        let end_byte = found.end();
        let slice = &normalized[last_byte..end_byte];
        let end_char = last_char + slice.chars().count();
        let trimmed = trim_text(slice);
        if !trimmed.is_empty() {
            sentences.push(Sentence {
                text: trimmed.to_string(),
                start: last_char,
                end: end_char,
            });
        }
        last_byte = end_byte;
        last_char = end_char;
    }

    let rest = &normalized[last_byte..];
    let trimmed = trim_text(rest);
    if !trimmed.is_empty() {
        sentences.push(Sentence {
            text: trimmed.to_string(),
            start: last_char,
            end: last_char + rest.chars().count(),
        });
    }

    tracing::debug!(
        sentences = sentences.len(),
        chars = last_char + rest.chars().count(),
        "Segmented document"
    );
    sentences
}
