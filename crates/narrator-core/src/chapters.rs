//! Chapter heading detection for plain-text novels.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Title used when no heading is found anywhere in the document.
pub const DOCUMENT_START_TITLE: &str = "document start";

static RE_NUMBERED_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^第[〇零一二三四五六七八九十百千万两0-9０-９]+章").expect("chapter regex"));
static RE_NUMBERED_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^第[〇零一二三四五六七八九十百千万两0-9０-９]+节").expect("section regex"));
static RE_PROLOGUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(楔子|序章|引子)").expect("prologue regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub title: String,
    /// Char offset of the heading line's first character.
    pub char_offset: usize,
}

pub fn is_heading(line: &str) -> bool {
    RE_NUMBERED_CHAPTER.is_match(line)
        || RE_NUMBERED_SECTION.is_match(line)
        || RE_PROLOGUE.is_match(line)
}

/// Detect chapter markers in document order.
///
/// Line offsets are exact for `\n`, `\r\n` and lone `\r` terminators. Callers
/// that pair markers with [`crate::segmenter::segment`] output should pass the
/// normalized text so both share one coordinate space.
pub fn detect_chapters(text: &str) -> Vec<ChapterMarker> {
    let mut chapters: Vec<ChapterMarker> = lines_with_offsets(text)
        .into_iter()
        .filter_map(|(offset, line)| {
            let line = crate::segmenter::trim_text(line);
            is_heading(line).then(|| ChapterMarker {
                title: line.to_string(),
                char_offset: offset,
            })
        })
        .collect();

    if chapters.is_empty() {
        chapters.push(ChapterMarker {
            title: DOCUMENT_START_TITLE.to_string(),
            char_offset: 0,
        });
    }
    tracing::debug!(chapters = chapters.len(), "Detected chapters");
    chapters
}

/// Split into lines, pairing each with the char offset where it starts.
fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut line_start_byte = 0usize;
    let mut line_start_char = 0usize;
    let mut char_pos = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((byte_idx, ch)) = chars.next() {
        char_pos += 1;
        if ch != '\n' && ch != '\r' {
            continue;
        }
        lines.push((line_start_char, &text[line_start_byte..byte_idx]));
        let mut next_byte = byte_idx + 1;
        if ch == '\r' {
            if let Some(&(lf_idx, '\n')) = chars.peek() {
                chars.next();
                char_pos += 1;
                next_byte = lf_idx + 1;
            }
        }
        line_start_byte = next_byte;
        line_start_char = char_pos;
    }
    lines.push((line_start_char, &text[line_start_byte..]));
    lines
}
