use crate::chapters::{ChapterMarker, detect_chapters};
use crate::navigation::{ChapterRange, chapter_for_sentence, compute_ranges, map_offset_to_index};
use crate::segmenter::{Sentence, normalize, segment};

/// A loaded document: immutable sentences, chapters and their ranges.
#[derive(Debug, Clone)]
pub struct Document {
    key: String,
    text: String,
    sentences: Vec<Sentence>,
    chapters: Vec<ChapterMarker>,
    ranges: Vec<ChapterRange>,
}

impl Document {
    pub fn from_text(key: impl Into<String>, raw: &str) -> Self {
        let key = key.into();
        let text = normalize(raw);
        let sentences = segment(&text);
        let chapters = detect_chapters(&text);
        let ranges = compute_ranges(&chapters, &sentences);
        tracing::info!(
            key = %key,
            chars = text.chars().count(),
            sentences = sentences.len(),
            chapters = chapters.len(),
            "Prepared document"
        );
        Self {
            key,
            text,
            sentences,
            chapters,
            ranges,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence(&self, idx: usize) -> Option<&Sentence> {
        self.sentences.get(idx)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn chapters(&self) -> &[ChapterMarker] {
        &self.chapters
    }

    pub fn ranges(&self) -> &[ChapterRange] {
        &self.ranges
    }

    pub fn chapter_for_sentence(&self, sentence_idx: usize) -> Option<usize> {
        chapter_for_sentence(&self.ranges, sentence_idx)
    }

    /// First sentence of `chapter_idx`, or `None` for an unknown chapter.
    pub fn chapter_start_sentence(&self, chapter_idx: usize) -> Option<usize> {
        let chapter = self.chapters.get(chapter_idx)?;
        Some(map_offset_to_index(chapter.char_offset, &self.sentences))
    }
}
