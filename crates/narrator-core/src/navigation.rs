//! Offset-to-sentence mapping and per-chapter sentence ranges.

use crate::chapters::ChapterMarker;
use crate::segmenter::Sentence;
use serde::{Deserialize, Serialize};

/// Inclusive sentence index range covered by one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRange {
    pub start: usize,
    pub end: usize,
    /// Zero when the chapter heading owns no sentence start of its own.
    pub sentence_count: usize,
}

impl ChapterRange {
    pub fn is_empty(&self) -> bool {
        self.sentence_count == 0
    }

    pub fn contains(&self, sentence_idx: usize) -> bool {
        !self.is_empty() && sentence_idx >= self.start && sentence_idx <= self.end
    }
}

/// Smallest sentence index whose `start >= offset`.
///
/// Returns `0` for an empty list and `sentences.len()` when the offset lies
/// past every sentence start.
pub fn map_offset_to_index(offset: usize, sentences: &[Sentence]) -> usize {
    sentences.partition_point(|sentence| sentence.start < offset)
}

pub fn compute_ranges(chapters: &[ChapterMarker], sentences: &[Sentence]) -> Vec<ChapterRange> {
    let starts: Vec<usize> = chapters
        .iter()
        .map(|chapter| map_offset_to_index(chapter.char_offset, sentences))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let upper = starts
                .get(idx + 1)
                .copied()
                .unwrap_or(sentences.len())
                .max(start);
            ChapterRange {
                start,
                end: upper.saturating_sub(1),
                sentence_count: upper - start,
            }
        })
        .collect()
}

/// Chapter that owns `sentence_idx`.
///
/// The finished position (`sentence_idx >= len`) belongs to the last chapter
/// that has any sentence.
pub fn chapter_for_sentence(ranges: &[ChapterRange], sentence_idx: usize) -> Option<usize> {
    if ranges.is_empty() {
        return None;
    }
    let candidates = ranges.partition_point(|range| range.start <= sentence_idx);
    (0..candidates)
        .rev()
        .find(|&idx| !ranges[idx].is_empty() && ranges[idx].start <= sentence_idx)
        .or(Some(0))
}
