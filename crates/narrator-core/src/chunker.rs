//! Fixed-width chunking of sentences for speech engines with input limits.

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 220;

/// Split `text` into pieces of at most `max_len` chars.
///
/// Splitting is purely by char count; the pieces concatenate back to `text`.
pub fn chunk(text: &str, max_len: usize) -> Vec<&str> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max_len + 1);
    let mut piece_start = 0usize;

    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % max_len == 0 {
            chunks.push(&text[piece_start..byte_idx]);
            piece_start = byte_idx;
        }
    }
    if piece_start < text.len() {
        chunks.push(&text[piece_start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_sentence_splits_into_bounded_pieces() {
        let text = "字".repeat(500);
        let chunks = chunk(&text, DEFAULT_MAX_CHUNK_CHARS);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lengths, vec![220, 220, 60]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk("", 10).is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        assert_eq!(chunk("你好。", 220), vec!["你好。"]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_chunk() {
        let chunks = chunk("abcdef", 3);
        assert_eq!(chunks, vec!["abc", "def"]);
    }

    #[test]
    fn zero_max_len_is_treated_as_one() {
        assert_eq!(chunk("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn chunk_count_matches_ceiling_for_mixed_width_text() {
        let text = "Hello，世界！ mixed ascii 与汉字 and emoji 🎉 tail";
        let len = text.chars().count();
        for max_len in 1..=12 {
            let chunks = chunk(text, max_len);
            assert_eq!(chunks.len(), len.div_ceil(max_len));
            assert!(chunks.iter().all(|c| c.chars().count() <= max_len));
            assert_eq!(chunks.concat(), text);
        }
    }
}
