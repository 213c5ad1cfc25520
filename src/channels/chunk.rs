use crate::message::OutboundChunk;

/// Split a reply into provider-safe segments at whitespace boundaries.
///
/// The segments partition the input string, so concatenating them in index
/// order reproduces it byte for byte. A single token wider than `max_width`
/// is passed through as one oversized segment rather than cut mid-token —
/// receiving clients handle the overflow better than a mangled word would.
/// Pure and deterministic: identical inputs always yield identical chunks.
pub fn chunk(text: &str, max_width: usize) -> Vec<OutboundChunk> {
    let segments = split_segments(text, max_width);
    let total = segments.len();
    segments
        .into_iter()
        .enumerate()
        .map(|(index, text)| OutboundChunk {
            text: text.to_string(),
            index,
            total,
        })
        .collect()
}

/// Greedy whitespace-boundary partition. Widths are measured in characters,
/// matching provider message limits; cuts land on whitespace runs and are
/// therefore always valid UTF-8 boundaries.
fn split_segments(text: &str, max_width: usize) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    if max_width == 0 {
        return vec![text];
    }

    // Non-whitespace runs as (byte_start, byte_end, char_end) triples.
    let mut words: Vec<(usize, usize, usize)> = Vec::new();
    let mut word_start: Option<(usize, usize)> = None;
    let mut chars_seen = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some((bs, _)) = word_start.take() {
                words.push((bs, byte_idx, chars_seen));
            }
        } else if word_start.is_none() {
            word_start = Some((byte_idx, chars_seen));
        }
        chars_seen += 1;
    }
    if let Some((bs, _)) = word_start {
        words.push((bs, text.len(), chars_seen));
    }

    let mut segments = Vec::new();
    let mut seg_start = 0usize; // byte offset
    let mut seg_start_chars = 0usize;
    // Char end of the previous word; cuts never land before it, so a word is
    // never split mid-token.
    let mut prev_word_char_end = 0usize;

    for &(word_byte_start, word_byte_end, word_char_end) in &words {
        let word_char_start =
            word_char_end - text[word_byte_start..word_byte_end].chars().count();
        // Close segments until this word fits or starts the open segment.
        // Prefer cutting right at the word start so the separating whitespace
        // stays in the closed segment; a whitespace run wider than the limit
        // is cut at the limit instead, one full-width segment at a time.
        while word_char_end - seg_start_chars > max_width
            && word_char_start > seg_start_chars
        {
            let floor = prev_word_char_end.max(seg_start_chars);
            let cut_chars = word_char_start.min((seg_start_chars + max_width).max(floor));
            let cut_byte = if cut_chars == word_char_start {
                word_byte_start
            } else {
                let n = cut_chars - seg_start_chars;
                text[seg_start..word_byte_start]
                    .char_indices()
                    .nth(n)
                    .map_or(word_byte_start, |(offset, _)| seg_start + offset)
            };
            segments.push(&text[seg_start..cut_byte]);
            seg_start = cut_byte;
            seg_start_chars = cut_chars;
        }
        prev_word_char_end = word_char_end;
    }

    if seg_start < text.len() {
        segments.push(&text[seg_start..]);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[OutboundChunk]) -> String {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn short_text_single_chunk() {
        let chunks = chunk("hello world", 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].total, 1);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 1600).is_empty());
    }

    #[test]
    fn long_reply_splits_at_whitespace_within_limit() {
        let text = "word ".repeat(1000);
        let chunks = chunk(&text, 1600);
        for c in &chunks {
            assert!(c.text.chars().count() <= 1600, "chunk {} too wide", c.index);
            // Whitespace-only splitting never cuts inside a word
            for piece in c.text.split_whitespace() {
                assert_eq!(piece, "word");
            }
        }
        assert_eq!(reassemble(&chunks), text);
        // 5000 chars at width 1600: 4 is the minimal whitespace-respecting count
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn indices_are_contiguous_from_zero() {
        let text = "word ".repeat(1000);
        let chunks = chunk(&text, 1600);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.total, chunks.len());
        }
    }

    #[test]
    fn oversized_token_passes_through_unmodified() {
        let token = "a".repeat(2000);
        let chunks = chunk(&token, 1600);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 2000);
        assert_eq!(chunks[0].text, token);
    }

    #[test]
    fn oversized_token_between_words() {
        let long = "b".repeat(1700);
        let text = format!("intro {long} outro");
        let chunks = chunk(&text, 1600);
        assert_eq!(reassemble(&chunks), text);
        // The long token travels whole inside a single chunk
        assert_eq!(chunks.iter().filter(|c| c.text.contains(&long)).count(), 1);
    }

    #[test]
    fn oversized_whitespace_run_is_cut_at_the_width() {
        let text = format!("aa{}bb", " ".repeat(10));
        let chunks = chunk(&text, 5);
        assert_eq!(reassemble(&chunks), text);
        for c in &chunks {
            assert!(c.text.chars().count() <= 5, "chunk {} too wide", c.index);
        }
    }

    #[test]
    fn leading_whitespace_run_splits_into_width_segments() {
        let text = format!("{}x", " ".repeat(12));
        let chunks = chunk(&text, 4);
        assert_eq!(reassemble(&chunks), text);
        for c in &chunks {
            assert!(c.text.chars().count() <= 4);
        }
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let text = "the quick brown fox ".repeat(200);
        assert_eq!(chunk(&text, 160), chunk(&text, 160));
    }

    #[test]
    fn multibyte_text_measured_in_chars() {
        // 400 two-byte chars separated by spaces: 100 groups of "éééé "
        let text = "éééé ".repeat(100);
        let chunks = chunk(&text, 50);
        for c in &chunks {
            assert!(c.text.chars().count() <= 50);
            assert!(c.text.is_char_boundary(c.text.len()));
        }
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn internal_whitespace_preserved_verbatim() {
        let text = "alpha  beta\n\ngamma\tdelta ".repeat(60);
        let chunks = chunk(&text, 120);
        assert_eq!(reassemble(&chunks), text);
    }
}
