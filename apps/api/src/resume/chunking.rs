//! Overlapping fixed-size chunking over character positions.

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Half-open character range `[start, end)` of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

/// Computes chunk boundaries for a text of `len` characters.
///
/// Consecutive chunks share `overlap` characters; the last chunk ends at `len`.
/// An overlap that is not smaller than the chunk size is clamped so the window
/// always advances.
pub fn chunk_spans(len: usize, config: ChunkingConfig) -> Vec<ChunkSpan> {
    if len == 0 {
        return Vec::new();
    }

    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size - 1);
    let step = size - overlap;

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(len);
        spans.push(ChunkSpan { start, end });
        if end == len {
            break;
        }
        start += step;
    }
    spans
}

/// Splits `text` into overlapping chunks of at most `chunk_size` characters.
pub fn split_into_chunks(text: &str, config: ChunkingConfig) -> Vec<&str> {
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    chunk_spans(char_count, config)
        .into_iter()
        .map(|span| &text[offsets[span.start]..offsets[span.end]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2500_chars_split_into_three_overlapping_chunks() {
        let spans = chunk_spans(2500, ChunkingConfig::default());
        assert_eq!(
            spans,
            vec![
                ChunkSpan { start: 0, end: 1000 },
                ChunkSpan { start: 900, end: 1900 },
                ChunkSpan { start: 1800, end: 2500 },
            ]
        );
    }

    #[test]
    fn test_chunk_text_matches_spans() {
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = split_into_chunks(&text, ChunkingConfig::default());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], &text[0..1000]);
        assert_eq!(chunks[1], &text[900..1900]);
        assert_eq!(chunks[2], &text[1800..2500]);
    }

    #[test]
    fn test_short_text_is_a_single_chunk() {
        let chunks = split_into_chunks("short resume", ChunkingConfig::default());
        assert_eq!(chunks, vec!["short resume"]);
    }

    #[test]
    fn test_exact_chunk_size_is_a_single_chunk() {
        assert_eq!(
            chunk_spans(1000, ChunkingConfig::default()),
            vec![ChunkSpan { start: 0, end: 1000 }]
        );
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_into_chunks("", ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "é".repeat(15);
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 2,
        };
        let chunks = split_into_chunks(&text, config);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[1].chars().count(), 7);
    }

    #[test]
    fn test_oversized_overlap_still_advances() {
        let config = ChunkingConfig {
            chunk_size: 4,
            chunk_overlap: 10,
        };
        let spans = chunk_spans(6, config);
        assert_eq!(spans.first(), Some(&ChunkSpan { start: 0, end: 4 }));
        assert_eq!(spans.last().map(|s| s.end), Some(6));
    }
}
