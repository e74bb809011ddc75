//! Overlapping text chunker
//!
//! Sizes are measured in characters, not bytes. A chunk ends at the last
//! whitespace inside its window when there is one, so words are only cut
//! when a single word is longer than the window.

/// A chunk and the byte range it was cut from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Trimmed chunk text
    pub text: String,
    /// Byte offset of the first character in the source
    pub start: usize,
    /// Byte offset one past the last character in the source
    pub end: usize,
}

impl ChunkSpan {
    /// Whether the chunk shares at least one byte with `start..end`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Splits documents into overlapping chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker; `overlap` is clamped below `size`
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    /// Split `text` into trimmed, non-empty chunks
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::knowledge::Chunker;
    ///
    /// let chunks = Chunker::new(12, 4).split("reset the wifi module now");
    /// assert_eq!(chunks, vec!["reset the", "the wifi", "wifi module", "module now"]);
    /// ```
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_spans(text).into_iter().map(|span| span.text).collect()
    }

    /// Split `text` like [`Chunker::split`], keeping each chunk's byte range
    pub fn split_spans(&self, text: &str) -> Vec<ChunkSpan> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let n = chars.len();
        let byte_at = |i: usize| if i < n { chars[i].0 } else { text.len() };

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < n {
            let mut end = (start + self.size).min(n);
            if end < n && !chars[end].1.is_whitespace() {
                if let Some(ws) = (start + 1..end).rev().find(|&i| chars[i].1.is_whitespace()) {
                    end = ws;
                }
            }

            let from = byte_at(start);
            let window = &text[from..byte_at(end)];
            let chunk = window.trim();
            if !chunk.is_empty() {
                let lead = window.len() - window.trim_start().len();
                chunks.push(ChunkSpan {
                    text: chunk.to_string(),
                    start: from + lead,
                    end: from + lead + chunk.len(),
                });
            }
            if end >= n {
                break;
            }

            // Step back by the overlap, then to the nearest word start
            let overlap_start = end.saturating_sub(self.overlap).max(start + 1);
            let floor = overlap_start.saturating_sub(self.overlap).max(start + 1);
            start = match (floor..=overlap_start)
                .rev()
                .find(|&i| chars[i - 1].1.is_whitespace())
            {
                Some(word_start) => word_start,
                None => {
                    let mut next = overlap_start;
                    while next < end && !chars[next - 1].1.is_whitespace() {
                        next += 1;
                    }
                    next
                }
            };
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(Chunker::new(100, 20).split("  one chunk  "), vec!["one chunk"]);
    }

    #[test]
    fn test_spans_point_back_into_source() {
        let text = "  reset the wifi module now  ";
        for span in Chunker::new(12, 4).split_spans(text) {
            assert_eq!(&text[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(Chunker::new(100, 20).split("   \n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = "word ".repeat(500);
        let chunks = Chunker::new(100, 20).split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
            assert!(!chunk.starts_with(' '));
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text: String = (0..200).map(|i| format!("w{} ", i)).collect();
        let chunks = Chunker::new(60, 15).split(&text);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().unwrap();
            assert!(pair[1].contains(last_word), "{:?}", pair);
        }
    }

    #[test]
    fn test_long_word_is_cut() {
        let chunks = Chunker::new(4, 1).split("abcdefghij");
        assert_eq!(chunks[0], "abcd");
        assert!(chunks.concat().contains("ghij"));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Überprüfen Sie die Saugleistung ".repeat(40);
        let chunks = Chunker::new(50, 10).split(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
    }

    #[test]
    fn test_overlap_clamped() {
        let chunker = Chunker::new(10, 50);
        assert_eq!(chunker, Chunker::new(10, 9));
    }
}
