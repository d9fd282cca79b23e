/// Fixed-width, non-overlapping character chunker.
///
/// Boundaries are character offsets, so a chunk may end mid-word; multi-byte
/// characters are never split.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into consecutive slices of exactly `chunk_size` characters;
    /// the last one may be shorter.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::with_capacity(text.len() / self.chunk_size + 1);
        let mut current = String::new();
        let mut count = 0usize;

        for ch in text.chars() {
            current.push(ch);
            count += 1;
            if count == self.chunk_size {
                chunks.push(std::mem::take(&mut current));
                count = 0;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    TextChunker::new(chunk_size).chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_width_with_short_tail() {
        let chunks = chunk_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunks_reassemble_to_source() {
        let text = "PCTE offers BCA, MBA and B.Tech programmes. ".repeat(40);
        let chunks = chunk_text(&text, 500);
        assert_eq!(chunks.concat(), text);
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.chars().count() == 500));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunks = chunk_text("ਪੰਜਾਬ college", 3);
        assert_eq!(chunks[0].chars().count(), 3);
        assert_eq!(chunks.concat(), "ਪੰਜਾਬ college");
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 500).is_empty());
    }

    #[test]
    fn zero_width_is_clamped() {
        assert_eq!(TextChunker::new(0).chunk_size(), 1);
    }
}
