use rayon::prelude::*;
use serde::Serialize;

use crate::embeddings::EmbeddingModel;
use crate::error::{HelpdeskError, Result};
use crate::processing::chunk_text;

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub position: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub position: usize,
    pub text: String,
    pub score: f32,
}

/// Chunks of one source document with their embeddings, in document order.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    chunks: Vec<IndexedChunk>,
}

impl DocumentIndex {
    /// Chunk `text` and embed every chunk in one batched pass.
    pub fn build(text: &str, chunk_size: usize, embedder: &dyn EmbeddingModel) -> Result<Self> {
        if chunk_size == 0 {
            return Err(HelpdeskError::InvalidArgument("chunk_size must be > 0".into()));
        }

        let chunks = chunk_text(text, chunk_size);
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = embedder
            .embed_documents(&refs)
            .map_err(|e| HelpdeskError::RetrievalUnavailable(format!("chunk embedding failed: {}", e)))?;

        if embeddings.len() != chunks.len() {
            return Err(HelpdeskError::RetrievalUnavailable(format!(
                "embedding model returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let chunks = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (text, embedding))| IndexedChunk {
                position,
                text,
                embedding,
            })
            .collect();

        Ok(Self { chunks })
    }

    /// Wrap pre-embedded chunks. They are ordered by `position`, which may be
    /// sparse or arrive out of order.
    pub fn from_chunks(mut chunks: Vec<IndexedChunk>) -> Self {
        chunks.sort_by_key(|c| c.position);
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    /// Top `top_k` chunks by descending cosine similarity. Equal scores keep
    /// document order. An empty index yields an empty result.
    pub fn retrieve(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(HelpdeskError::InvalidArgument("top_k must be >= 1".into()));
        }

        // keyed by slot in `chunks`, not by `position`
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .par_iter()
            .enumerate()
            .map(|(slot, c)| (slot, cosine_similarity(query_embedding, &c.embedding)))
            .collect();

        // stable: ties stay in document order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(slot, score)| {
                let chunk = &self.chunks[slot];
                ScoredChunk {
                    position: chunk.position,
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect())
    }
}

/// Cosine similarity; zero vectors and length mismatches score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON || !denom.is_finite() {
        0.0
    } else {
        let score = dot / denom;
        if score.is_nan() {
            0.0
        } else {
            score
        }
    }
}

/// Render retrieved chunks as the grounding block for a prompt.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "--- Relevant Information {} (Relevance: {:.2}) ---\n{}",
                i + 1,
                chunk.score,
                chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Deterministic embedder: counts of a few keywords, one dimension each.
    pub(crate) struct KeywordEmbedder {
        pub keywords: Vec<&'static str>,
    }

    impl KeywordEmbedder {
        pub(crate) fn campus() -> Self {
            Self {
                keywords: vec!["fee", "hostel", "admission", "library", "placement"],
            }
        }
    }

    impl EmbeddingModel for KeywordEmbedder {
        fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(self
                .keywords
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect())
        }

        fn embed_document(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.embed_query(text)
        }

        fn dimension(&self) -> usize {
            self.keywords.len()
        }
    }

    pub(crate) struct BrokenEmbedder;

    impl EmbeddingModel for BrokenEmbedder {
        fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Err(anyhow!("onnx session crashed"))
        }

        fn embed_document(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Err(anyhow!("onnx session crashed"))
        }

        fn dimension(&self) -> usize {
            0
        }
    }

    fn chunk(position: usize, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            position,
            text: format!("chunk {}", position),
            embedding,
        }
    }

    #[test]
    fn ranks_by_descending_similarity() {
        let index = DocumentIndex::from_chunks(vec![
            chunk(0, vec![0.0, 1.0]),
            chunk(1, vec![1.0, 0.0]),
            chunk(2, vec![1.0, 1.0]),
        ]);
        let results = index.retrieve(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_document_order() {
        let index = DocumentIndex::from_chunks(vec![
            chunk(0, vec![1.0, 0.0]),
            chunk(1, vec![0.0, 1.0]),
            chunk(2, vec![2.0, 0.0]),
            chunk(3, vec![3.0, 0.0]),
        ]);
        let results = index.retrieve(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(order, vec![0, 2, 3]);
    }

    #[test]
    fn sparse_and_unordered_positions() {
        let index = DocumentIndex::from_chunks(vec![chunk(7, vec![1.0, 0.0])]);
        let results = index.retrieve(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position, 7);
        assert_eq!(results[0].text, "chunk 7");

        let index = DocumentIndex::from_chunks(vec![
            chunk(40, vec![1.0, 0.0]),
            chunk(12, vec![0.0, 1.0]),
            chunk(5, vec![1.0, 0.0]),
        ]);
        let positions: Vec<usize> = index.chunks().iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![5, 12, 40]);

        let results = index.retrieve(&[1.0, 0.0], 3).unwrap();
        let order: Vec<(usize, &str)> = results.iter().map(|r| (r.position, r.text.as_str())).collect();
        assert_eq!(order, vec![(5, "chunk 5"), (40, "chunk 40"), (12, "chunk 12")]);
    }

    #[test]
    fn never_more_than_top_k() {
        let index = DocumentIndex::from_chunks((0..10).map(|i| chunk(i, vec![i as f32, 1.0])).collect());
        assert_eq!(index.retrieve(&[1.0, 1.0], 3).unwrap().len(), 3);
        assert_eq!(index.retrieve(&[1.0, 1.0], 50).unwrap().len(), 10);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = DocumentIndex::default();
        assert!(index.retrieve(&[1.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let index = DocumentIndex::default();
        assert!(matches!(
            index.retrieve(&[1.0], 0),
            Err(HelpdeskError::InvalidArgument(_))
        ));
    }

    #[test]
    fn build_aligns_embeddings_with_chunks() {
        let text = "fee structure ".repeat(10) + &"hostel rooms ".repeat(10);
        let embedder = KeywordEmbedder::campus();
        let index = DocumentIndex::build(&text, 50, &embedder).unwrap();
        assert_eq!(index.len(), text.chars().count().div_ceil(50));
        for (i, c) in index.chunks().iter().enumerate() {
            assert_eq!(c.position, i);
            assert_eq!(c.embedding, embedder.embed_document(&c.text).unwrap());
        }

        let query = embedder.embed_query("hostel").unwrap();
        let top = index.retrieve(&query, 1).unwrap();
        assert!(top[0].text.contains("hostel"));
    }

    #[test]
    fn build_failure_is_retrieval_unavailable() {
        let err = DocumentIndex::build("some brochure text", 5, &BrokenEmbedder).unwrap_err();
        assert!(matches!(err, HelpdeskError::RetrievalUnavailable(_)));
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn context_block_format() {
        let block = format_context(&[
            ScoredChunk { position: 4, text: "Fees: 1 lakh".into(), score: 0.8765 },
            ScoredChunk { position: 1, text: "Hostel".into(), score: 0.5 },
        ]);
        assert_eq!(
            block,
            "--- Relevant Information 1 (Relevance: 0.88) ---\nFees: 1 lakh\n\n\
             --- Relevant Information 2 (Relevance: 0.50) ---\nHostel"
        );
    }
}
