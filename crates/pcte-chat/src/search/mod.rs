pub mod semantic;

pub use semantic::{cosine_similarity, format_context, DocumentIndex, IndexedChunk, ScoredChunk};
