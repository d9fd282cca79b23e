//! Process-wide brochure index, built on first use.
//!
//! The build runs at most once at a time: concurrent first requests wait on
//! the same initialization. A failed build stores nothing, so the next request
//! tries again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::embeddings::EmbeddingModel;
use crate::error::{HelpdeskError, Result};
use crate::processing::load_document;
use crate::search::{DocumentIndex, ScoredChunk};

pub struct BrochureIndex {
    source: PathBuf,
    chunk_size: usize,
    embedder: Arc<dyn EmbeddingModel>,
    index: OnceCell<Arc<DocumentIndex>>,
}

impl BrochureIndex {
    pub fn new(source: impl Into<PathBuf>, chunk_size: usize, embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            source: source.into(),
            chunk_size,
            embedder,
            index: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_built(&self) -> bool {
        self.index.initialized()
    }

    /// Return the index, building it if no build has succeeded yet.
    pub async fn get_or_build(&self) -> Result<Arc<DocumentIndex>> {
        self.index
            .get_or_try_init(|| async {
                let source = self.source.clone();
                let chunk_size = self.chunk_size;
                let embedder = Arc::clone(&self.embedder);

                tracing::info!("Building brochure index from {}", source.display());
                let started = std::time::Instant::now();

                let built = tokio::task::spawn_blocking(move || {
                    let text = load_document(&source)?;
                    DocumentIndex::build(&text, chunk_size, embedder.as_ref())
                })
                .await
                .map_err(|e| HelpdeskError::internal(format!("index build task failed: {}", e)))?;

                match built {
                    Ok(index) => {
                        tracing::info!(
                            chunks = index.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Brochure index ready"
                        );
                        Ok::<_, HelpdeskError>(Arc::new(index))
                    }
                    Err(e) => {
                        tracing::warn!("Brochure index build failed, will retry on next request: {}", e);
                        Err(e)
                    }
                }
            })
            .await
            .map(Arc::clone)
    }

    /// Embed `query` and return the best `top_k` chunks.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let index = self.get_or_build().await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let embedder = Arc::clone(&self.embedder);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || {
            let query_embedding = embedder
                .embed_query(&query)
                .map_err(|e| HelpdeskError::RetrievalUnavailable(format!("query embedding failed: {}", e)))?;
            index.retrieve(&query_embedding, top_k)
        })
        .await
        .map_err(|e| HelpdeskError::internal(format!("retrieval task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::semantic::tests::KeywordEmbedder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: KeywordEmbedder,
        batches: AtomicUsize,
    }

    impl EmbeddingModel for CountingEmbedder {
        fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.inner.embed_query(text)
        }

        fn embed_document(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.inner.embed_document(text)
        }

        fn embed_documents(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            texts.iter().map(|t| self.inner.embed_document(t)).collect()
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    fn write_brochure(dir: &Path) -> PathBuf {
        let path = dir.join("brochure.txt");
        let text = format!(
            "{}{}{}",
            "The library is open all week. ".repeat(4),
            "Admission requires a fee of fifty thousand. ".repeat(3),
            "The hostel has wifi. ".repeat(5)
        );
        std::fs::write(&path, text).unwrap();
        path
    }

    #[tokio::test]
    async fn concurrent_first_requests_build_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_brochure(dir.path());
        let embedder = Arc::new(CountingEmbedder {
            inner: KeywordEmbedder::campus(),
            batches: AtomicUsize::new(0),
        });
        let index = Arc::new(BrochureIndex::new(path, 100, embedder.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = Arc::clone(&index);
                tokio::spawn(async move { index.retrieve("admission fee", 2).await })
            })
            .collect();
        for h in handles {
            let results = h.await.unwrap().unwrap();
            assert_eq!(results.len(), 2);
        }

        assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);
        assert!(index.is_built());
    }

    #[tokio::test]
    async fn missing_source_fails_then_retries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brochure.txt");
        let index = BrochureIndex::new(path.clone(), 100, Arc::new(KeywordEmbedder::campus()));

        let err = index.retrieve("fee", 3).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::SourceNotFound(_)));
        assert!(!index.is_built());

        write_brochure(dir.path());
        let results = index.retrieve("hostel", 1).await.unwrap();
        assert!(results[0].text.contains("hostel"));
        assert!(index.is_built());
    }

    #[tokio::test]
    async fn empty_document_yields_no_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        let index = BrochureIndex::new(path, 100, Arc::new(KeywordEmbedder::campus()));
        assert!(index.retrieve("fee", 3).await.unwrap().is_empty());
    }
}
