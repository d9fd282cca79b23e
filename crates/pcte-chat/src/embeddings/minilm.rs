use anyhow::{anyhow, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use parking_lot::{Mutex, RwLock};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::EmbeddingModel;

const MAX_BATCH_SIZE: usize = 8;
const QUERY_CACHE_SIZE: usize = 512;

#[derive(Clone, Debug)]
pub struct MiniLmConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimension: usize,
    pub max_length: usize,
    pub normalize: bool,
}

impl MiniLmConfig {
    /// Locate `model.onnx` (or an optimized variant) and `tokenizer.json`
    /// inside an all-MiniLM-L6-v2 export directory.
    pub fn from_model_dir(model_dir: &Path, max_length: usize) -> Option<Self> {
        let candidates = [
            model_dir.join("model_O4.onnx"),
            model_dir.join("model.onnx"),
            model_dir.join("onnx").join("model.onnx"),
        ];
        let model_path = candidates.into_iter().find(|p| p.exists())?;

        let tokenizer_path = [
            model_dir.join("tokenizer.json"),
            model_dir.join("onnx").join("tokenizer.json"),
        ]
        .into_iter()
        .find(|p| p.exists())?;

        Some(Self {
            model_path,
            tokenizer_path,
            dimension: 384,
            max_length,
            normalize: true,
        })
    }
}

/// Sentence embeddings from an ONNX export of all-MiniLM-L6-v2, mean-pooled
/// over the attention mask.
pub struct MiniLmEmbeddings {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    config: MiniLmConfig,
    cache: Arc<RwLock<lru::LruCache<String, Vec<f32>>>>,
}

impl MiniLmEmbeddings {
    pub fn new(config: MiniLmConfig) -> Result<Self> {
        ort::init().with_name("pcte_embeddings").commit();

        if !config.model_path.exists() {
            return Err(anyhow!(
                "Model file not found at: {}",
                config.model_path.display()
            ));
        }

        let tokenizer = tokenizers::Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {:?}", e))?;

        let model_bytes = std::fs::read(&config.model_path)
            .map_err(|e| anyhow!("Failed to read model: {:?}", e))?;

        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let session = Session::builder()
            .map_err(|e| anyhow!("Session builder: {:?}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Optimization level: {:?}", e))?
            .with_intra_threads(num_threads)
            .map_err(|e| anyhow!("Intra threads: {:?}", e))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| anyhow!("Failed to load model: {:?}", e))?;

        let cache_size = NonZeroUsize::new(QUERY_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);

        tracing::info!(
            dimension = config.dimension,
            max_length = config.max_length,
            "Embedding model loaded from {}",
            config.model_path.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config,
            cache: Arc::new(RwLock::new(lru::LruCache::new(cache_size))),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let encodings = batch
                .iter()
                .map(|t| {
                    self.tokenizer
                        .encode(*t, true)
                        .map_err(|e| anyhow!("Tokenization failed: {:?}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let padded_len = encodings
                .iter()
                .map(|e| e.get_ids().len().min(self.config.max_length))
                .max()
                .unwrap_or(1)
                .max(1);
            let batch_size = encodings.len();

            let mut ids_flat = Vec::with_capacity(batch_size * padded_len);
            let mut mask_flat = Vec::with_capacity(batch_size * padded_len);
            let mut type_flat = Vec::with_capacity(batch_size * padded_len);

            for enc in &encodings {
                let len = enc.get_ids().len().min(padded_len);
                for i in 0..len {
                    ids_flat.push(enc.get_ids()[i] as i64);
                    mask_flat.push(enc.get_attention_mask()[i] as i64);
                    type_flat.push(enc.get_type_ids()[i] as i64);
                }
                for _ in len..padded_len {
                    ids_flat.push(0i64);
                    mask_flat.push(0i64);
                    type_flat.push(0i64);
                }
            }

            let shape = vec![batch_size, padded_len];
            let input_ids = Value::from_array((shape.clone(), ids_flat))
                .map_err(|e| anyhow!("input_ids tensor: {:?}", e))?;
            let attention_mask = Value::from_array((shape.clone(), mask_flat.clone()))
                .map_err(|e| anyhow!("attention_mask tensor: {:?}", e))?;
            let token_type_ids = Value::from_array((shape, type_flat))
                .map_err(|e| anyhow!("token_type_ids tensor: {:?}", e))?;

            let inputs = ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ];

            let mut session = self.session.lock();
            let outputs = session
                .run(inputs)
                .map_err(|e| anyhow!("Batch inference failed: {:?}", e))?;

            let (shape, data) = outputs["last_hidden_state"]
                .try_extract_tensor::<f32>()
                .map_err(|e| anyhow!("Failed to extract last_hidden_state: {:?}", e))?;

            let seq_len = shape[1] as usize;
            let hidden_dim = shape[2] as usize;

            for sample_idx in 0..batch_size {
                let mask = &mask_flat[sample_idx * padded_len..(sample_idx + 1) * padded_len];
                let sample = &data[sample_idx * seq_len * hidden_dim..(sample_idx + 1) * seq_len * hidden_dim];
                let pooled = mean_pool(sample, mask, seq_len, hidden_dim);
                all_embeddings.push(self.normalize_vec(pooled));
            }
        }

        Ok(all_embeddings)
    }

    fn normalize_vec(&self, mut vec: Vec<f32>) -> Vec<f32> {
        if self.config.normalize {
            let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 1e-12 {
                for v in &mut vec {
                    *v /= norm;
                }
            }
        }
        vec
    }
}

/// Average token vectors where the attention mask is set.
fn mean_pool(hidden: &[f32], mask: &[i64], seq_len: usize, hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut mask_sum = 0.0f32;

    for pos in 0..seq_len {
        let mask_val = mask.get(pos).copied().unwrap_or(0) as f32;
        if mask_val > 0.0 {
            mask_sum += mask_val;
            let offset = pos * hidden_dim;
            for dim in 0..hidden_dim {
                pooled[dim] += hidden[offset + dim] * mask_val;
            }
        }
    }

    if mask_sum > 0.0 {
        for v in &mut pooled {
            *v /= mask_sum;
        }
    }
    pooled
}

impl EmbeddingModel for MiniLmEmbeddings {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.write().get(text) {
            return Ok(cached.clone());
        }
        let embedding = self
            .embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow!("Embedding model returned no vector"))?;
        self.cache.write().put(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow!("Embedding model returned no vector"))
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
