//! Feed-forward intent classifier (input -> hidden -> hidden -> output).
//!
//! The network, the vocabulary it was trained on and the tag order travel
//! together in one JSON artifact. Loading checks every dimension up front so a
//! mismatched artifact is fatal at startup instead of misclassifying later.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::featurizer::featurize;
use crate::error::{HelpdeskError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerParams {
    /// Row-major `[out][in]`.
    pub weight: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkParams {
    pub l1: LayerParams,
    pub l2: LayerParams,
    pub l3: LayerParams,
}

/// On-disk classifier artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    #[serde(alias = "vocabulary")]
    pub all_words: Vec<String>,
    pub tags: Vec<String>,
    #[serde(alias = "parameters")]
    pub model_state: NetworkParams,
}

impl ClassifierArtifact {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HelpdeskError::ArtifactMismatch(format!(
                "cannot read classifier artifact {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            HelpdeskError::ArtifactMismatch(format!("malformed classifier artifact: {}", e))
        })
    }
}

/// Result of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub tag: String,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

/// Anything that can turn an utterance into an intent prediction.
pub trait IntentPredictor: Send + Sync {
    fn predict(&self, text: &str) -> Result<Prediction>;
}

struct Linear {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl Linear {
    fn from_params(name: &str, params: &LayerParams, inputs: usize, outputs: usize) -> Result<Self> {
        if params.weight.len() != outputs || params.bias.len() != outputs {
            return Err(HelpdeskError::ArtifactMismatch(format!(
                "{} expects {} outputs, weight has {} rows and bias {} entries",
                name,
                outputs,
                params.weight.len(),
                params.bias.len()
            )));
        }
        if let Some((row, r)) = params.weight.iter().enumerate().find(|(_, r)| r.len() != inputs) {
            return Err(HelpdeskError::ArtifactMismatch(format!(
                "{} row {} has {} columns, expected {}",
                name,
                row,
                r.len(),
                inputs
            )));
        }

        let flat: Vec<f32> = params.weight.iter().flatten().copied().collect();
        let weight = Array2::from_shape_vec((outputs, inputs), flat)
            .map_err(|e| HelpdeskError::ArtifactMismatch(format!("{}: {}", name, e)))?;

        Ok(Self {
            weight,
            bias: Array1::from_vec(params.bias.clone()),
        })
    }

    fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        self.weight.dot(x) + &self.bias
    }
}

pub struct IntentClassifier {
    vocabulary: Vec<String>,
    tags: Vec<String>,
    l1: Linear,
    l2: Linear,
    l3: Linear,
}

impl IntentClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = ClassifierArtifact::from_file(path)?;
        let classifier = Self::from_artifact(artifact)?;
        tracing::info!(
            vocabulary = classifier.vocabulary.len(),
            tags = classifier.tags.len(),
            "Intent classifier loaded from {}",
            path.display()
        );
        Ok(classifier)
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self> {
        if artifact.all_words.len() != artifact.input_size {
            return Err(HelpdeskError::ArtifactMismatch(format!(
                "vocabulary has {} words but input_size is {}",
                artifact.all_words.len(),
                artifact.input_size
            )));
        }
        if artifact.tags.len() != artifact.output_size {
            return Err(HelpdeskError::ArtifactMismatch(format!(
                "tag set has {} tags but output_size is {}",
                artifact.tags.len(),
                artifact.output_size
            )));
        }
        if artifact.output_size == 0 {
            return Err(HelpdeskError::ArtifactMismatch("tag set is empty".to_string()));
        }

        let (input, hidden, output) =
            (artifact.input_size, artifact.hidden_size, artifact.output_size);
        let params = &artifact.model_state;

        Ok(Self {
            l1: Linear::from_params("l1", &params.l1, input, hidden)?,
            l2: Linear::from_params("l2", &params.l2, hidden, hidden)?,
            l3: Linear::from_params("l3", &params.l3, hidden, output)?,
            vocabulary: artifact.all_words,
            tags: artifact.tags,
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Score a feature vector; returns the arg-max tag and its probability.
    pub fn classify(&self, features: &[f32]) -> Result<Prediction> {
        if features.len() != self.vocabulary.len() {
            return Err(HelpdeskError::ShapeMismatch {
                expected: self.vocabulary.len(),
                actual: features.len(),
            });
        }

        let x = Array1::from_vec(features.to_vec());
        let h1 = self.l1.forward(&x).mapv(relu);
        let h2 = self.l2.forward(&h1).mapv(relu);
        let probabilities = softmax(&self.l3.forward(&h2));

        let (best_idx, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (i, p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });

        Ok(Prediction {
            tag: self.tags[best_idx].clone(),
            confidence: confidence.clamp(0.0, 1.0),
            probabilities,
        })
    }
}

impl IntentPredictor for IntentClassifier {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let features = featurize(text, &self.vocabulary);
        self.classify(&features)
    }
}

fn relu(v: f32) -> f32 {
    v.max(0.0)
}

fn softmax(logits: &Array1<f32>) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![1.0 / logits.len() as f32; logits.len()]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn identity(n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect()
    }

    /// Vocabulary `[hello, bye]`, tags `[goodbye, greeting]`. "hello" scores
    /// greeting at exactly 11.5 / 12.5 = 0.92.
    pub(crate) fn greeting_artifact() -> ClassifierArtifact {
        let margin = 11.5f32.ln();
        ClassifierArtifact {
            input_size: 2,
            hidden_size: 2,
            output_size: 2,
            all_words: vec!["hello".into(), "bye".into()],
            tags: vec!["goodbye".into(), "greeting".into()],
            model_state: NetworkParams {
                l1: LayerParams { weight: identity(2), bias: vec![0.0, 0.0] },
                l2: LayerParams { weight: identity(2), bias: vec![0.0, 0.0] },
                l3: LayerParams {
                    weight: vec![vec![0.0, margin], vec![margin, 0.0]],
                    bias: vec![0.0, 0.0],
                },
            },
        }
    }

    #[test]
    fn hello_scores_greeting() {
        let classifier = IntentClassifier::from_artifact(greeting_artifact()).unwrap();
        let prediction = classifier.predict("hello").unwrap();
        assert_eq!(prediction.tag, "greeting");
        assert!((prediction.confidence - 0.92).abs() < 1e-4);

        let prediction = classifier.predict("bye!").unwrap();
        assert_eq!(prediction.tag, "goodbye");
    }

    #[test]
    fn confidence_is_argmax_of_distribution() {
        let classifier = IntentClassifier::from_artifact(greeting_artifact()).unwrap();
        for text in ["hello", "bye", "hello bye", "", "something else"] {
            let p = classifier.predict(text).unwrap();
            assert!((0.0..=1.0).contains(&p.confidence));
            let sum: f32 = p.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);

            let max = p.probabilities.iter().copied().fold(f32::MIN, f32::max);
            let idx = classifier.tags().iter().position(|t| *t == p.tag).unwrap();
            assert_eq!(p.probabilities[idx], max);
            assert_eq!(p.confidence, max);
        }
    }

    #[test]
    fn inference_is_deterministic() {
        let classifier = IntentClassifier::from_artifact(greeting_artifact()).unwrap();
        let a = classifier.predict("hello there").unwrap();
        let b = classifier.predict("hello there").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_feature_length_is_rejected() {
        let classifier = IntentClassifier::from_artifact(greeting_artifact()).unwrap();
        match classifier.classify(&[1.0, 0.0, 0.0]) {
            Err(HelpdeskError::ShapeMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (2, 3));
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn vocabulary_size_mismatch_fails_fast() {
        let mut artifact = greeting_artifact();
        artifact.all_words.push("extra".into());
        assert!(matches!(
            IntentClassifier::from_artifact(artifact),
            Err(HelpdeskError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn tag_count_mismatch_fails_fast() {
        let mut artifact = greeting_artifact();
        artifact.tags.pop();
        assert!(matches!(
            IntentClassifier::from_artifact(artifact),
            Err(HelpdeskError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn malformed_layer_fails_fast() {
        let mut artifact = greeting_artifact();
        artifact.model_state.l2.weight[1].push(0.5);
        assert!(matches!(
            IntentClassifier::from_artifact(artifact),
            Err(HelpdeskError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_string(&greeting_artifact()).unwrap()).unwrap();

        let classifier = IntentClassifier::load(&path).unwrap();
        assert_eq!(classifier.vocabulary().len(), 2);
        assert_eq!(classifier.tags(), &["goodbye".to_string(), "greeting".to_string()]);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let probs = softmax(&Array1::from_vec(vec![1000.0, 1000.0]));
        assert_eq!(probs, vec![0.5, 0.5]);
    }

    #[test]
    fn shipped_artifact_matches_shipped_catalog() {
        use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;

        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
        let classifier = IntentClassifier::load(&data.join("intent_model.json")).unwrap();
        let catalog = crate::intent::IntentCatalog::from_file(&data.join("intents.json")).unwrap();

        let mut catalog_tags: Vec<&str> = catalog.intents.iter().map(|i| i.tag.as_str()).collect();
        catalog_tags.sort_unstable();
        assert_eq!(classifier.tags(), catalog_tags.as_slice());

        let cases = [
            ("Hello", "greeting"),
            ("What time is it?", "current_time"),
            ("what's the date today", "current_date"),
            ("What day is tomorrow?", "day_tomorrow"),
            ("see you later", "goodbye"),
            ("Where is the college?", "location"),
        ];
        for (text, tag) in cases {
            let prediction = classifier.predict(text).unwrap();
            assert_eq!(prediction.tag, tag, "input {:?}", text);
            assert!(prediction.confidence >= DEFAULT_CONFIDENCE_THRESHOLD, "input {:?}", text);
        }

        let unknown = classifier.predict("quantum chromodynamics").unwrap();
        assert!(unknown.confidence < DEFAULT_CONFIDENCE_THRESHOLD);
    }
}
