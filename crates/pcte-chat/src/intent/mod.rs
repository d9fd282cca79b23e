//! Local intent path: featurize, classify, answer from the catalog or the clock.

pub mod catalog;
pub mod classifier;
pub mod clock;
pub mod featurizer;
pub mod porter;

pub use catalog::{IntentCatalog, IntentEntry, IntentResponder, ReplyStrategy};
pub use classifier::{
    ClassifierArtifact, IntentClassifier, IntentPredictor, LayerParams, NetworkParams, Prediction,
};
pub use clock::{resolve_now, resolve_zone};
pub use featurizer::{featurize, stem, tokenize};
