// Sentiment and location scoring.
//
// PolarityClassifier and EntityTagger are the swap points. The ONNX
// classifier is the default when its model files are present; the lexicon
// classifier covers the rest.

pub mod entities;
pub mod lexicon;
pub mod onnx;
pub mod scorer;
pub mod seeds;
pub mod semaxis;
pub mod traits;

pub use entities::{EntityTagger, NoEntities, RuleEntityTagger};
pub use lexicon::LexiconClassifier;
pub use onnx::OnnxPolarityClassifier;
pub use scorer::SentimentScorer;
pub use semaxis::SemAxis;
pub use traits::{signed_score, Polarity, PolarityClassifier};
