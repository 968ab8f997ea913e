pub mod annotator;
pub mod gazetteer;
pub mod mentions;
pub mod normalizer;
pub mod phrases;

pub use annotator::{LexiconAnnotator, LinguisticAnnotator};
pub use gazetteer::Gazetteer;
pub use normalizer::{clean_raw, Normalizer};
pub use phrases::PhraseDetector;
