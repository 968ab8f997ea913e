// Sentence embeddings — text → dense vectors for topic grouping.
//
// The Embedder trait is the swap point. SentenceEmbedder runs a multilingual
// sentence transformer locally via ONNX; HashingEmbedder is a model-free
// fallback used in tests and when the model hasn't been downloaded.

pub mod hashing;
pub mod onnx;
pub mod traits;
pub mod vector;

pub use hashing::HashingEmbedder;
pub use onnx::SentenceEmbedder;
pub use traits::Embedder;
