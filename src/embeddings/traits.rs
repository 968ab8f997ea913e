// Embedder trait — the swap-ready abstraction for sentence vectors.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for turning texts into fixed-width vectors. Async because the ONNX
/// implementation offloads inference to a blocking thread.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Width of every vector this embedder returns.
    fn dim(&self) -> usize;

    /// Short identifier recorded alongside stored embeddings.
    fn name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per text in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
