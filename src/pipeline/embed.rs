// Embed stage: cleaned.csv -> embeddings.npy + embeddings.ids.json.

use anyhow::Result;
use tracing::info;

use super::runner::{Resources, StageReport};
use super::Stage;
use crate::embeddings::vector::l2_normalize;
use crate::error::PipelineError;
use crate::models::CleanedDocument;
use crate::store::tables::read_table;
use crate::store::{Artifact, DataDir, StoredEmbeddings};

pub async fn run(data: &DataDir, resources: &Resources) -> Result<StageReport> {
    let cleaned: Vec<CleanedDocument> = read_table(&data.path(Artifact::Cleaned))?;
    if cleaned.is_empty() {
        return Err(PipelineError::empty(Stage::Embed.name()).into());
    }

    let texts: Vec<String> = cleaned.iter().map(|d| d.normalized_text.clone()).collect();
    let mut vectors = resources.embedder.embed_batch(&texts).await?;
    for v in &mut vectors {
        l2_normalize(v);
    }

    let ids = cleaned.into_iter().map(|d| d.id).collect();
    let stored = StoredEmbeddings::new(ids, vectors)?;
    stored.save(&data.path(Artifact::Embeddings))?;

    info!(
        documents = stored.len(),
        dim = stored.dim,
        embedder = resources.embedder.name(),
        "Stored embeddings"
    );
    Ok(StageReport::new(Stage::Embed, stored.len()))
}
