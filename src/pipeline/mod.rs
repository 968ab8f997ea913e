// Pipeline stages: raw posts -> cleaned -> embeddings -> topics/clusters
// -> sentiment -> merged results.
//
// Each stage reads artifacts from the data directory and writes new ones.
// A stage never runs unless every artifact it requires already exists, so a
// missing upstream file fails fast with the path instead of half-way through.

pub mod clean;
pub mod embed;
pub mod group;
pub mod lock;
pub mod merge;
pub mod runner;
pub mod score;

use std::fmt;
use std::str::FromStr;

use crate::store::Artifact;

pub use lock::PipelineLock;
pub use runner::{PipelineRunner, Resources, StageReport};

/// A node in the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Clean,
    Embed,
    Topics,
    Cluster,
    Score,
    Merge,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Clean,
        Stage::Embed,
        Stage::Topics,
        Stage::Cluster,
        Stage::Score,
        Stage::Merge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Embed => "embed",
            Stage::Topics => "topics",
            Stage::Cluster => "cluster",
            Stage::Score => "score",
            Stage::Merge => "merge",
        }
    }

    /// Artifacts that must exist before the stage can run.
    pub fn requires(&self) -> &'static [Artifact] {
        match self {
            Stage::Clean => &[Artifact::Raw],
            Stage::Embed => &[Artifact::Cleaned],
            Stage::Topics => &[Artifact::Cleaned, Artifact::Embeddings],
            Stage::Cluster => &[Artifact::Topics, Artifact::Embeddings],
            // Embeddings are optional here: without them the semaxis column is empty.
            Stage::Score => &[Artifact::Cleaned],
            Stage::Merge => &[Artifact::Cleaned],
        }
    }

    /// Artifacts the stage writes.
    pub fn produces(&self) -> &'static [Artifact] {
        match self {
            Stage::Clean => &[Artifact::Cleaned, Artifact::Mentions],
            Stage::Embed => &[Artifact::Embeddings],
            Stage::Topics => &[Artifact::Topics, Artifact::TopicInfo],
            Stage::Cluster => &[Artifact::Clusters],
            Stage::Score => &[Artifact::Sentiments],
            Stage::Merge => &[Artifact::Results],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s.trim().to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Unknown stage {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_requirement_is_produced_upstream() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            for needed in stage.requires() {
                if *needed == Artifact::Raw {
                    continue;
                }
                let upstream = Stage::ALL[..i].iter().any(|s| s.produces().contains(needed));
                assert!(upstream, "{stage} needs {needed} before it is produced");
            }
        }
    }

    #[test]
    fn test_parse_stage_names() {
        assert_eq!("topics".parse::<Stage>().unwrap(), Stage::Topics);
        assert_eq!(" Merge ".parse::<Stage>().unwrap(), Stage::Merge);
        assert!("sweep".parse::<Stage>().is_err());
    }
}
