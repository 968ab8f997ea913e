// On-disk artifacts — the files stages hand to each other.
//
// Every stage reads and writes inside one data directory. `DataDir` names the
// files so nothing else in the crate builds paths by hand.

pub mod npy;
pub mod tables;

use std::fmt;
use std::path::{Path, PathBuf};

pub use npy::StoredEmbeddings;

/// A named file in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Raw,
    Cleaned,
    Mentions,
    Embeddings,
    Topics,
    TopicInfo,
    Clusters,
    Sentiments,
    Results,
}

impl Artifact {
    pub const ALL: [Artifact; 9] = [
        Artifact::Raw,
        Artifact::Cleaned,
        Artifact::Mentions,
        Artifact::Embeddings,
        Artifact::Topics,
        Artifact::TopicInfo,
        Artifact::Clusters,
        Artifact::Sentiments,
        Artifact::Results,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Raw => "raw_data.csv",
            Artifact::Cleaned => "cleaned.csv",
            Artifact::Mentions => "mentions.json",
            Artifact::Embeddings => "embeddings.npy",
            Artifact::Topics => "topics.csv",
            Artifact::TopicInfo => "topic_info.json",
            Artifact::Clusters => "clusters.csv",
            Artifact::Sentiments => "sentiments.csv",
            Artifact::Results => "results.csv",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// The directory holding every pipeline artifact.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.root.join(artifact.file_name())
    }

    /// Whether an artifact exists. Embeddings need their id sidecar too.
    pub fn exists(&self, artifact: Artifact) -> bool {
        let path = self.path(artifact);
        match artifact {
            Artifact::Embeddings => path.exists() && npy::ids_path(&path).exists(),
            _ => path.exists(),
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".pipeline.lock")
    }
}
