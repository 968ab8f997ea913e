// transit-insight: topic, sentiment and location analytics for public
// transport posts.
//
// This is the library root. Modules follow the pipeline: text cleaning,
// embeddings, grouping, scoring, then the artifact store and the API
// surfaces that read it.

pub mod config;
pub mod download;
pub mod embeddings;
pub mod error;
pub mod insights;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod sentiment;
pub mod status;
pub mod store;
pub mod text;
pub mod topics;

#[cfg(feature = "web")]
pub mod web;
