// Pipeline error taxonomy.
//
// Most code propagates `anyhow::Result` with context, exactly like the rest of
// the crate. These typed variants exist for the failure classes callers need
// to tell apart: the web layer maps them to status codes, and the CLI prints
// a hint for missing inputs.

use std::path::PathBuf;

use thiserror::Error;

/// Typed failures raised by pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required artifact is absent. Fatal to the invoking stage.
    #[error("missing input file: {}", path.display())]
    MissingInput { path: PathBuf },

    /// A row with an unexpected shape. Only raised in strict mode; otherwise
    /// the row is skipped and logged.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// An external model or service call failed.
    #[error("{service} failed: {message}")]
    ExternalService { service: String, message: String },

    /// No documents survived filtering.
    #[error("no documents to process in stage '{stage}'")]
    EmptyCorpus { stage: String },

    /// Two artifacts that must describe the same documents disagree.
    #[error("{left} and {right} are misaligned: {detail}")]
    Misaligned {
        left: String,
        right: String,
        detail: String,
    },

    /// Another pipeline run holds the data directory.
    #[error("pipeline already running (lock held at {})", path.display())]
    Busy { path: PathBuf },
}

impl PipelineError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        PipelineError::MissingInput { path: path.into() }
    }

    pub fn empty(stage: &str) -> Self {
        PipelineError::EmptyCorpus {
            stage: stage.to_string(),
        }
    }
}

/// Find a `PipelineError` anywhere in an anyhow error chain.
pub fn find_pipeline_error(err: &anyhow::Error) -> Option<&PipelineError> {
    err.chain().find_map(|e| e.downcast_ref::<PipelineError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_find_pipeline_error_through_context() {
        let result: anyhow::Result<()> = Err(PipelineError::empty("topics").into());
        let err = result.context("running topics stage").unwrap_err();
        match find_pipeline_error(&err) {
            Some(PipelineError::EmptyCorpus { stage }) => assert_eq!(stage, "topics"),
            other => panic!("expected EmptyCorpus, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_input_message_names_path() {
        let err = PipelineError::missing("/data/raw_data.csv");
        assert!(err.to_string().contains("raw_data.csv"));
    }
}
