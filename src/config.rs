use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Which implementation backs a model-driven stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Use the ONNX model when its files are present, otherwise the builtin.
    Auto,
    /// Require the ONNX model — fail if it hasn't been downloaded.
    Onnx,
    /// Always use the in-process builtin (hashing embedder / lexicon classifier).
    Builtin,
}

impl ModelBackend {
    fn from_env(key: &str) -> Self {
        match env::var(key).as_deref() {
            Ok("onnx") => ModelBackend::Onnx,
            Ok("builtin") | Ok("hashing") | Ok("lexicon") => ModelBackend::Builtin,
            _ => ModelBackend::Auto,
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default, so an empty environment runs the pipeline against
/// `./data` with the builtin models.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding raw_data.csv and every derived artifact.
    pub data_dir: PathBuf,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    pub bind: String,
    pub port: u16,
    pub embedder_backend: ModelBackend,
    pub classifier_backend: ModelBackend,
    /// Phrase detector: minimum joint occurrences for a collocation.
    pub phrase_min_count: u32,
    /// Phrase detector: cohesion score a pair must exceed.
    pub phrase_threshold: f64,
    /// Topic model: cosine similarity needed to join a topic.
    pub topic_threshold: f32,
    /// Topic model: groups smaller than this become outliers.
    pub min_topic_size: usize,
    /// Keywords kept per topic / cluster.
    pub top_keywords: usize,
    /// Requested k for centroid clustering.
    pub clusters: usize,
    /// Documents scored in parallel.
    pub concurrency: usize,
    /// Optional newline-separated list of place names; builtin list if unset.
    pub gazetteer_path: Option<PathBuf>,
    /// Alias table as `alias=canonical` pairs.
    pub aliases: Vec<(String, String)>,
    /// Source tag for raw rows that don't carry one.
    pub default_source: String,
    /// LibreTranslate-compatible endpoint for keyword translation.
    pub translate_url: Option<String>,
    pub translate_target: String,
    /// Fail the whole batch on a malformed row instead of skipping it.
    pub strict: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let data_dir = env::var("TI_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let model_dir = env::var("TI_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::download::default_model_dir());

        let aliases = match env::var("TI_ALIASES") {
            Ok(raw) => parse_aliases(&raw)?,
            Err(_) => crate::text::normalizer::default_aliases(),
        };

        Ok(Self {
            data_dir,
            model_dir,
            bind: env::var("TI_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("TI_PORT", 8000)?,
            embedder_backend: ModelBackend::from_env("TI_EMBEDDER"),
            classifier_backend: ModelBackend::from_env("TI_CLASSIFIER"),
            phrase_min_count: env_parse("TI_PHRASE_MIN_COUNT", 5)?,
            phrase_threshold: env_parse("TI_PHRASE_THRESHOLD", 10.0)?,
            topic_threshold: env_parse("TI_TOPIC_THRESHOLD", 0.6)?,
            min_topic_size: env_parse("TI_MIN_TOPIC_SIZE", 3)?,
            top_keywords: env_parse("TI_TOP_KEYWORDS", 10)?,
            clusters: env_parse("TI_CLUSTERS", 6)?,
            concurrency: env_parse::<usize>("TI_CONCURRENCY", 8)?.max(1),
            gazetteer_path: env::var("TI_GAZETTEER").ok().map(PathBuf::from),
            aliases,
            default_source: env::var("TI_SOURCE_TAG").unwrap_or_else(|_| "T".to_string()),
            translate_url: env::var("TI_TRANSLATE_URL").ok().filter(|s| !s.is_empty()),
            translate_target: env::var("TI_TRANSLATE_TARGET").unwrap_or_else(|_| "en".to_string()),
            strict: matches!(env::var("TI_STRICT").as_deref(), Ok("1") | Ok("true")),
        })
    }

    /// Configuration rooted at `data_dir` with every other value at its default.
    /// Used by tests and by callers that don't read the environment.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_dir: crate::download::default_model_dir(),
            bind: "127.0.0.1".to_string(),
            port: 8000,
            embedder_backend: ModelBackend::Builtin,
            classifier_backend: ModelBackend::Builtin,
            phrase_min_count: 5,
            phrase_threshold: 10.0,
            topic_threshold: 0.6,
            min_topic_size: 3,
            top_keywords: 10,
            clusters: 6,
            concurrency: 8,
            gazetteer_path: None,
            aliases: crate::text::normalizer::default_aliases(),
            default_source: "T".to_string(),
            translate_url: None,
            translate_target: "en".to_string(),
            strict: false,
        }
    }

    /// Check that the ONNX models are present when a backend requires them.
    pub fn require_models(&self) -> Result<()> {
        if self.embedder_backend == ModelBackend::Onnx
            && !crate::download::embedding_files_present(&self.model_dir)
        {
            anyhow::bail!(
                "Embedding model not found in {}\n\
                 Run `transit-insight download-model` to download it,\n\
                 or set TI_EMBEDDER=builtin to use the hashing embedder.",
                self.model_dir.display()
            );
        }
        if self.classifier_backend == ModelBackend::Onnx
            && !crate::download::sentiment_files_present(&self.model_dir)
        {
            anyhow::bail!(
                "Sentiment model not found in {}\n\
                 Run `transit-insight download-model` to download it,\n\
                 or set TI_CLASSIFIER=builtin to use the lexicon classifier.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}

/// Parse `alias=canonical` pairs separated by commas.
pub fn parse_aliases(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((alias, canonical)) if !alias.trim().is_empty() => Ok((
                alias.trim().to_lowercase(),
                canonical.trim().to_lowercase(),
            )),
            _ => anyhow::bail!("Invalid alias entry {pair:?}, expected alias=canonical"),
        })
        .collect()
}
