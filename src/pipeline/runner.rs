// Pipeline runner — shared model resources plus stage execution.
//
// Models are loaded once into `Resources` and borrowed by every stage, both
// from the CLI and from the web server. The runner checks a stage's inputs
// exist, holds the data-directory lock for the whole run, and executes the
// requested stages in order.

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{clean, embed, group, merge, score, PipelineLock, Stage};
use crate::config::{Config, ModelBackend};
use crate::download::{
    embedding_files_present, embedding_model_dir, sentiment_files_present, sentiment_model_dir,
};
use crate::embeddings::{Embedder, HashingEmbedder, SentenceEmbedder};
use crate::error::PipelineError;
use crate::sentiment::{
    EntityTagger, LexiconClassifier, OnnxPolarityClassifier, PolarityClassifier,
    RuleEntityTagger, SemAxis,
};
use crate::store::DataDir;
use crate::text::{Gazetteer, LexiconAnnotator, LinguisticAnnotator, Normalizer, PhraseDetector};
use crate::topics::{LibreTranslateClient, Translator};

/// Models and lookup tables used by the stages, built once per process.
pub struct Resources {
    pub normalizer: Normalizer,
    pub annotator: Box<dyn LinguisticAnnotator>,
    pub phrases: PhraseDetector,
    pub embedder: Box<dyn Embedder>,
    pub classifier: Box<dyn PolarityClassifier>,
    pub tagger: Box<dyn EntityTagger>,
    pub gazetteer: Gazetteer,
    /// None when no translation endpoint is configured.
    pub translator: Option<Box<dyn Translator>>,
    /// None when the seed axis could not be built.
    pub semaxis: Option<SemAxis>,
}

impl Resources {
    /// Build every resource the configuration asks for.
    ///
    /// `Auto` backends fall back to the builtin implementation when model
    /// files are missing; `Onnx` backends fail instead.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.require_models()?;

        let gazetteer = Gazetteer::from_config(config.gazetteer_path.as_deref())?;

        // Multi-word places and alias targets survive annotation as one token.
        let mut entities = gazetteer.multiword_names();
        entities.extend(
            config
                .aliases
                .iter()
                .map(|(_, canonical)| canonical.replace('_', " "))
                .filter(|c| c.contains(' ')),
        );

        let embedder = load_embedder(config)?;
        let classifier = load_classifier(config)?;

        let semaxis = match SemAxis::build(embedder.as_ref()).await {
            Ok(axis) => Some(axis),
            Err(e) => {
                warn!(error = %e, "Failed to build SemAxis poles, semaxis column will be empty");
                None
            }
        };

        let translator: Option<Box<dyn Translator>> = config
            .translate_url
            .as_deref()
            .map(|url| Box::new(LibreTranslateClient::new(url)) as Box<dyn Translator>);

        info!(
            embedder = embedder.name(),
            places = gazetteer.len(),
            translation = translator.is_some(),
            "Pipeline resources ready"
        );

        Ok(Self {
            normalizer: Normalizer::new(&config.aliases),
            annotator: Box::new(LexiconAnnotator::new(&entities)),
            phrases: PhraseDetector::new(config.phrase_min_count, config.phrase_threshold),
            embedder,
            classifier,
            tagger: Box::new(RuleEntityTagger),
            gazetteer,
            translator,
            semaxis,
        })
    }
}

fn load_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    let use_onnx = match config.embedder_backend {
        ModelBackend::Onnx => true,
        ModelBackend::Builtin => false,
        ModelBackend::Auto => embedding_files_present(&config.model_dir),
    };
    if use_onnx {
        let embedder = SentenceEmbedder::load(&embedding_model_dir(&config.model_dir))?;
        Ok(Box::new(embedder))
    } else {
        Ok(Box::new(HashingEmbedder::default()))
    }
}

fn load_classifier(config: &Config) -> Result<Box<dyn PolarityClassifier>> {
    let use_onnx = match config.classifier_backend {
        ModelBackend::Onnx => true,
        ModelBackend::Builtin => false,
        ModelBackend::Auto => sentiment_files_present(&config.model_dir),
    };
    if use_onnx {
        let classifier = OnnxPolarityClassifier::load(&sentiment_model_dir(&config.model_dir))?;
        Ok(Box::new(classifier))
    } else {
        Ok(Box::new(LexiconClassifier::new()?))
    }
}

/// What a finished stage produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    /// Rows written to the stage's main table.
    pub documents: usize,
    /// Distinct topics or clusters, for the grouping stages.
    pub groups: Option<usize>,
}

impl StageReport {
    pub fn new(stage: Stage, documents: usize) -> Self {
        Self {
            stage,
            documents,
            groups: None,
        }
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = Some(groups);
        self
    }
}

/// Runs stages against one data directory.
pub struct PipelineRunner<'a> {
    config: &'a Config,
    resources: &'a Resources,
    data: DataDir,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(config: &'a Config, resources: &'a Resources) -> Self {
        Self {
            config,
            resources,
            data: DataDir::new(&config.data_dir),
        }
    }

    pub fn data_dir(&self) -> &DataDir {
        &self.data
    }

    /// Fail with `MissingInput` naming the first required artifact that is absent.
    pub fn check_preconditions(&self, stage: Stage) -> Result<()> {
        for artifact in stage.requires() {
            if !self.data.exists(*artifact) {
                return Err(PipelineError::missing(self.data.path(*artifact)).into());
            }
        }
        Ok(())
    }

    /// Run one stage under the pipeline lock.
    pub async fn run_stage(&self, stage: Stage) -> Result<StageReport> {
        let mut reports = self.run(&[stage]).await?;
        reports
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Stage '{stage}' produced no report"))
    }

    /// Run every stage in order.
    pub async fn run_all(&self) -> Result<Vec<StageReport>> {
        self.run(&Stage::ALL).await
    }

    /// Run `stages` in the given order, holding the lock throughout.
    ///
    /// Each stage's preconditions are checked just before it runs, so a stage
    /// may depend on artifacts written earlier in the same run.
    pub async fn run(&self, stages: &[Stage]) -> Result<Vec<StageReport>> {
        self.run_with_progress(stages, |_| async {}).await
    }

    /// Like [`run`](Self::run), awaiting `on_stage` before each stage starts.
    ///
    /// The lock is held across the callbacks too, so a caller reporting
    /// progress never lets another run in between stages.
    pub async fn run_with_progress<F, Fut>(
        &self,
        stages: &[Stage],
        mut on_stage: F,
    ) -> Result<Vec<StageReport>>
    where
        F: FnMut(Stage) -> Fut,
        Fut: Future<Output = ()>,
    {
        let _lock = PipelineLock::acquire(&self.data.lock_path())?;

        let mut reports = Vec::with_capacity(stages.len());
        for &stage in stages {
            on_stage(stage).await;
            self.check_preconditions(stage)?;

            let started = Instant::now();
            info!(stage = %stage, "Running stage");
            let report = self
                .execute(stage)
                .await
                .with_context(|| format!("Stage '{stage}' failed"))?;

            info!(
                stage = %stage,
                documents = report.documents,
                groups = report.groups,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Stage complete"
            );
            reports.push(report);
        }
        Ok(reports)
    }

    async fn execute(&self, stage: Stage) -> Result<StageReport> {
        let (data, config, resources) = (&self.data, self.config, self.resources);
        match stage {
            Stage::Clean => clean::run(data, config, resources),
            Stage::Embed => embed::run(data, resources).await,
            Stage::Topics => group::run_topics(data, config, resources).await,
            Stage::Cluster => group::run_clusters(data, config),
            Stage::Score => score::run(data, config, resources).await,
            Stage::Merge => merge::run(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_input_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path());
        let resources = Resources::from_config(&config).await.unwrap();
        let runner = PipelineRunner::new(&config, &resources);

        let err = runner.run_stage(Stage::Embed).await.unwrap_err();
        match crate::error::find_pipeline_error(&err) {
            Some(PipelineError::MissingInput { path }) => {
                assert!(path.ends_with("cleaned.csv"));
            }
            other => panic!("expected MissingInput, got {other:?}"),
        }
        assert!(!runner.data_dir().lock_path().exists());
    }

    #[tokio::test]
    async fn test_busy_when_lock_held() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path());
        let resources = Resources::from_config(&config).await.unwrap();
        let runner = PipelineRunner::new(&config, &resources);

        let _held = PipelineLock::acquire(&runner.data_dir().lock_path()).unwrap();
        let err = runner.run_stage(Stage::Clean).await.unwrap_err();
        assert!(matches!(
            crate::error::find_pipeline_error(&err),
            Some(PipelineError::Busy { .. })
        ));
    }

    #[tokio::test]
    async fn test_lock_held_between_stages() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path());
        let resources = Resources::from_config(&config).await.unwrap();
        let runner = PipelineRunner::new(&config, &resources);
        std::fs::write(
            runner.data_dir().path(crate::store::Artifact::Raw),
            "1,El tren va lento en Tacuba,ana,2024-05-01T08:00:00\n",
        )
        .unwrap();

        let lock = runner.data_dir().lock_path();
        let mut seen = Vec::new();
        let reports = runner
            .run_with_progress(&[Stage::Clean, Stage::Embed, Stage::Score], |stage| {
                // Another run trying to start mid-pipeline must be turned away.
                let busy = PipelineLock::acquire(&lock).is_err();
                seen.push((stage, busy));
                async {}
            })
            .await
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(
            seen,
            vec![(Stage::Clean, true), (Stage::Embed, true), (Stage::Score, true)]
        );
        assert!(!lock.exists());
    }

    #[tokio::test]
    async fn test_builtin_resources() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path());
        let resources = Resources::from_config(&config).await.unwrap();
        assert_eq!(resources.embedder.name(), "hashing");
        assert!(resources.translator.is_none());
        assert!(resources.semaxis.is_some());
    }
}
