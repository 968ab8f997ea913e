// Per-document sentiment and location scoring.
//
// Each document is independent, so documents are scored concurrently with a
// bounded number in flight. Completion order is arbitrary; results are put
// back in input order before they are returned.

use std::collections::BTreeSet;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::entities::EntityTagger;
use super::semaxis::SemAxis;
use super::traits::{signed_score, PolarityClassifier};
use crate::error::PipelineError;
use crate::models::{CleanedDocument, ScoredDocument};
use crate::text::Gazetteer;

pub struct SentimentScorer<'a> {
    pub classifier: &'a dyn PolarityClassifier,
    pub tagger: &'a dyn EntityTagger,
    pub gazetteer: &'a Gazetteer,
    pub semaxis: Option<&'a SemAxis>,
    /// Documents in flight at once.
    pub concurrency: usize,
}

impl SentimentScorer<'_> {
    /// Tagger spans over the raw text, unioned with gazetteer hits over the
    /// cleaned (pre-lemmatization) text.
    pub fn locations(&self, doc: &CleanedDocument) -> BTreeSet<String> {
        let mut found: BTreeSet<String> = self
            .tagger
            .locations(&doc.raw_text, doc.language)
            .into_iter()
            .collect();
        found.extend(self.gazetteer.find(&doc.raw_cleaned_text));
        found
    }

    pub async fn score_one(
        &self,
        doc: &CleanedDocument,
        embedding: Option<&[f32]>,
    ) -> Result<ScoredDocument> {
        let polarity = self.classifier.classify(&doc.raw_cleaned_text).await?;
        let semaxis = match (self.semaxis, embedding) {
            (Some(axis), Some(e)) => axis.score(e, doc.language),
            _ => None,
        };

        Ok(ScoredDocument {
            id: doc.id.clone(),
            score: signed_score(&polarity),
            label: polarity.label,
            locations: self.locations(doc),
            semaxis,
        })
    }

    /// Score every document, returning results in input order.
    ///
    /// `embeddings`, when given, must be row-aligned with `docs`.
    pub async fn score_all(
        &self,
        docs: &[CleanedDocument],
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Vec<ScoredDocument>> {
        if let Some(e) = embeddings {
            if e.len() != docs.len() {
                return Err(PipelineError::Misaligned {
                    left: "cleaned".into(),
                    right: "embeddings".into(),
                    detail: format!("{} documents, {} embeddings", docs.len(), e.len()),
                }
                .into());
            }
        }

        let pb = ProgressBar::new(docs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Scoring [{bar:30}] {pos}/{len} ({eta})")
                .expect("valid template"),
        );

        let futures: Vec<_> = docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let embedding = embeddings.map(|e| e[i].as_slice());
                let pb = &pb;
                async move {
                    let result = self.score_one(doc, embedding).await;
                    pb.inc(1);
                    (i, result)
                }
            })
            .collect();
        let mut results: Vec<(usize, Result<ScoredDocument>)> =
            stream::iter(futures)
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;

        pb.finish_and_clear();

        results.sort_by_key(|(i, _)| *i);
        let scored = results
            .into_iter()
            .map(|(_, r)| r)
            .collect::<Result<Vec<_>>>()?;

        let negative = scored.iter().filter(|s| s.score < 0.0).count();
        let positive = scored.iter().filter(|s| s.score > 0.0).count();
        info!(
            documents = scored.len(),
            positive,
            negative,
            with_locations = scored.iter().filter(|s| !s.locations.is_empty()).count(),
            "Scored sentiment and locations"
        );

        Ok(scored)
    }
}
