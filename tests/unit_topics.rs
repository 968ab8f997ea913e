// Unit tests for grouping and the embedding store.
//
// Properties that must hold for any corpus: one label per document, topic
// numbering by size, outliers carrying no probability, and embeddings that
// stay attached to their document ids across a save and load.

use std::collections::BTreeMap;

use transit_insight::embeddings::HashingEmbedder;
use transit_insight::error::{find_pipeline_error, PipelineError};
use transit_insight::models::OUTLIER_TOPIC;
use transit_insight::store::npy::{ids_path, StoredEmbeddings};
use transit_insight::topics::{group, DensityTopicModel, Grouper, KMeans};

fn corpus() -> Vec<String> {
    [
        "retraso linea tres metro",
        "retraso linea tres otra vez",
        "linea tres retraso enorme",
        "metro sucio estacion pantitlan",
        "estacion pantitlan sucia",
        "estacion pantitlan muy sucia",
        "bahn verspaetung wieder",
        "bahn verspaetung heute",
        "concierto parque",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn embed(texts: &[String]) -> Vec<Vec<f32>> {
    let embedder = HashingEmbedder::default();
    texts.iter().map(|t| embedder.embed_one(t)).collect()
}

fn sizes(labels: &[i64]) -> BTreeMap<i64, usize> {
    let mut out = BTreeMap::new();
    for &l in labels {
        *out.entry(l).or_insert(0) += 1;
    }
    out
}

// ============================================================
// DensityTopicModel
// ============================================================

#[test]
fn density_labels_every_document() {
    let embeddings = embed(&corpus());
    for threshold in [0.2, 0.4, 0.6, 0.8] {
        let a = DensityTopicModel::new(threshold, 2).assign(&embeddings).unwrap();
        assert_eq!(a.labels.len(), embeddings.len());
        assert_eq!(a.probabilities.as_ref().map(Vec::len), Some(embeddings.len()));
        assert!(a.labels.iter().all(|&l| l == OUTLIER_TOPIC || l >= 0));
    }
}

#[test]
fn density_topics_numbered_by_size() {
    let embeddings = embed(&corpus());
    for threshold in [0.2, 0.4, 0.6] {
        let a = DensityTopicModel::new(threshold, 2).assign(&embeddings).unwrap();
        let topic_sizes: Vec<usize> = sizes(&a.labels)
            .into_iter()
            .filter(|(l, _)| *l != OUTLIER_TOPIC)
            .map(|(_, n)| n)
            .collect();

        // Labels are contiguous from 0.
        let max_label = a.labels.iter().copied().max().unwrap_or(OUTLIER_TOPIC);
        assert_eq!(topic_sizes.len() as i64, max_label + 1);
        assert!(topic_sizes.windows(2).all(|w| w[0] >= w[1]), "{topic_sizes:?}");
        assert!(topic_sizes.iter().all(|&n| n >= 2));
    }
}

#[test]
fn density_outliers_have_zero_probability() {
    let embeddings = embed(&corpus());
    let a = DensityTopicModel::new(0.5, 3).assign(&embeddings).unwrap();
    let probs = a.probabilities.unwrap();
    for (label, p) in a.labels.iter().zip(&probs) {
        assert!((0.0..=1.0).contains(p));
        if *label == OUTLIER_TOPIC {
            assert_eq!(*p, 0.0);
        }
    }
}

#[test]
fn min_topic_size_larger_than_corpus_gives_only_outliers() {
    let embeddings = embed(&corpus());
    let a = DensityTopicModel::new(0.1, 100).assign(&embeddings).unwrap();
    assert!(a.labels.iter().all(|&l| l == OUTLIER_TOPIC));
}

// ============================================================
// KMeans
// ============================================================

#[test]
fn kmeans_labels_within_k() {
    let embeddings = embed(&corpus());
    for k in [1, 2, 4, 20] {
        let a = KMeans::new(k).assign(&embeddings).unwrap();
        let bound = k.min(embeddings.len()) as i64;
        assert_eq!(a.labels.len(), embeddings.len());
        assert!(a.labels.iter().all(|&l| (0..bound).contains(&l)), "k={k}");
        assert!(a.probabilities.is_none());
    }
}

#[test]
fn kmeans_single_cluster() {
    let a = KMeans::new(1).assign(&embed(&corpus())).unwrap();
    assert!(a.labels.iter().all(|&l| l == 0));
}

// ============================================================
// group — summaries over any grouper
// ============================================================

#[test]
fn summaries_account_for_every_document() {
    let texts = corpus();
    let embeddings = embed(&texts);
    let groupers: Vec<Box<dyn Grouper>> = vec![
        Box::new(DensityTopicModel::new(0.3, 2)),
        Box::new(KMeans::new(3)),
    ];

    for grouper in &groupers {
        let grouping = group(grouper.as_ref(), "test", &texts, &embeddings, 4).unwrap();
        let total: usize = grouping.summaries.iter().map(|s| s.size).sum();
        assert_eq!(total, texts.len(), "{}", grouper.name());

        for summary in &grouping.summaries {
            assert!(summary.keywords.len() <= 4);
            let rep = summary.representative.as_deref().unwrap();
            let row = texts.iter().position(|t| t == rep).unwrap();
            assert_eq!(grouping.labels[row], summary.topic);
        }
    }
}

#[test]
fn topic_count_excludes_outliers() {
    let texts = corpus();
    let embeddings = embed(&texts);
    let grouping = group(&DensityTopicModel::new(0.5, 3), "topics", &texts, &embeddings, 5).unwrap();
    let distinct = sizes(&grouping.labels)
        .keys()
        .filter(|&&l| l != OUTLIER_TOPIC)
        .count();
    assert_eq!(grouping.topic_count(), distinct);
}

#[test]
fn group_rejects_misaligned_input() {
    let texts = corpus();
    let embeddings = embed(&texts[..3]);
    let err = group(&KMeans::new(2), "cluster", &texts, &embeddings, 5).unwrap_err();
    assert!(matches!(
        find_pipeline_error(&err),
        Some(PipelineError::Misaligned { .. })
    ));
}

#[test]
fn group_rejects_empty_input() {
    let err = group(&DensityTopicModel::default(), "topics", &[], &[], 5).unwrap_err();
    assert!(matches!(
        find_pipeline_error(&err),
        Some(PipelineError::EmptyCorpus { .. })
    ));
}

// ============================================================
// StoredEmbeddings — .npy plus id sidecar
// ============================================================

#[test]
fn stored_embeddings_keep_ids_attached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.npy");
    let texts = corpus();
    let ids: Vec<String> = (1..=texts.len()).map(|i| format!("doc-{i}")).collect();
    let stored = StoredEmbeddings::new(ids.clone(), embed(&texts)).unwrap();
    stored.save(&path).unwrap();

    assert!(ids_path(&path).exists());
    let loaded = StoredEmbeddings::load(&path).unwrap();
    assert_eq!(loaded, stored);

    // A reversed id order gets the reversed rows.
    let reversed: Vec<String> = ids.iter().rev().cloned().collect();
    let aligned = loaded.aligned_to(&reversed).unwrap();
    assert_eq!(aligned[0], stored.vectors[texts.len() - 1]);
    assert_eq!(aligned[texts.len() - 1], stored.vectors[0]);
}

#[test]
fn unknown_id_is_misaligned() {
    let stored = StoredEmbeddings::new(vec!["a".into()], vec![vec![1.0, 0.0]]).unwrap();
    let err = stored.aligned_to(&["b".to_string()]).unwrap_err();
    assert!(matches!(
        find_pipeline_error(&err),
        Some(PipelineError::Misaligned { .. })
    ));
}

#[test]
fn missing_sidecar_is_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.npy");
    StoredEmbeddings::new(vec!["a".into()], vec![vec![0.5, 0.5]])
        .unwrap()
        .save(&path)
        .unwrap();
    std::fs::remove_file(ids_path(&path)).unwrap();

    let err = StoredEmbeddings::load(&path).unwrap_err();
    assert!(matches!(
        find_pipeline_error(&err),
        Some(PipelineError::MissingInput { .. })
    ));
}

#[test]
fn mismatched_widths_rejected() {
    let err = StoredEmbeddings::new(
        vec!["a".into(), "b".into()],
        vec![vec![1.0, 0.0], vec![1.0]],
    )
    .unwrap_err();
    assert!(matches!(
        find_pipeline_error(&err),
        Some(PipelineError::Misaligned { .. })
    ));
}
