// Unit tests for sentiment and location scoring with the builtin
// classifier, tagger and gazetteer.

use transit_insight::embeddings::HashingEmbedder;
use transit_insight::models::{CleanedDocument, Language};
use transit_insight::sentiment::{
    signed_score, LexiconClassifier, NoEntities, Polarity, PolarityClassifier, RuleEntityTagger,
    SemAxis, SentimentScorer,
};
use transit_insight::text::gazetteer::DEFAULT_PLACES;
use transit_insight::text::{clean_raw, Gazetteer};

fn doc(id: &str, raw: &str, language: Language) -> CleanedDocument {
    let cleaned = clean_raw(Some(raw));
    CleanedDocument {
        id: id.into(),
        author: "user".into(),
        timestamp: "2024-05-01".into(),
        language,
        source_tag: "C".into(),
        raw_text: raw.into(),
        raw_cleaned_text: cleaned.clone(),
        normalized_text: cleaned,
    }
}

fn texts() -> Vec<&'static str> {
    vec![
        "El metro va muy sucio y lento",
        "Todo limpio y puntual hoy, excelente",
        "No es seguro viajar de noche",
        "Die Bahn war pünktlich und sauber",
        "Schon wieder Verspätung und überfüllt",
        "hoy tomé el metrobús",
        "",
    ]
}

// ============================================================
// Sign convention
// ============================================================

#[test]
fn signed_score_examples() {
    assert_eq!(signed_score(&Polarity::new("NEGATIVE", 0.82)), -0.82);
    assert_eq!(signed_score(&Polarity::new("POSITIVE", 0.91)), 0.91);
    assert_eq!(signed_score(&Polarity::new("NEUTRAL", 0.7)), 0.0);
}

#[tokio::test]
async fn lexicon_scores_stay_in_range_and_match_label() {
    let classifier = LexiconClassifier::new().unwrap();
    for text in texts() {
        let polarity = classifier.classify(text).await.unwrap();
        let score = signed_score(&polarity);
        assert!((-1.0..=1.0).contains(&score), "{text:?}: {score}");
        match polarity.label.as_str() {
            "NEGATIVE" => assert!(score < 0.0, "{text:?}"),
            "POSITIVE" => assert!(score > 0.0, "{text:?}"),
            _ => assert_eq!(score, 0.0, "{text:?}"),
        }
    }
}

#[tokio::test]
async fn lexicon_reads_both_languages() {
    let classifier = LexiconClassifier::new().unwrap();
    let es = classifier.classify("muy sucio y lento").await.unwrap();
    assert_eq!(es.label, "NEGATIVE");
    assert_eq!(signed_score(&es), -1.0);

    let de = classifier
        .classify("Schon wieder Verspätung und überfüllt")
        .await
        .unwrap();
    assert_eq!(de.label, "NEGATIVE");
}

#[tokio::test]
async fn batch_matches_single_calls() {
    let classifier = LexiconClassifier::new().unwrap();
    let owned: Vec<String> = texts().iter().map(|t| t.to_string()).collect();
    let batch = classifier.classify_batch(&owned).await.unwrap();
    for (text, verdict) in owned.iter().zip(&batch) {
        assert_eq!(&classifier.classify(text).await.unwrap(), verdict);
    }
}

// ============================================================
// Locations
// ============================================================

#[tokio::test]
async fn gazetteer_hit_without_tagger_spans() {
    let classifier = LexiconClassifier::new().unwrap();
    let gazetteer = Gazetteer::new(&["Pantitlán"]).unwrap();
    let scorer = SentimentScorer {
        classifier: &classifier,
        tagger: &NoEntities,
        gazetteer: &gazetteer,
        semaxis: None,
        concurrency: 1,
    };
    let d = doc("1", "Odio las estaciones sucias en Pantitlán.", Language::Spanish);
    let scored = scorer.score_one(&d, None).await.unwrap();
    assert_eq!(scored.locations.len(), 1);
    assert!(scored.locations.contains("Pantitlán"));
}

#[tokio::test]
async fn tagger_and_gazetteer_union() {
    let classifier = LexiconClassifier::new().unwrap();
    let gazetteer = Gazetteer::new(DEFAULT_PLACES).unwrap();
    let scorer = SentimentScorer {
        classifier: &classifier,
        tagger: &RuleEntityTagger,
        gazetteer: &gazetteer,
        semaxis: None,
        concurrency: 1,
    };
    let d = doc(
        "1",
        "Llevo una hora en Buenavista y el tren sigue sucio rumbo a Tacuba",
        Language::Spanish,
    );
    let scored = scorer.score_one(&d, None).await.unwrap();
    assert!(scored.locations.contains("Buenavista"), "{:?}", scored.locations);
    assert!(scored.locations.contains("Tacuba"), "{:?}", scored.locations);
    assert_eq!(scored.label, "NEGATIVE");
}

#[tokio::test]
async fn no_places_means_empty_set() {
    let classifier = LexiconClassifier::new().unwrap();
    let gazetteer = Gazetteer::new(&["Zócalo"]).unwrap();
    let scorer = SentimentScorer {
        classifier: &classifier,
        tagger: &RuleEntityTagger,
        gazetteer: &gazetteer,
        semaxis: None,
        concurrency: 1,
    };
    let d = doc("1", "todo bien hoy", Language::Spanish);
    assert!(scorer.score_one(&d, None).await.unwrap().locations.is_empty());
}

// ============================================================
// score_all
// ============================================================

#[tokio::test]
async fn score_all_keeps_input_order_at_any_concurrency() {
    let classifier = LexiconClassifier::new().unwrap();
    let gazetteer = Gazetteer::new(DEFAULT_PLACES).unwrap();
    let docs: Vec<CleanedDocument> = texts()
        .iter()
        .enumerate()
        .map(|(i, t)| doc(&format!("d{i}"), t, Language::Spanish))
        .collect();

    let mut previous = None;
    for concurrency in [1, 3, 16] {
        let scorer = SentimentScorer {
            classifier: &classifier,
            tagger: &RuleEntityTagger,
            gazetteer: &gazetteer,
            semaxis: None,
            concurrency,
        };
        let scored = scorer.score_all(&docs, None).await.unwrap();
        let ids: Vec<&str> = scored.iter().map(|s| s.id.as_str()).collect();
        let expected: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, expected);

        if let Some(prev) = previous.replace(scored.clone()) {
            assert_eq!(prev, scored);
        }
    }
}

#[tokio::test]
async fn semaxis_only_with_embeddings() {
    let classifier = LexiconClassifier::new().unwrap();
    let gazetteer = Gazetteer::new(DEFAULT_PLACES).unwrap();
    let embedder = HashingEmbedder::default();
    let axis = SemAxis::build(&embedder).await.unwrap();
    let scorer = SentimentScorer {
        classifier: &classifier,
        tagger: &NoEntities,
        gazetteer: &gazetteer,
        semaxis: Some(&axis),
        concurrency: 2,
    };

    let docs = vec![
        doc("es", "muy sucio y lento", Language::Spanish),
        doc("xx", "muy sucio y lento", Language::Unsupported),
    ];
    let embeddings: Vec<Vec<f32>> = docs
        .iter()
        .map(|d| embedder.embed_one(&d.normalized_text))
        .collect();

    let with = scorer.score_all(&docs, Some(&embeddings)).await.unwrap();
    assert!(with[0].semaxis.is_some());
    assert!(with[1].semaxis.is_none());

    let without = scorer.score_all(&docs, None).await.unwrap();
    assert!(without.iter().all(|s| s.semaxis.is_none()));
}
