// Local ONNX sentiment classifier (twitter-xlm-roberta-base-sentiment).
//
// A multilingual RoBERTa fine-tuned on tweets, covering Spanish and German.
// It emits three logits (negative, neutral, positive); softmax gives the
// confidence of the winning label.
//
// Model: Xenova/twitter-xlm-roberta-base-sentiment (quantized ONNX export)

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use super::traits::{Polarity, PolarityClassifier, NEGATIVE, NEUTRAL, POSITIVE};

/// Output order of the model's logits.
const LABEL_ORDER: [&str; 3] = [NEGATIVE, NEUTRAL, POSITIVE];

/// XLM-R position embeddings allow 512 tokens.
const MAX_TOKENS: usize = 512;

/// RoBERTa pad token id.
const PAD_ID: i64 = 1;

pub struct OnnxPolarityClassifier {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxPolarityClassifier {
    /// Load `model_quantized.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model_quantized.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Sentiment model file not found: {}\nRun `transit-insight download-model` to download it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load sentiment model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load sentiment tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        debug!(model_dir = %model_dir.display(), "Loaded ONNX sentiment model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl PolarityClassifier for OnnxPolarityClassifier {
    async fn classify(&self, text: &str) -> Result<Polarity> {
        let mut results = self.classify_batch(&[text.to_string()]).await?;
        results
            .pop()
            .context("Sentiment model returned no result")
    }

    /// One forward pass for the whole batch, on a blocking thread.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Polarity>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let encodings: Vec<_> = texts
                .iter()
                .map(|t| {
                    tokenizer
                        .encode(t.as_str(), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0).max(1);

            let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            for enc in &encodings {
                let ids = enc.get_ids();
                let pad_len = max_len - ids.len();
                input_ids.extend(ids.iter().map(|&id| id as i64));
                input_ids.extend(std::iter::repeat_n(PAD_ID, pad_len));
                attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
                attention_mask.extend(std::iter::repeat_n(0i64, pad_len));
            }

            let shape = [batch_size as i64, max_len as i64];
            let input_ids_tensor = Tensor::from_array((shape, input_ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
                .context("Failed to create attention_mask tensor")?;

            // [batch, 3] raw logits
            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;
                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("Sentiment ONNX inference failed")?;
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract sentiment logits")?;
                data.to_vec()
            };

            let results: Vec<Polarity> = logits
                .chunks(LABEL_ORDER.len())
                .zip(&texts)
                .map(|(row, text)| {
                    let polarity = polarity_from_logits(row);
                    debug!(
                        label = %polarity.label,
                        confidence = polarity.confidence,
                        text_preview = %crate::output::truncate_chars(text, 50),
                        "Classified text"
                    );
                    polarity
                })
                .collect();

            Ok(results)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn polarity_from_logits(row: &[f32]) -> Polarity {
    let probs = softmax(row);
    let (best, confidence) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((1, 0.0));
    Polarity::new(LABEL_ORDER.get(best).copied().unwrap_or(NEUTRAL), confidence)
}
