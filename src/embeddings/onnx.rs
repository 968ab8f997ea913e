// Multilingual sentence embedder (paraphrase-multilingual-MiniLM-L12-v2).
//
// Posts are Spanish and German, so the model has to place "retraso" and
// "Verspätung" near each other. The multilingual MiniLM does that in 384
// dimensions. Token embeddings are mean-pooled under the attention mask,
// the same pooling the model was trained with.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use super::traits::Embedder;

/// Embedding width of the multilingual MiniLM.
pub const EMBEDDING_DIM: usize = 384;

/// The model was trained on sequences of at most 128 tokens.
const MAX_TOKENS: usize = 128;

/// Sentence embedder backed by a local ONNX model.
///
/// `ort::Session::run` needs `&mut self` and `spawn_blocking` needs `'static`,
/// hence the `Arc<Mutex<Session>>`.
pub struct SentenceEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    pad_id: i64,
}

impl SentenceEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Embedding model file not found: {}\nRun `transit-insight download-model` to download it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!("Failed to load embedding model from {}", model_path.display())
            })?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // XLM-R vocabularies pad with 1, BERT ones with 0.
        let pad_id = tokenizer
            .token_to_id("<pad>")
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0) as i64;

        debug!(model_dir = %model_dir.display(), pad_id, "Loaded sentence embedding model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            pad_id,
        })
    }
}

#[async_trait]
impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn name(&self) -> &str {
        "paraphrase-multilingual-MiniLM-L12-v2"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let pad_id = self.pad_id;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || embed_sync(&session, &tokenizer, pad_id, &texts))
            .await
            .context("spawn_blocking panicked")?
    }
}

/// Tokenize, run inference and mean-pool. Runs on a blocking thread.
fn embed_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    pad_id: i64,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let encodings: Vec<_> = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let batch_size = encodings.len();
    let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

    if max_len == 0 {
        return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
    }

    let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);

    for enc in &encodings {
        let ids = enc.get_ids();
        let pad_len = max_len - ids.len();

        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat_n(pad_id, pad_len));
        attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
        attention_mask.extend(std::iter::repeat_n(0i64, pad_len));
    }

    let shape = [batch_size as i64, max_len as i64];
    let input_ids_tensor =
        Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask.clone()))
        .context("Failed to create attention_mask tensor")?;
    let token_type_ids_tensor = Tensor::from_array((shape, vec![0i64; batch_size * max_len]))
        .context("Failed to create token_type_ids tensor")?;

    // last_hidden_state: [batch, seq_len, 384]
    let hidden = {
        let mut session = session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            })
            .context("Embedding ONNX inference failed")?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract embedding output tensor")?;

        data.to_vec()
    };

    Ok(mean_pool(&hidden, &attention_mask, batch_size, max_len))
}

/// Average token vectors weighted by the attention mask.
fn mean_pool(hidden: &[f32], mask: &[i64], batch_size: usize, max_len: usize) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0_f32; EMBEDDING_DIM];
        let mut mask_sum = 0.0_f32;

        for j in 0..max_len {
            let m = mask[i * max_len + j] as f32;
            if m > 0.0 {
                mask_sum += m;
                let offset = (i * max_len + j) * EMBEDDING_DIM;
                for (k, s) in sum.iter_mut().enumerate() {
                    *s += hidden[offset + k] * m;
                }
            }
        }

        if mask_sum > 0.0 {
            for s in &mut sum {
                *s /= mask_sum;
            }
        }
        embeddings.push(sum);
    }

    embeddings
}
