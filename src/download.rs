// Model download helper for the ONNX models.
//
// Fetches two models from HuggingFace:
// 1. paraphrase-multilingual-MiniLM-L12-v2 — sentence embeddings (~118MB quantized)
// 2. twitter-xlm-roberta-base-sentiment — polarity (~280MB quantized)
//
// Files land in a platform data directory
// (~/.local/share/transit-insight/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// A model as hosted on HuggingFace and as laid out locally.
struct ModelSpec {
    /// Human-readable name, also the local subdirectory.
    name: &'static str,
    base_url: &'static str,
    /// (remote path, local file name, approximate size for the prompt)
    files: &'static [(&'static str, &'static str, Option<&'static str>)],
}

const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: "paraphrase-multilingual-MiniLM-L12-v2",
    base_url: "https://huggingface.co/Xenova/paraphrase-multilingual-MiniLM-L12-v2/resolve/main",
    files: &[
        ("tokenizer.json", "tokenizer.json", None),
        ("onnx/model_quantized.onnx", "model.onnx", Some("~118 MB")),
    ],
};

const SENTIMENT_MODEL: ModelSpec = ModelSpec {
    name: "twitter-xlm-roberta-base-sentiment",
    base_url: "https://huggingface.co/Xenova/twitter-xlm-roberta-base-sentiment/resolve/main",
    files: &[
        ("tokenizer.json", "tokenizer.json", None),
        ("onnx/model_quantized.onnx", "model_quantized.onnx", Some("~280 MB")),
    ],
};

/// Default directory for model files: the platform data directory.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("transit-insight")
        .join("models")
}

pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(EMBEDDING_MODEL.name)
}

pub fn sentiment_model_dir(base: &Path) -> PathBuf {
    base.join(SENTIMENT_MODEL.name)
}

fn files_present(spec: &ModelSpec, base: &Path) -> bool {
    let dir = base.join(spec.name);
    spec.files.iter().all(|(_, local, _)| dir.join(local).exists())
}

pub fn embedding_files_present(base: &Path) -> bool {
    files_present(&EMBEDDING_MODEL, base)
}

pub fn sentiment_files_present(base: &Path) -> bool {
    files_present(&SENTIMENT_MODEL, base)
}

/// Download both models into `dir`, skipping files that already exist.
pub async fn download_model(dir: &Path) -> Result<()> {
    for spec in [&EMBEDDING_MODEL, &SENTIMENT_MODEL] {
        download_spec(spec, dir).await?;
    }
    Ok(())
}

async fn download_spec(spec: &ModelSpec, base: &Path) -> Result<()> {
    let dir = base.join(spec.name);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\n{}:", spec.name);

    for (remote, local, size) in spec.files {
        let dest = dir.join(local);
        if dest.exists() {
            info!(file = local, model = spec.name, "Model file already exists, skipping");
            println!("  {} (already exists)", local);
            continue;
        }

        match size {
            Some(size) => println!("  Downloading {} ({})...", local, size),
            None => println!("  Downloading {}...", local),
        }
        download_file(&format!("{}/{}", spec.base_url, remote), &dest, size.is_some()).await?;
    }
    Ok(())
}

/// Download a single file, optionally with a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = show_progress.then(|| match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    });

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    // Write under a temporary name so an interrupted download never looks complete.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!(url, dest = %dest.display(), "Downloaded model file");
    Ok(())
}
