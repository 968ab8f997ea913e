// Keyword translation for topic display.
//
// Topic keywords are Spanish or German lemmas; the dashboard shows them in a
// single target language. Translation is the one place where an external
// failure is tolerated: a keyword that cannot be translated is shown as-is.
//
// LibreTranslateClient speaks the LibreTranslate `/translate` API. Public
// instances throttle aggressively, so requests are spaced by a small
// interval limiter.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Trait for translating short strings.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the `target` language code.
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

/// Client for a LibreTranslate-compatible service.
pub struct LibreTranslateClient {
    client: Client,
    base_url: String,
    spacing: RequestSpacing,
}

impl LibreTranslateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            spacing: RequestSpacing::per_second(5.0),
        }
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        self.spacing.wait().await;

        let url = format!("{}/translate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TranslateRequest {
                q: text,
                source: "auto",
                target,
                format: "text",
            })
            .send()
            .await
            .map_err(|e| PipelineError::ExternalService {
                service: "translation".into(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::ExternalService {
                service: "translation".into(),
                message: format!("{status}: {body}"),
            }
            .into());
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse translation response")?;
        Ok(parsed.translated_text)
    }
}

/// Translate each keyword, keeping the original wherever translation fails.
pub async fn translate_keywords(
    translator: &dyn Translator,
    keywords: &[String],
    target: &str,
) -> Vec<String> {
    let mut out = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        // Merged tokens read better with spaces.
        let phrase = keyword.replace('_', " ");
        match translator.translate(&phrase, target).await {
            Ok(t) if !t.trim().is_empty() => out.push(t.trim().to_lowercase()),
            Ok(_) => out.push(keyword.clone()),
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Translation failed, keeping original");
                out.push(keyword.clone());
            }
        }
    }
    debug!(keywords = out.len(), target, "Translated keywords");
    out
}

/// Enforces a minimum gap between consecutive requests.
#[derive(Clone)]
struct RequestSpacing {
    gap: Duration,
    last: Arc<Mutex<Option<Instant>>>,
}

impl RequestSpacing {
    fn per_second(rate: f64) -> Self {
        Self {
            gap: Duration::from_secs_f64(1.0 / rate),
            last: Arc::new(Mutex::new(None)),
        }
    }

    async fn wait(&self) {
        // Held across the sleep so concurrent callers queue in order.
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.gap {
                tokio::time::sleep(self.gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Translator for Failing {
        async fn translate(&self, _text: &str, _target: &str) -> Result<String> {
            Err(PipelineError::ExternalService {
                service: "translation".into(),
                message: "down".into(),
            }
            .into())
        }
    }

    struct Upper;

    #[async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _target: &str) -> Result<String> {
            Ok(format!("{} EN", text))
        }
    }

    fn kw() -> Vec<String> {
        vec!["retraso".to_string(), "linea_tres".to_string()]
    }

    #[tokio::test]
    async fn test_failure_keeps_original() {
        let out = translate_keywords(&Failing, &kw(), "en").await;
        assert_eq!(out, kw());
    }

    #[tokio::test]
    async fn test_success_uses_translation() {
        let out = translate_keywords(&Upper, &kw(), "en").await;
        assert_eq!(out, vec!["retraso en".to_string(), "linea tres en".to_string()]);
    }

    #[tokio::test]
    async fn test_spacing_delays_second_request() {
        let spacing = RequestSpacing::per_second(4.0);
        spacing.wait().await;
        let start = Instant::now();
        spacing.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
