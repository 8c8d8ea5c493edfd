//! Ollama text generation via `/api/generate`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use lore_core::KbConfig;

use crate::LlmProvider;

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generates text via a local Ollama instance. Only success is cached;
/// failures reset availability so the next call re-probes.
pub struct OllamaLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
    available: AtomicBool,
}

impl OllamaLlmClient {
    pub fn new(config: &KbConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.ollama_url.clone(),
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
            available: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlmClient {
    async fn is_available(&self) -> bool {
        if self.available.load(Ordering::Relaxed) {
            return true;
        }
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).timeout(self.timeout).send().await {
            Ok(resp) if resp.status().is_success() => {
                self.available.store(true, Ordering::Relaxed);
                true
            }
            _ => {
                warn!("ollama not available at {}", self.base_url);
                false
            }
        }
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Option<String> {
        if !self.is_available().await {
            return None;
        }

        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
            stream: false,
        };

        let result = self
            .http
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await;

        let resp = match result {
            Ok(resp) if resp.status().is_success() => resp,
            _ => {
                warn!("ollama generation failed");
                self.available.store(false, Ordering::Relaxed);
                return None;
            }
        };

        match resp.json::<GenerateResponse>().await {
            Ok(body) => Some(body.response),
            Err(e) => {
                warn!(error = %e, "ollama response parse failed");
                self.available.store(false, Ordering::Relaxed);
                None
            }
        }
    }
}
