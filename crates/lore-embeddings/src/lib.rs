//! # lore-embeddings
//!
//! Ollama embedding client. Optional everywhere: when the server is
//! unreachable every call degrades to `None` and search falls back to
//! FTS-only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use lore_core::KbConfig;

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Generates embeddings via Ollama's `/api/embed` endpoint.
///
/// Availability is probed on first use and **only success is cached**:
/// any failure resets the cache so a later call re-probes.
pub struct EmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
    available: AtomicBool,
}

impl EmbeddingClient {
    pub fn new(config: &KbConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.ollama_url.clone(),
            model: config.embedding_model.clone(),
            timeout: Duration::from_secs(config.embed_timeout_secs),
            available: AtomicBool::new(false),
        }
    }

    /// Check if Ollama is reachable, probing when the last known state
    /// is not a success.
    pub async fn is_available(&self) -> bool {
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
                warn!("embedding server not available at {}", self.base_url);
                false
            }
        }
    }

    /// Generate an embedding for the given text. Timeouts and transport
    /// errors map to `None`.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        if !self.is_available().await {
            return None;
        }

        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: self.model.clone(),
            input: vec![text.to_string()],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await;

        let resp = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "embedding request rejected");
                self.available.store(false, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "embedding request failed");
                self.available.store(false, Ordering::Relaxed);
                return None;
            }
        };

        match resp.json::<EmbedResponse>().await {
            Ok(body) => body.embeddings.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "embedding response parse failed");
                self.available.store(false, Ordering::Relaxed);
                None
            }
        }
    }
}
