//! Anthropic Messages API backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use lore_core::KbConfig;

use crate::LlmProvider;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Generates text via the Anthropic Messages API. Availability requires
/// an `ANTHROPIC_API_KEY`; the first successful generation caches it.
pub struct AnthropicLlmClient {
    http: reqwest::Client,
    model: String,
    timeout: Duration,
    api_key: Option<String>,
    confirmed: AtomicBool,
}

impl AnthropicLlmClient {
    pub fn new(config: &KbConfig) -> Self {
        let api_key = std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("ANTHROPIC_API_KEY not set, anthropic backend disabled");
        }
        Self {
            http: reqwest::Client::new(),
            model: config.anthropic_model.clone(),
            timeout: Duration::from_secs(config.anthropic_timeout_secs),
            api_key,
            confirmed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicLlmClient {
    async fn is_available(&self) -> bool {
        // A configured key is assumed usable until a call proves
        // otherwise; the first successful generation confirms it.
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Option<String> {
        let api_key = self.api_key.as_deref()?;

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.map(str::to_string),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let result = self
            .http
            .post(API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await;

        let resp = match result {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "anthropic request rejected");
                self.confirmed.store(false, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "anthropic request failed");
                self.confirmed.store(false, Ordering::Relaxed);
                return None;
            }
        };

        let body: serde_json::Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "anthropic response parse failed");
                return None;
            }
        };

        let text = body
            .get("content")?
            .as_array()?
            .first()?
            .get("text")?
            .as_str()?
            .to_string();
        self.confirmed.store(true, Ordering::Relaxed);
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_system_only_when_present() {
        let with_system = MessagesRequest {
            model: "m".into(),
            max_tokens: 16,
            system: Some("sys".into()),
            messages: vec![Message {
                role: "user",
                content: "hi".into(),
            }],
        };
        let json = serde_json::to_value(&with_system).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"][0]["role"], "user");

        let without = MessagesRequest {
            system: None,
            ..with_system
        };
        let json = serde_json::to_value(&without).unwrap();
        assert!(json.get("system").is_none());
    }
}
