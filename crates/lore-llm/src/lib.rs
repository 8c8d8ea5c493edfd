//! # lore-llm
//!
//! Pluggable language model backends behind a three-method contract.
//! Providers degrade gracefully: unavailability and transport failures
//! produce `None`, never errors.

pub mod anthropic;
pub mod ollama;

use async_trait::async_trait;

use lore_core::KbConfig;

pub use anthropic::AnthropicLlmClient;
pub use ollama::OllamaLlmClient;

/// Contract for language model providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Check if the backend is reachable or configured.
    async fn is_available(&self) -> bool;

    /// Generate text from a prompt. Returns `None` when the backend is
    /// unavailable or the call fails.
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Option<String>;

    /// Release resources. Most HTTP-backed providers have nothing to do.
    async fn close(&self) {}
}

/// Create an LLM provider for the given backend name. Unknown names
/// yield `None`, which disables the dependent feature.
pub fn create_provider(name: &str, config: &KbConfig) -> Option<Box<dyn LlmProvider>> {
    match name {
        "anthropic" => Some(Box::new(AnthropicLlmClient::new(config))),
        "ollama" => Some(Box::new(OllamaLlmClient::new(config))),
        _ => None,
    }
}
