mod ollama;
mod openai;
mod questions;

use async_trait::async_trait;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use questions::{
    extract_json, generation_prompt, parse_questions, QuestionGenerator, MAX_ANSWER_LEN,
};

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Instructions sent ahead of the prompt
    pub system: Option<String>,
    pub prompt: String,
    /// Maximum response length in tokens (provider-dependent)
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "openai", "ollama")
    pub provider: String,
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Ordered list of providers; later ones are fallbacks
pub struct LlmManager {
    pub providers: Vec<Box<dyn LlmProvider>>,
}

impl LlmManager {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Ask each provider in turn until one answers
    ///
    /// Returns the last error when every provider failed.
    pub async fn generate_first(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let mut last_error =
            LlmError::ConfigError("No LLM providers configured".to_string());

        for provider in &self.providers {
            match provider.generate(request.clone()).await {
                Ok(response) => {
                    tracing::info!(
                        "Provider {} answered in {}ms ({})",
                        provider.name(),
                        response.metadata.latency_ms,
                        response.metadata.model
                    );
                    return Ok(response);
                }
                Err(e) => {
                    tracing::error!("Provider {} failed: {}", provider.name(), e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Custom OpenAI-compatible endpoint, e.g. an Azure gateway
    pub openai_base_url: Option<String>,
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,
    pub default_timeout: Duration,
    pub default_max_tokens: u32,
    /// Questions asked for per regeneration
    pub question_count: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o".to_string(),
            openai_base_url: None,
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ollama_model: "llama3.2".to_string(),
            default_timeout: Duration::from_secs(60),
            default_max_tokens: 2000,
            question_count: 3,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ollama_base_url = match std::env::var("OLLAMA_BASE_URL") {
            Ok(url) => {
                let trimmed = url.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(_) => defaults.ollama_base_url,
        };

        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: non_empty_var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: non_empty_var("OPENAI_BASE_URL"),
            ollama_base_url,
            ollama_model: non_empty_var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            default_timeout: std::env::var("LLM_TIMEOUT")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.default_max_tokens),
            question_count: std::env::var("QUESTION_COUNT")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.question_count),
        }
    }

    /// Build an LlmManager with all configured providers, OpenAI first
    pub fn build_manager(&self) -> LlmResult<LlmManager> {
        let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

        if let Some(api_key) = &self.openai_api_key {
            providers.push(Box::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
                self.openai_base_url.clone(),
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            providers.push(Box::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )));
        }

        if providers.is_empty() {
            return Err(LlmError::ConfigError(
                "No LLM providers configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
            ));
        }

        Ok(LlmManager::new(providers))
    }
}
