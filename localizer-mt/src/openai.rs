//! OpenAI-compatible chat completion provider
//!
//! Both supported services expose the same `/chat/completions` endpoint
//! shape, so a single client serves them. The instruction prompt is sent as
//! the system message and the question as the user message.
//!
//! # Authentication
//!
//! Keys are read from `OPENAI_API_KEY` or `MISTRAL_API_KEY` depending on the
//! provider, or passed explicitly.
//!
//! # Example
//!
//! ```ignore
//! use localizer_mt::{ChatCompletionProvider, MachineTranslator, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ChatCompletionProvider::from_env(Provider::MistralAi)?;
//!     let answer = provider.translate("Text to translate: ...", "You are ...").await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Supported chat completion services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "openAI")]
    OpenAi,
    #[serde(rename = "mistralAI")]
    MistralAi,
}

impl Provider {
    pub fn endpoint(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
            Provider::MistralAi => "https://api.mistral.ai/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::MistralAi => "open-mistral-nemo",
        }
    }

    /// Environment variable holding the API key
    pub fn key_variable(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::MistralAi => "MISTRAL_API_KEY",
        }
    }

    /// Sampling options sent when the configuration gives none
    fn default_options(self) -> Map<String, Value> {
        let mut options = Map::new();
        if self == Provider::OpenAi {
            options.insert("temperature".to_string(), json!(0.4));
        }
        options
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openAI"),
            Provider::MistralAi => write!(f, "mistralAI"),
        }
    }
}

/// Chat completion client for one provider
#[derive(Clone)]
pub struct ChatCompletionProvider {
    provider: Provider,
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
    model: String,
    /// Extra request fields such as `temperature` or `max_tokens`
    options: Map<String, Value>,
}

impl ChatCompletionProvider {
    /// Create a provider with an explicit API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If the key is empty or the HTTP client cannot be built
    pub fn new(provider: Provider, api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::Config("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            api_key,
            client,
            endpoint: provider.endpoint().to_string(),
            model: provider.default_model().to_string(),
            options: provider.default_options(),
        })
    }

    /// Create a provider with the key from its environment variable
    pub fn from_env(provider: Provider) -> MtResult<Self> {
        let variable = provider.key_variable();
        let api_key = std::env::var(variable).map_err(|_| {
            MtError::Config(format!("{} environment variable not set", variable))
        })?;

        Self::new(provider, api_key)
    }

    /// Merge extra request fields over the provider defaults
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        for (key, value) in options {
            if key == "model" {
                if let Some(model) = value.as_str() {
                    self.model = model.to_string();
                }
            } else {
                self.options.insert(key, value);
            }
        }
        self
    }

    /// Point the client at another compatible endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, question: &str, system_prompt: &str) -> Value {
        let mut body = Map::new();
        body.insert("model".to_string(), json!(self.model));
        body.insert(
            "messages".to_string(),
            json!([
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": question },
            ]),
        );
        for (key, value) in &self.options {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

impl std::fmt::Debug for ChatCompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionProvider")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// First choice's message content of a chat completion response
fn extract_content(json: &Value) -> MtResult<String> {
    let choices = json["choices"].as_array().ok_or_else(|| {
        MtError::Translation("Invalid API response: missing 'choices' array".to_string())
    })?;

    let first = choices
        .first()
        .ok_or_else(|| MtError::Translation("Invalid API response: no choices".to_string()))?;

    first["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            MtError::Translation("Invalid API response: missing message content".to_string())
        })
}

#[async_trait]
impl MachineTranslator for ChatCompletionProvider {
    async fn translate(&self, question: &str, system_prompt: &str) -> MtResult<String> {
        if question.trim().is_empty() {
            return Err(MtError::Translation("Question is required".to_string()));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(question, system_prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(if status.is_client_error() {
                MtError::Config(format!("API client error ({}): {}", status, error_text))
            } else {
                MtError::Translation(format!("API server error ({}): {}", status, error_text))
            });
        }

        let json: Value = response.json().await.map_err(|e| {
            MtError::Translation(format!("Failed to parse API response: {}", e))
        })?;

        extract_content(&json)
    }

    fn provider_name(&self) -> &str {
        match self.provider {
            Provider::OpenAi => "OpenAI",
            Provider::MistralAi => "Mistral AI",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Initialization Tests =====

    #[test]
    fn test_new_with_valid_key() {
        let provider = ChatCompletionProvider::new(Provider::OpenAi, "sk-test".to_string()).unwrap();
        assert_eq!(provider.provider_name(), "OpenAI");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_new_with_empty_key() {
        match ChatCompletionProvider::new(Provider::MistralAi, "  ".to_string()) {
            Err(MtError::Config(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = ChatCompletionProvider::new(Provider::OpenAi, "sk-secret".to_string()).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_provider_serde_names() {
        let provider: Provider = serde_json::from_str("\"mistralAI\"").unwrap();
        assert_eq!(provider, Provider::MistralAi);
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"openAI\"");
        assert_eq!(Provider::MistralAi.key_variable(), "MISTRAL_API_KEY");
    }

    // ===== Request Tests =====

    #[test]
    fn test_request_body_defaults() {
        let provider = ChatCompletionProvider::new(Provider::OpenAi, "k".to_string()).unwrap();
        let body = provider.request_body("question", "system");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.4);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system");
        assert_eq!(body["messages"][1]["content"], "question");
    }

    #[test]
    fn test_options_override_defaults_and_model() {
        let mut options = Map::new();
        options.insert("temperature".to_string(), json!(0.1));
        options.insert("max_tokens".to_string(), json!(512));
        options.insert("model".to_string(), json!("mistral-large-latest"));
        let provider = ChatCompletionProvider::new(Provider::MistralAi, "k".to_string())
            .unwrap()
            .with_options(options);
        let body = provider.request_body("q", "s");
        assert_eq!(body["model"], "mistral-large-latest");
        assert_eq!(body["temperature"], 0.1);
        assert_eq!(body["max_tokens"], 512);
    }

    // ===== Response Tests =====

    #[test]
    fn test_extract_content() {
        let json = json!({ "choices": [{ "message": { "content": "Bonjour" } }] });
        assert_eq!(extract_content(&json).unwrap(), "Bonjour");
    }

    #[test]
    fn test_extract_content_without_choices() {
        let json = json!({ "choices": [] });
        assert!(matches!(extract_content(&json), Err(MtError::Translation(_))));
        assert!(extract_content(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let provider = ChatCompletionProvider::new(Provider::OpenAi, "k".to_string()).unwrap();
        assert!(provider.translate("", "system").await.is_err());
    }
}
