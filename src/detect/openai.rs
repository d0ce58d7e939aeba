//! Chat-completions client for the classification service.
//!
//! Thin `reqwest` wrapper behind [`ClassificationClient`]; the semantic
//! detector owns all parsing and degradation policy, this type only moves
//! the prompt across the wire.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SemanticConfig;
use crate::detect::semantic::ClassificationClient;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &SemanticConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Classification(format!("client init: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ClassificationClient for OpenAiClient {
    async fn classify(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.1,
            max_tokens: 10_000,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Classification(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Classification(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ResponseParse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::ResponseParse("response carried no choices".into()))
    }
}
