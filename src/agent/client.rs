use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AgentError, ApiKey};
use crate::config::AgentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One blocking chat completion: the whole conversation in, the reply text out
pub trait ChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for OpenAI-style `/chat/completions` endpoints
pub struct OpenAiClient {
    http: ureq::Agent,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: ApiKey,
}

impl OpenAiClient {
    pub fn new(config: &AgentConfig, api_key: ApiKey) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatClient for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .set(
                "Authorization",
                &format!("Bearer {}", self.api_key.expose()),
            )
            .send_json(&request);

        match response {
            Ok(response) => {
                let body: ChatResponse = response
                    .into_json()
                    .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;
                reply_text(body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(AgentError::Api {
                    status,
                    body: error_message(&text),
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(AgentError::Transport(transport.to_string()))
            }
        }
    }
}

fn reply_text(body: ChatResponse) -> Result<String, AgentError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AgentError::MalformedResponse("no choices in response".to_string()))
}

/// Pull `error.message` out of an API error body, or keep the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
