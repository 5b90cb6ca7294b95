//! Open-ended questions answered by a language model.
//!
//! The session only sees [`QueryAgent`]; the bundled implementation is an
//! [`SqlAgent`] that lets the model run SQL against the dataset through an
//! OpenAI-compatible [`ChatClient`].

mod client;
mod sql_agent;

pub use client::{ChatClient, ChatMessage, OpenAiClient, Role};
pub use sql_agent::{AgentReply, SqlAgent};

use std::fmt;

use crate::dataset::Dataset;

/// Answers a free-form question about a dataset
pub trait QueryAgent {
    fn answer(&self, dataset: &Dataset, query: &str) -> Result<String, AgentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Could not reach the language model: {0}")]
    Transport(String),
    #[error("Language model request failed ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Unexpected response from the language model: {0}")]
    MalformedResponse(String),
    #[error("No answer after {0} steps")]
    StepLimit(usize),
    #[error("{var} is not set")]
    MissingCredential { var: String },
}

/// Bearer token for the chat endpoint; never printed
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the key from `var`; unset or blank counts as missing
    pub fn from_env(var: &str) -> Result<Self, AgentError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(AgentError::MissingCredential {
                var: var.to_string(),
            }),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
