//! Model Gateway: the single boundary between the chain and the completion service.
//!
//! Stages only see the [`ModelGateway`] capability. The HTTP implementation lives in
//! [`openrouter`]; [`ScriptedGateway`] replays canned completions for deterministic runs.

pub mod openrouter;

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub use openrouter::OpenRouterGateway;

/// Transport/protocol failure from the completion service. Bad *content* is never an error here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service rejected the credential ({status}): {body}")]
    AuthFailure { status: u16, body: String },
    #[error("completion service returned {status}: {body}")]
    NonSuccessStatus { status: u16, body: String },
    #[error("malformed completion envelope: {0}")]
    MalformedEnvelope(String),
    #[error("run cancelled: {0}")]
    Cancelled(String),
}

/// Coarse classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    EmptyPrompt,
    Transport,
    AuthFailure,
    NonSuccessStatus,
    MalformedEnvelope,
    Cancelled,
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::EmptyPrompt => GatewayErrorKind::EmptyPrompt,
            GatewayError::Transport(_) => GatewayErrorKind::Transport,
            GatewayError::AuthFailure { .. } => GatewayErrorKind::AuthFailure,
            GatewayError::NonSuccessStatus { .. } => GatewayErrorKind::NonSuccessStatus,
            GatewayError::MalformedEnvelope(_) => GatewayErrorKind::MalformedEnvelope,
            GatewayError::Cancelled(_) => GatewayErrorKind::Cancelled,
        }
    }
}

/// Sends one prompt to a completion service and returns the trimmed completion text.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}

/// Gateway that replays a fixed script of completions in order and records every prompt.
///
/// An exhausted script answers with a transport error, so a chain that calls the gateway
/// more often than expected fails loudly instead of looping on stale text.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(script: impl IntoIterator<Item = Result<String, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Script made only of successful completions.
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| Ok(t.into())))
    }

    /// Prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Scripted responses not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        if prompt.trim().is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }
        self.prompts.lock().await.push(prompt.to_string());
        match self.script.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text.trim().to_string()),
            Some(Err(e)) => Err(e),
            None => Err(GatewayError::Transport(
                "scripted gateway has no response left".to_string(),
            )),
        }
    }
}
