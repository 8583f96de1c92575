//! LLM provider abstraction: conversation types and the Gemini client.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, minted client-side for providers that omit one
    pub id: String,

    /// Tool name
    pub name: String,

    /// Argument mapping as supplied by the model
    pub arguments: Value,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,

    /// Tool invocations carried by an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Call this message answers, on tool-result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool that produced this message, on tool-result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Assistant message carrying the model's tool requests.
    pub fn tool_requests(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Tool-result message answering `call` with a JSON payload.
    pub fn tool_result(call: &ToolCall, result: &Value) -> Self {
        Self {
            role: Role::Tool,
            content: Some(result.to_string()),
            tool_calls: None,
            tool_call_id: Some(call.id.clone()),
            tool_name: Some(call.name.clone()),
        }
    }
}

/// Wire form of a tool descriptor: name, usage hint, and input schema.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// What the model asked for in a single turn.
///
/// Decoded from the provider response: any function-call parts present means
/// tools must run before the model can answer; otherwise the concatenated
/// text is the final reply.
#[derive(Debug, Clone)]
pub enum ModelTurn {
    /// The model wants one or more tools executed
    ToolRequests(Vec<ToolCall>),
    /// The model produced its final answer
    Final(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed LLM response: {0}")]
    Malformed(String),
}

/// Client for a hosted chat model with tool calling.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the conversation and tool catalogue, returning the decoded turn.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ModelTurn, LlmError>;
}
