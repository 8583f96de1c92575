//! Gemini API client: request building and response parsing.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ChatMessage, LlmClient, LlmError, ModelTurn, Role, ToolCall, ToolSchema};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            model,
            http,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ModelTurn, LlmError> {
        let body = build_request_body(messages, tools);

        tracing::debug!("Sending {} messages to Gemini", messages.len());
        let response = self
            .http
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        parse_turn(&json)
    }
}

/// Build the JSON request body for the Gemini API.
///
/// System messages are folded into `systemInstruction`; assistant tool
/// requests are replayed as `functionCall` parts and tool results ride as
/// `functionResponse` parts on user-role contents.
fn build_request_body(messages: &[ChatMessage], tools: &[ToolSchema]) -> Value {
    let mut contents = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => continue,
            Role::User => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": msg.content.clone().unwrap_or_default() }]
                }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if let Some(text) = msg.content.as_deref().filter(|t| !t.is_empty()) {
                    parts.push(json!({ "text": text }));
                }
                for call in msg.tool_calls.as_deref().unwrap_or_default() {
                    parts.push(json!({
                        "functionCall": { "name": call.name, "args": call.arguments }
                    }));
                }
                if parts.is_empty() {
                    parts.push(json!({ "text": "" }));
                }
                contents.push(json!({ "role": "model", "parts": parts }));
            }
            Role::Tool => {
                let name = msg.tool_name.clone().unwrap_or_else(|| "tool".to_string());
                let response = msg
                    .content
                    .as_deref()
                    .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                    .unwrap_or(Value::Null);
                // functionResponse payloads must be objects
                let response = match response {
                    Value::Object(_) => response,
                    other => json!({ "result": other }),
                };
                contents.push(json!({
                    "role": "user",
                    "parts": [{ "functionResponse": { "name": name, "response": response } }]
                }));
            }
        }
    }

    let mut body = json!({ "contents": contents });

    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .filter_map(|m| m.content.as_deref())
        .collect();
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
    }

    if !tools.is_empty() {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    body
}

/// Decode a Gemini response into a [`ModelTurn`].
fn parse_turn(json: &Value) -> Result<ModelTurn, LlmError> {
    let candidates = json["candidates"]
        .as_array()
        .ok_or_else(|| LlmError::Malformed("no candidates in response".to_string()))?;

    let first = candidates
        .first()
        .ok_or_else(|| LlmError::Malformed("empty candidates".to_string()))?;

    let parts = first["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let mut text = String::new();
    let mut calls = Vec::new();

    for part in &parts {
        if let Some(t) = part["text"].as_str() {
            text.push_str(t);
        }
        if let Some(fc) = part.get("functionCall") {
            // Gemini does not return call ids; mint one per request
            calls.push(ToolCall {
                id: uuid::Uuid::new_v4().to_string(),
                name: fc["name"].as_str().unwrap_or("").to_string(),
                arguments: fc["args"].clone(),
            });
        }
    }

    if !calls.is_empty() {
        return Ok(ModelTurn::ToolRequests(calls));
    }
    if text.is_empty() {
        return Err(LlmError::Malformed(
            "model returned neither text nor tool calls".to_string(),
        ));
    }
    Ok(ModelTurn::Final(text))
}
