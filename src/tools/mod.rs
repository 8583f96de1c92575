//! Tool definitions and dispatch.
//!
//! Each tool is described to the model by a name, a natural-language usage
//! hint, and a JSON input schema. The registry executes requested calls one
//! at a time, in the order the model asked for them, and never lets a
//! failure escape: every error is flattened into an `{"error": ...}` payload
//! handed back to the model as the tool's output.

mod canvas;
mod fixture;

pub use canvas::register_canvas_tools;
pub use fixture::FixtureSearch;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::ToolSchema;

/// A tool the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to the model.
    fn name(&self) -> &str;

    /// Natural-language hint the model uses to decide applicability.
    fn description(&self) -> &str;

    /// JSON schema of the tool's declared arguments.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the model-supplied arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// Registry of the tools available to the agent.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool catalogue in the wire form sent to the LLM.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Execute a named tool.
    ///
    /// Failures never propagate past this boundary; unknown tools and
    /// execution errors alike come back as `{"error": ...}` payloads.
    pub async fn execute(&self, name: &str, args: Value) -> Value {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            return json!({ "error": format!("unknown tool: {}", name) });
        };

        tracing::info!("Executing tool {} with args: {}", name, args);
        match tool.execute(args).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                json!({ "error": e.to_string() })
            }
        }
    }
}
