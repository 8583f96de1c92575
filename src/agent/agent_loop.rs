//! Core agent loop implementation.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::llm::{ChatMessage, LlmClient, LlmError, ModelTurn};
use crate::tools::ToolRegistry;

use super::prompt::build_system_prompt;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The loop bound was hit before the model produced a plain answer.
    #[error("no final answer after {iterations} model calls")]
    Exhausted { iterations: usize },
}

/// Outcome of one request cycle.
#[derive(Debug)]
pub struct AgentReply {
    /// The model's final answer
    pub text: String,

    /// Model calls spent producing it
    pub iterations: usize,
}

/// The orchestration loop around the LLM and the tool registry.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_iterations: usize,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, max_iterations: usize) -> Self {
        Self {
            llm,
            tools,
            max_iterations,
        }
    }

    /// Run one request cycle and return the final reply.
    ///
    /// `history` is the session's prior conversation. `context` is an
    /// optional payload from the client, injected as grounding before the
    /// first model call.
    pub async fn run(
        &self,
        history: &[ChatMessage],
        text: &str,
        context: Option<&Value>,
    ) -> Result<AgentReply, AgentError> {
        // ingest: history, then any client context, then the new user text
        let mut messages = vec![ChatMessage::system(build_system_prompt(&self.tools))];
        messages.extend_from_slice(history);
        if let Some(payload) = context {
            messages.push(ChatMessage::system(format!(
                "Frontend context injected for grounding. Use this when deciding what course data to fetch.\n{}",
                payload
            )));
        }
        messages.push(ChatMessage::user(text));

        let schemas = self.tools.schemas();

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            match self.llm.chat(&messages, &schemas).await? {
                ModelTurn::Final(reply) => {
                    return Ok(AgentReply {
                        text: reply,
                        iterations: iteration + 1,
                    });
                }
                ModelTurn::ToolRequests(calls) => {
                    messages.push(ChatMessage::tool_requests(calls.clone()));

                    // one at a time, in the order the model asked
                    for call in &calls {
                        tracing::info!(
                            "Calling tool: {} with args: {}",
                            call.name,
                            call.arguments
                        );
                        let result = self.tools.execute(&call.name, call.arguments.clone()).await;
                        messages.push(ChatMessage::tool_result(call, &result));
                    }
                }
            }
        }

        Err(AgentError::Exhausted {
            iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Role, ToolCall, ToolSchema};
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// LLM that replays scripted turns and records what it was sent.
    struct ScriptedLlm {
        turns: Mutex<VecDeque<ModelTurn>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSchema],
        ) -> Result<ModelTurn, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Malformed("script exhausted".to_string()))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its arguments."
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": { "value": {} } })
        }

        async fn execute(&self, args: Value) -> anyhow::Result<Value> {
            Ok(json!({ "echoed": args["value"] }))
        }
    }

    fn echo_call() -> ToolCall {
        ToolCall {
            id: "call-1".to_string(),
            name: "echo".to_string(),
            arguments: json!({ "value": 42 }),
        }
    }

    #[tokio::test]
    async fn tool_cycle_feeds_result_back_to_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            ModelTurn::ToolRequests(vec![echo_call()]),
            ModelTurn::Final("done".to_string()),
        ]));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));
        let agent = Agent::new(llm.clone(), tools, 8);

        let reply = agent.run(&[], "run echo", None).await.expect("reply");
        assert_eq!(reply.text, "done");
        assert_eq!(reply.iterations, 2);

        let seen = llm.seen.lock().unwrap();
        let second_call = &seen[1];
        let tool_msg = second_call
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("tool result message");
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(
            tool_msg.content.as_deref(),
            Some(r#"{"echoed":42}"#)
        );
    }

    #[tokio::test]
    async fn loop_stops_with_exhausted_outcome() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            ModelTurn::ToolRequests(vec![echo_call()]),
            ModelTurn::ToolRequests(vec![echo_call()]),
            ModelTurn::ToolRequests(vec![echo_call()]),
        ]));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));
        let agent = Agent::new(llm, tools, 3);

        let err = agent.run(&[], "loop forever", None).await.expect_err("bound");
        assert!(matches!(err, AgentError::Exhausted { iterations: 3 }));
    }

    #[tokio::test]
    async fn context_payload_is_injected_before_user_text() {
        let llm = Arc::new(ScriptedLlm::new(vec![ModelTurn::Final("ok".to_string())]));
        let agent = Agent::new(llm.clone(), ToolRegistry::new(), 8);

        let context = json!({ "user_id": "123", "course_id": "ABC" });
        agent
            .run(&[], "what's due?", Some(&context))
            .await
            .expect("reply");

        let seen = llm.seen.lock().unwrap();
        let messages = &seen[0];
        let injected = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .nth(1)
            .expect("context system message");
        assert!(injected
            .content
            .as_deref()
            .expect("content")
            .contains("\"course_id\":\"ABC\""));
        assert_eq!(messages.last().expect("user"), &ChatMessage::user("what's due?"));
    }

    #[tokio::test]
    async fn history_precedes_the_new_message() {
        let llm = Arc::new(ScriptedLlm::new(vec![ModelTurn::Final("ok".to_string())]));
        let agent = Agent::new(llm.clone(), ToolRegistry::new(), 8);

        let history = vec![
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
        ];
        agent.run(&history, "follow-up", None).await.expect("reply");

        let seen = llm.seen.lock().unwrap();
        let messages = &seen[0];
        assert_eq!(messages[1], history[0]);
        assert_eq!(messages[2], history[1]);
        assert_eq!(messages[3], ChatMessage::user("follow-up"));
    }

    #[tokio::test]
    async fn unknown_tool_request_still_reaches_a_final_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            ModelTurn::ToolRequests(vec![ToolCall {
                id: "call-9".to_string(),
                name: "no_such_tool".to_string(),
                arguments: json!({}),
            }]),
            ModelTurn::Final("recovered".to_string()),
        ]));
        let agent = Agent::new(llm.clone(), ToolRegistry::new(), 8);

        let reply = agent.run(&[], "try it", None).await.expect("reply");
        assert_eq!(reply.text, "recovered");

        let seen = llm.seen.lock().unwrap();
        let tool_msg = seen[1]
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("tool result message");
        assert!(tool_msg
            .content
            .as_deref()
            .expect("content")
            .contains("unknown tool"));
    }
}
