//! Agent module - the tool-augmented request/response cycle.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Seed the conversation with session history and the user message
//! 2. Call the LLM with the tool catalogue
//! 3. If the model requests tool calls, execute them and feed results back
//! 4. Repeat until the model answers in plain text or the bound is hit

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, AgentError, AgentReply};
pub use prompt::build_system_prompt;
