//! # Canvas Chat
//!
//! A small chat backend that grounds LLM replies in Canvas course data.
//!
//! This library provides:
//! - An HTTP API accepting chat messages from a web client
//! - A bounded tool-calling loop around the Gemini API
//! - Course-data tools backed by the Canvas REST API or a local JSON fixture
//!
//! ## Architecture
//!
//! The backend follows the "tools in a loop" pattern:
//! 1. Receive user text via the API
//! 2. Seed the conversation with session history and a policy prompt
//! 3. Call the LLM, parse the turn, execute any requested tools
//! 4. Feed results back to the LLM, repeat until it answers in plain text
//!
//! ## Example
//!
//! ```rust,ignore
//! use canvas_chat::config::Config;
//!
//! let config = Config::from_env()?;
//! canvas_chat::api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod canvas;
pub mod config;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
