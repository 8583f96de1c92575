//! Local JSON fixture lookup tool.
//!
//! Resolves either a literal `path:` dot/index lookup into the fixture
//! document or a case-insensitive keyword search across all leaf values.
//! The document is re-read on every call so edits show up without a
//! restart.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

const DEFAULT_TOP_K: u64 = 5;

/// Look up data in the backend JSON document.
pub struct FixtureSearch {
    path: PathBuf,
}

impl FixtureSearch {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Tool for FixtureSearch {
    fn name(&self) -> &str {
        "search_backend_json"
    }

    fn description(&self) -> &str {
        "Look up data in the backend JSON document. Use 'path:<dot.path>' for a direct path lookup (e.g., path:assignments.0.name); any other query performs a keyword search across leaf values and returns the top matches."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Either 'path:<dot.path>' or a keyword to search for"
                },
                "top_k": {
                    "type": "integer",
                    "description": "Maximum number of keyword matches to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let top_k = args["top_k"].as_u64().unwrap_or(DEFAULT_TOP_K) as usize;

        tracing::debug!("Reading fixture JSON at {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let data: Value = serde_json::from_str(&raw)?;

        if let Some(dot_path) = query.strip_prefix("path:") {
            let dot_path = dot_path.trim();
            return Ok(match get_by_path(&data, dot_path) {
                Ok(value) => json!({ "mode": "path", "path": dot_path, "value": value }),
                // a bad path is an answer, not a failure
                Err(err) => json!({ "mode": "path", "path": dot_path, "error": err }),
            });
        }

        let mut leaves = Vec::new();
        collect_leaves(&data, String::new(), &mut leaves);

        let needle = query.to_lowercase();
        let results: Vec<Value> = leaves
            .into_iter()
            .filter(|(_, value)| value_text(value).to_lowercase().contains(&needle))
            .take(top_k)
            .map(|(path, value)| json!({ "path": path, "value": value }))
            .collect();

        tracing::debug!(
            "Keyword search for '{}' returned {} results",
            query,
            results.len()
        );
        Ok(json!({ "mode": "search", "query": query, "results": results }))
    }
}

/// Resolve a dot/index path like `users.0.email`.
fn get_by_path<'a>(data: &'a Value, path: &str) -> Result<&'a Value, String> {
    let mut current = data;
    for part in path.split('.').filter(|p| !p.is_empty()) {
        current = match current {
            Value::Array(items) if part.bytes().all(|b| b.is_ascii_digit()) => {
                let idx: usize = part
                    .parse()
                    .map_err(|_| format!("index {} out of range for list", part))?;
                items
                    .get(idx)
                    .ok_or_else(|| format!("index {} out of range for list", idx))?
            }
            Value::Object(map) => map
                .get(part)
                .ok_or_else(|| format!("key '{}' not found", part))?,
            _ => return Err(format!("cannot descend into '{}' on non-container", part)),
        };
    }
    Ok(current)
}

/// Flatten the document into `(dot-path, leaf value)` pairs.
fn collect_leaves(data: &Value, prefix: String, out: &mut Vec<(String, Value)>) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_leaves(value, path, out);
            }
        }
        Value::Array(items) => {
            for (i, value) in items.iter().enumerate() {
                let path = if prefix.is_empty() {
                    i.to_string()
                } else {
                    format!("{}.{}", prefix, i)
                };
                collect_leaves(value, path, out);
            }
        }
        _ => out.push((prefix, data.clone())),
    }
}

/// Text a leaf value is matched against.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
