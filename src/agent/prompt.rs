//! System prompt for the retrieval assistant.

use crate::tools::ToolRegistry;

/// Build the fixed system instruction with the tool usage policy.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    if tools.is_empty() {
        return "You are a course data assistant. No data tools are available right now; \
                answer from the conversation alone and say so when you do not know."
            .to_string();
    }

    let tool_descriptions = tools
        .schemas()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a course data retrieval assistant. Policy:
- If the user asks for anything that could live in the course data, call the matching tool. Do not guess values.
- Never hallucinate values; prefer tool calls.
- Do not assume data sources beyond the tools listed below.
- Keep replies concise unless asked otherwise.

Available tools:
{tool_descriptions}"#,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FixtureSearch;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn prompt_lists_registered_tools() {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FixtureSearch::new(PathBuf::from("data.json"))));

        let prompt = build_system_prompt(&tools);
        assert!(prompt.contains("**search_backend_json**"));
        assert!(prompt.contains("Do not guess values"));
    }

    #[test]
    fn prompt_degrades_without_tools() {
        let prompt = build_system_prompt(&ToolRegistry::new());
        assert!(prompt.contains("No data tools are available"));
    }
}
