//! Console output formatter for tool results

use colored::Colorize;
use mmagent_domain::{ToolDefinition, ToolResult, ToolStatus};

/// Formats tool results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format(result: &ToolResult) -> String {
        let mut output = String::new();

        let (mark, title) = match result.status {
            ToolStatus::Success => ("v".green(), result.tool_name.green().bold()),
            ToolStatus::Cancelled => ("-".yellow(), result.tool_name.yellow().bold()),
            ToolStatus::Failure => ("x".red(), result.tool_name.red().bold()),
        };
        output.push_str(&format!("{} {}", mark, title));
        if let Some(ms) = result.metadata.duration_ms {
            output.push_str(&format!(" {}", format!("({} ms)", ms).dimmed()));
        }
        output.push('\n');

        if !result.metadata.paths.is_empty() {
            output.push_str(&format!("{}\n", "Files:".cyan().bold()));
            for path in &result.metadata.paths {
                output.push_str(&format!("  * {}\n", path));
            }
        }

        match (result.error(), result.output()) {
            (Some(error), _) => output.push_str(&format!("{} {}\n", "Error:".red().bold(), error)),
            (None, Some(text)) if result.status == ToolStatus::Cancelled => {
                output.push_str(&format!("{}\n", text.yellow()))
            }
            (None, Some(text)) if result.metadata.paths.is_empty() => {
                output.push_str(&format!("{}\n", Self::pretty(text)))
            }
            _ => {}
        }

        output
    }

    pub fn format_tools(definitions: &[ToolDefinition]) -> String {
        let mut output = String::new();
        for def in definitions {
            output.push_str(&format!("{}\n  {}\n", def.name.cyan().bold(), def.description));
            if let Some(action) = &def.action_type {
                output.push_str(&format!("  {} {}\n", "approval:".dimmed(), action));
            }
            for param in &def.parameters {
                let required = if param.required { "*" } else { " " };
                output.push_str(&format!(
                    "    {}{} ({}) {}\n",
                    required,
                    param.name,
                    param.param_type,
                    param.description.dimmed()
                ));
            }
        }
        output
    }

    /// Pretty-print JSON output; other text unchanged.
    fn pretty(text: &str) -> String {
        serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmagent_domain::ToolError;

    #[test]
    fn test_format_success_lists_files() {
        colored::control::set_override(false);
        let result = ToolResult::success("generate_image", "{}")
            .with_paths(vec!["images/a.png".to_string()])
            .with_duration(12);
        let text = ConsoleFormatter::format(&result);
        assert!(text.starts_with("v generate_image (12 ms)"));
        assert!(text.contains("  * images/a.png"));
    }

    #[test]
    fn test_format_failure_shows_error() {
        colored::control::set_override(false);
        let result = ToolResult::failure("describe_image", ToolError::not_found("images/x.png"));
        let text = ConsoleFormatter::format(&result);
        assert!(text.contains("Error: [NOT_FOUND] Not found: images/x.png"));
    }

    #[test]
    fn test_format_cancelled() {
        colored::control::set_override(false);
        let result = ToolResult::cancelled("synthesize_speech", "Speech synthesis", None);
        let text = ConsoleFormatter::format(&result);
        assert!(text.contains("Speech synthesis cancelled by user."));
    }
}
