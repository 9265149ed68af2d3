//! Tool trait and types.
//!
//! Tools never raise for expected domain failures (invalid enum value,
//! not-found): they return `success: false` inside their result envelope
//! so the model can recover conversationally. `ToolError` is reserved for
//! infrastructure failures, which the run controller folds into a
//! failure payload.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::DatabaseError;
use crate::llm::ToolDefinition;

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Output from a tool execution: the JSON envelope handed back to the
/// model as a tool-result message.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub result: serde_json::Value,
}

impl ToolOutput {
    /// A success envelope; sets `success: true` on the given object.
    pub fn success(mut result: serde_json::Value) -> Self {
        if let Some(obj) = result.as_object_mut() {
            obj.insert("success".to_string(), serde_json::Value::Bool(true));
        }
        Self { result }
    }

    /// A domain-failure envelope the model can react to.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            result: serde_json::json!({
                "success": false,
                "error": error.into(),
            }),
        }
    }
}

/// Identity and thread context passed to every tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub thread_id: String,
    /// Caller identity; absent for anonymous users, whose data does not
    /// persist.
    pub user_id: Option<String>,
}

impl ToolContext {
    /// The user id, or a domain failure telling the model the user must
    /// be logged in.
    pub fn require_user(&self) -> Result<&str, ToolOutput> {
        match self.user_id.as_deref() {
            Some(user_id) => Ok(user_id),
            None => Err(ToolOutput::failure(
                "No user is logged in, so this cannot be saved. Let the user know.",
            )),
        }
    }
}

/// Trait for tools the agent can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get a description of what the tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;

    /// The tool definition for LLM function calling.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Extract a required string parameter.
pub(crate) fn required_str<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{key}' parameter")))
}

/// Extract an optional string parameter, treating empty strings as absent.
pub(crate) fn optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_injects_flag() {
        let output = ToolOutput::success(serde_json::json!({"message": "done"}));
        assert_eq!(output.result["success"], true);
        assert_eq!(output.result["message"], "done");
    }

    #[test]
    fn test_failure_envelope() {
        let output = ToolOutput::failure("bad input");
        assert_eq!(output.result["success"], false);
        assert_eq!(output.result["error"], "bad input");
    }

    #[test]
    fn test_require_user() {
        let anonymous = ToolContext::default();
        assert!(anonymous.require_user().is_err());

        let logged_in = ToolContext {
            thread_id: "t1".to_string(),
            user_id: Some("u1".to_string()),
        };
        assert_eq!(logged_in.require_user().unwrap(), "u1");
    }

    #[test]
    fn test_optional_str_ignores_empty() {
        let params = serde_json::json!({"a": "", "b": "  ", "c": "value"});
        assert_eq!(optional_str(&params, "a"), None);
        assert_eq!(optional_str(&params, "b"), None);
        assert_eq!(optional_str(&params, "c"), Some("value".to_string()));
        assert_eq!(optional_str(&params, "missing"), None);
    }
}
