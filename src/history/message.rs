//! Message and checkpoint data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, ToolCall};

/// Role of a durable conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    Human,
    Assistant,
    /// Result of a tool call, answering a prior assistant request.
    Tool,
}

/// A tool-call request carried by an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique within the assistant message that carries it.
    pub call_id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One message in a thread's durable history.
///
/// Invariant: a `Tool` message always references the `call_id` of a
/// preceding assistant request; the run controller never appends an
/// orphaned result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Tool-call requests, present only on assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The answered call, present only on tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        use crate::llm::Role;

        let role = match msg.role {
            MessageRole::System => Role::System,
            MessageRole::Human => Role::User,
            MessageRole::Assistant => Role::Assistant,
            MessageRole::Tool => Role::Tool,
        };
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| ToolCall {
                        id: tc.call_id.clone(),
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    })
                    .collect(),
            )
        };
        ChatMessage {
            role,
            content: msg.content.clone(),
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls,
        }
    }
}

/// A gated tool call suspended for human confirmation.
///
/// Persisted inside the checkpoint so a process restart cannot lose it.
/// Arguments are captured verbatim at suspension time and are never
/// mutated between suspension and resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
    /// Model-invocation count at the moment the call was captured.
    pub captured_at_step: u32,
}

/// An immutable snapshot of a thread's full state.
///
/// The message history stored here is always the durable, uncompacted
/// history; compaction output never reaches a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interrupt: Option<PendingInterrupt>,
    /// Number of model invocations so far on this thread.
    pub step: u32,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        thread_id: impl Into<String>,
        messages: Vec<Message>,
        pending_interrupt: Option<PendingInterrupt>,
        step: u32,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages,
            pending_interrupt,
            step,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serde_round_trip() {
        let msg = Message::assistant_with_calls(
            "Let me save that.",
            vec![ToolCallRequest {
                call_id: "call_1".to_string(),
                name: "confirm_role_preference".to_string(),
                arguments: serde_json::json!({"role": "cto"}),
            }],
        );

        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_plain_message_omits_empty_fields() {
        let json = serde_json::to_value(Message::human("hello")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn test_checkpoint_serde_round_trip() {
        let checkpoint = Checkpoint::new(
            "thread-1",
            vec![
                Message::system("You are a career assistant."),
                Message::human("confirm role = cto"),
            ],
            Some(PendingInterrupt {
                call_id: "call_1".to_string(),
                tool_name: "confirm_role_preference".to_string(),
                arguments: serde_json::json!({"role": "cto"}),
                captured_at_step: 1,
            }),
            1,
        );

        let json = serde_json::to_string(&checkpoint).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(checkpoint, back);
    }

    #[test]
    fn test_chat_message_conversion_maps_roles() {
        use crate::llm::Role;

        let chat: ChatMessage = (&Message::human("hi")).into();
        assert_eq!(chat.role, Role::User);

        let chat: ChatMessage = (&Message::tool_result("call_9", "{}")).into();
        assert_eq!(chat.role, Role::Tool);
        assert_eq!(chat.tool_call_id.as_deref(), Some("call_9"));
    }
}
