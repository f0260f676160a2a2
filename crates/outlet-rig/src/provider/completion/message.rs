//! Conversation messages exchanged with the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::{ToolCall, ToolResult};

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    /// User input.
    User { content: String },
    /// Assistant output, optionally requesting tool calls.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of a tool call, fed back to the model.
    Tool {
        call_id: String,
        name: String,
        content: Value,
    },
}

impl ChatMessage {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Creates an assistant message that requests tool calls.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Creates a tool message from an execution result.
    pub fn tool(result: &ToolResult) -> Self {
        Self::Tool {
            call_id: result.call_id.clone(),
            name: result.name.clone(),
            content: result.output.clone(),
        }
    }

    /// Returns the text content, if this is a user or assistant message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Assistant { content, .. } => Some(content),
            Self::Tool { .. } => None,
        }
    }
}
