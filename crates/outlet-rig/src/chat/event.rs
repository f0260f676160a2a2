//! Events emitted during a conversation turn.

use serde::{Deserialize, Serialize};

use super::ChatResponse;
use crate::tool::{ToolCall, ToolResult};

/// An event in a conversation turn.
///
/// A turn ends with exactly one [`ChatEvent::Done`] or [`ChatEvent::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// The model requested a tool call.
    ToolCall { call: ToolCall },
    /// A tool call finished.
    ToolResult { result: ToolResult },
    /// Answer text.
    TextDelta { delta: String },
    /// The turn completed.
    Done { response: ChatResponse },
    /// The turn failed.
    ///
    /// `retryable` is set when resending the same conversation may succeed,
    /// e.g. after a provider outage or a catalog timeout.
    Error {
        message: String,
        #[serde(default)]
        retryable: bool,
    },
}

impl ChatEvent {
    /// Event name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::TextDelta { .. } => "text_delta",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Returns `true` for the event that ends a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_type_tag_matches_event_type() {
        let events = [
            ChatEvent::ToolCall {
                call: ToolCall::new("c", "listOutlets", json!({})),
            },
            ChatEvent::TextDelta {
                delta: "hi".to_string(),
            },
            ChatEvent::Error {
                message: "boom".to_string(),
                retryable: false,
            },
        ];

        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }

    #[test]
    fn test_terminal() {
        assert!(
            ChatEvent::Error {
                message: String::new(),
                retryable: true,
            }
            .is_terminal()
        );
        assert!(
            !ChatEvent::TextDelta {
                delta: String::new()
            }
            .is_terminal()
        );
    }
}
