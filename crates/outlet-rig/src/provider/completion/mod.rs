//! Completion provider abstraction.

mod message;
mod provider;

pub use message::ChatMessage;
pub use provider::CompletionProvider;
use tokio::sync::mpsc;

use crate::Result;
use crate::tool::{ToolCall, ToolDefinition};

/// A single model round trip.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System prompt prepended to the conversation.
    pub system_prompt: String,
    /// Conversation so far, oldest first. The last message is the prompt.
    pub messages: Vec<ChatMessage>,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
}

/// What the model produced for one round trip.
///
/// A turn without tool calls is a final answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    /// Assistant text, possibly empty when tools are requested.
    pub text: String,
    /// Tool invocations in the order the model requested them.
    pub tool_calls: Vec<ToolCall>,
}

impl ModelTurn {
    /// A final textual answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A turn requesting the given tool calls.
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
        }
    }

    /// Returns `true` if the model answered without requesting tools.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// A chat model that can request tool calls.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier reported in responses.
    fn model_name(&self) -> &str;

    /// Runs one completion round trip.
    async fn complete(&self, request: ModelRequest) -> Result<ModelTurn>;

    /// Runs one round trip, sending answer text to `deltas` as it arrives.
    ///
    /// The returned turn carries the full text. Models without streaming
    /// support send the whole text as a single delta.
    async fn stream(&self, request: ModelRequest, deltas: mpsc::Sender<String>) -> Result<ModelTurn> {
        let turn = self.complete(request).await?;
        if !turn.text.is_empty() {
            // A closed receiver only means nobody is listening anymore.
            let _ = deltas.send(turn.text.clone()).await;
        }
        Ok(turn)
    }
}
