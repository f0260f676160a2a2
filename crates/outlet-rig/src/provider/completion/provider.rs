//! Completion provider backed by rig's OpenAI client.

use std::sync::Arc;

use futures::StreamExt;
use rig::completion::{
    AssistantContent, CompletionModel as RigCompletionModel, CompletionRequestBuilder,
};
use rig::message::{Message, ToolResultContent, UserContent};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use tokio::sync::mpsc;

use super::{ChatMessage, LanguageModel, ModelRequest, ModelTurn};
use crate::provider::ProviderConfig;
use crate::tool::ToolCall;
use crate::{Error, Result, TRACING_TARGET};

/// Completion provider that wraps rig's OpenAI completion model.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

struct CompletionService {
    model: openai::CompletionModel,
    model_name: String,
}

impl CompletionProvider {
    /// Creates an OpenAI completion provider from configuration.
    pub fn openai(config: &ProviderConfig) -> Result<Self> {
        let client = openai::Client::new(config.api_key()?)
            .map_err(|e| Error::provider("openai", e))?
            .completions_api();

        Ok(Self(Arc::new(CompletionService {
            model: client.completion_model(&config.completion_model),
            model_name: config.completion_model.clone(),
        })))
    }
}

#[async_trait::async_trait]
impl LanguageModel for CompletionProvider {
    fn model_name(&self) -> &str {
        &self.0.model_name
    }

    async fn complete(&self, request: ModelRequest) -> Result<ModelTurn> {
        let response = self
            .0
            .request(request)?
            .send()
            .await
            .map_err(|e| Error::provider(&self.0.model_name, e))?;

        let turn = turn_from_choice(&response.choice);
        self.0.log_turn(&turn, false);

        Ok(turn)
    }

    async fn stream(&self, request: ModelRequest, deltas: mpsc::Sender<String>) -> Result<ModelTurn> {
        let mut stream = self
            .0
            .request(request)?
            .stream()
            .await
            .map_err(|e| Error::provider(&self.0.model_name, e))?;

        while let Some(item) = stream.next().await {
            let item = item.map_err(|e| Error::provider(&self.0.model_name, e))?;
            let StreamedAssistantContent::Text(text) = item else {
                continue;
            };
            if text.text.is_empty() {
                continue;
            }

            if deltas.send(text.text).await.is_err() {
                tracing::debug!(
                    target: TRACING_TARGET,
                    model = %self.0.model_name,
                    "Delta receiver closed, cancelling completion stream"
                );
                stream.cancel();
                break;
            }
        }

        // The stream aggregates text and tool calls into `choice` once drained.
        let turn = turn_from_choice(&stream.choice);
        self.0.log_turn(&turn, true);

        Ok(turn)
    }
}

impl CompletionService {
    /// Builds a rig request; the last conversation message becomes the prompt.
    fn request(
        &self,
        request: ModelRequest,
    ) -> Result<CompletionRequestBuilder<openai::CompletionModel>> {
        let mut history: Vec<Message> = request.messages.iter().map(to_rig_message).collect();
        let prompt = history
            .pop()
            .ok_or_else(|| Error::agent("completion request has no messages"))?;

        Ok(self
            .model
            .completion_request(prompt)
            .preamble(request.system_prompt)
            .messages(history)
            .tools(request.tools))
    }

    fn log_turn(&self, turn: &ModelTurn, streamed: bool) {
        tracing::debug!(
            target: TRACING_TARGET,
            model = %self.model_name,
            streamed,
            text_len = turn.text.len(),
            tool_calls = turn.tool_calls.len(),
            "Completion round trip finished"
        );
    }
}

/// Converts a conversation message into rig's message type.
fn to_rig_message(message: &ChatMessage) -> Message {
    match message {
        ChatMessage::User { content } => Message::user(content.clone()),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } if tool_calls.is_empty() => Message::assistant(content.clone()),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut parts = Vec::with_capacity(tool_calls.len() + 1);
            if !content.is_empty() {
                parts.push(AssistantContent::text(content.clone()));
            }
            parts.extend(tool_calls.iter().map(|call| {
                AssistantContent::tool_call(
                    call.id.clone(),
                    call.name.clone(),
                    call.arguments.clone(),
                )
            }));

            let content = OneOrMany::many(parts)
                .unwrap_or_else(|_| OneOrMany::one(AssistantContent::text(String::new())));
            Message::Assistant { id: None, content }
        }
        ChatMessage::Tool {
            call_id, content, ..
        } => Message::User {
            content: OneOrMany::one(UserContent::tool_result(
                call_id.clone(),
                OneOrMany::one(ToolResultContent::text(content.to_string())),
            )),
        },
    }
}

/// Splits assistant content into text and tool calls, preserving call order.
fn turn_from_choice(choice: &OneOrMany<AssistantContent>) -> ModelTurn {
    let mut turn = ModelTurn::default();

    for content in choice.iter() {
        match content {
            AssistantContent::Text(text) => turn.text.push_str(&text.text),
            AssistantContent::ToolCall(call) => turn.tool_calls.push(ToolCall::new(
                call.id.clone(),
                call.function.name.clone(),
                call.function.arguments.clone(),
            )),
            _ => {}
        }
    }

    turn
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider::OpenAi")
            .field("model", &self.0.model_name)
            .finish()
    }
}
