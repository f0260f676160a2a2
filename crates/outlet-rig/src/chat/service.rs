//! Chat service running conversation turns.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AgentConfig, AgentExecutor, ChatEvent, ChatResponse, ChatStream};
use crate::provider::{ChatMessage, LanguageModel};
use crate::rag::InitializationGuard;
use crate::tool::ToolRegistry;
use crate::{Error, Result, TRACING_TARGET};

/// Capacity of the per-turn event channel.
const EVENT_BUFFER: usize = 32;

/// Inner state for [`ChatService`].
struct ChatServiceInner {
    guard: InitializationGuard,
    executor: AgentExecutor,
}

/// Chat service for outlet conversations.
///
/// This type is cheap to clone and can be shared across threads. Turns do
/// not share state except the vector store behind the guard.
#[derive(Clone)]
pub struct ChatService {
    inner: Arc<ChatServiceInner>,
}

impl ChatService {
    /// Creates a new chat service.
    pub fn new(
        guard: InitializationGuard,
        tools: ToolRegistry,
        model: Arc<dyn LanguageModel>,
        config: AgentConfig,
    ) -> Self {
        let executor = AgentExecutor::new(config, Arc::new(tools), model);

        Self {
            inner: Arc::new(ChatServiceInner { guard, executor }),
        }
    }

    /// Runs one conversation turn and streams its events.
    ///
    /// The stream always ends with a [`ChatEvent::Done`] or a
    /// [`ChatEvent::Error`].
    pub fn chat(&self, messages: Vec<ChatMessage>) -> ChatStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            let event = match Self::run_turn(&inner, messages, Some(&tx)).await {
                Ok(response) => ChatEvent::Done { response },
                Err(error) => {
                    let retryable = error.is_retryable();
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %error,
                        retryable,
                        "Conversation turn failed"
                    );
                    ChatEvent::Error {
                        message: error.to_string(),
                        retryable,
                    }
                }
            };

            if tx.send(event).await.is_err() {
                tracing::debug!(target: TRACING_TARGET, "Chat stream dropped before completion");
            }
        });

        ChatStream::new(rx, task)
    }

    /// Runs one conversation turn and returns only the final answer.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        Self::run_turn(&self.inner, messages, None).await
    }

    /// Builds the index ahead of the first conversation.
    ///
    /// Returns `true` if the index is ready.
    pub async fn warm_up(&self) -> bool {
        self.inner.guard.ensure_ready().await
    }

    /// Returns the initialization guard.
    pub fn guard(&self) -> &InitializationGuard {
        &self.inner.guard
    }

    /// Returns the tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        self.inner.executor.tools()
    }

    /// Returns the completion model name.
    pub fn model_name(&self) -> &str {
        self.inner.executor.model_name()
    }

    async fn run_turn(
        inner: &ChatServiceInner,
        messages: Vec<ChatMessage>,
        events: Option<&mpsc::Sender<ChatEvent>>,
    ) -> Result<ChatResponse> {
        if !matches!(messages.last(), Some(ChatMessage::User { .. })) {
            return Err(Error::agent("conversation must end with a user message"));
        }

        if !inner.guard.ensure_ready().await {
            tracing::warn!(
                target: TRACING_TARGET,
                "Vector store unavailable, semantic search returns no results"
            );
        }

        inner.executor.run(messages, events).await
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("guard", &self.inner.guard)
            .field("executor", &self.inner.executor)
            .finish()
    }
}
