//! Conversation handler streaming agent events.
//!
//! `POST /api/chat` answers with Server-Sent Events, one per [`ChatEvent`].
//! The SSE event name is the event's `type`. Every stream ends with a
//! `done` or an `error` event. Closing the connection drops the stream,
//! which aborts the conversation turn.

use std::convert::Infallible;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::post;
use futures::{Stream, StreamExt};
use outlet_rig::chat::{ChatEvent, ChatService};
use outlet_rig::provider::ChatMessage;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::extract::ValidateJson;
use crate::handler::Result;
use crate::service::ServiceState;

/// Tracing target for conversation operations.
const TRACING_TARGET: &str = "outlet_server::handler::chat";

/// Maximum number of messages accepted in one request.
const MAX_MESSAGES: u64 = 100;

/// Author of a message in the request history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of the request history.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatMessageRequest {
    /// Message author.
    pub role: ChatRole,
    /// Message text.
    #[validate(length(min = 1, max = 4000, message = "Message content must not be empty"))]
    pub content: String,
}

impl From<ChatMessageRequest> for ChatMessage {
    fn from(message: ChatMessageRequest) -> Self {
        match message.role {
            ChatRole::User => ChatMessage::user(message.content),
            ChatRole::Assistant => ChatMessage::assistant(message.content),
        }
    }
}

/// Request body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ends_with_user"))]
pub struct ChatRequest {
    /// Conversation so far, oldest first, ending with the user's message.
    #[validate(length(
        min = 1,
        max = MAX_MESSAGES,
        message = "Conversation must contain between 1 and 100 messages"
    ))]
    #[validate(nested)]
    pub messages: Vec<ChatMessageRequest>,
}

fn validate_ends_with_user(request: &ChatRequest) -> Result<(), ValidationError> {
    match request.messages.last() {
        Some(message) if message.role == ChatRole::Assistant => {
            Err(ValidationError::new("last_message_role")
                .with_message("The last message must come from the user".into()))
        }
        _ => Ok(()),
    }
}

/// Converts an agent event into an SSE event.
fn to_sse_event(event: &ChatEvent) -> Option<Event> {
    match Event::default().event(event.event_type()).json_data(event) {
        Ok(sse_event) => Some(sse_event),
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET,
                event_type = event.event_type(),
                error = %error,
                "Failed to serialize chat event"
            );
            None
        }
    }
}

/// Runs one conversation turn and streams its events.
#[tracing::instrument(skip_all, fields(messages = request.messages.len()))]
async fn chat(
    State(chat_service): State<ChatService>,
    ValidateJson(request): ValidateJson<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    tracing::debug!(target: TRACING_TARGET, "Starting conversation turn");

    let messages: Vec<ChatMessage> = request.messages.into_iter().map(Into::into).collect();
    let events = chat_service
        .chat(messages)
        .filter_map(|event| futures::future::ready(to_sse_event(&event).map(Ok)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/api/chat", post(chat))
}
