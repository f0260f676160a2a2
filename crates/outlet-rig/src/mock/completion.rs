//! Language models that run without a provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};

use crate::provider::{ChatMessage, LanguageModel, ModelRequest, ModelTurn};
use crate::tool::ToolCall;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Script {
    turns: VecDeque<ModelTurn>,
    repeat: Option<ModelTurn>,
    failure: Option<String>,
    requests: Vec<ModelRequest>,
}

/// Model that replays a fixed sequence of turns.
///
/// Every request is recorded. Clones share the script and the record.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    /// Replays `turns` in order, then fails.
    pub fn new(turns: impl IntoIterator<Item = ModelTurn>) -> Self {
        let script = Script {
            turns: turns.into_iter().collect(),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
            delay: None,
        }
    }

    /// Answers every request with `turn`.
    pub fn repeating(turn: ModelTurn) -> Self {
        let script = Script {
            repeat: Some(turn),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
            delay: None,
        }
    }

    /// Fails every request with a provider error.
    pub fn failing(message: impl Into<String>) -> Self {
        let script = Script {
            failure: Some(message.into()),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
            delay: None,
        }
    }

    /// Delays every response.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ModelRequest) -> Result<ModelTurn> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.lock();
        script.requests.push(request);

        if let Some(message) = &script.failure {
            return Err(Error::provider("scripted", message));
        }
        if let Some(turn) = script.turns.pop_front() {
            return Ok(turn);
        }
        script
            .repeat
            .clone()
            .ok_or_else(|| Error::provider("scripted", "script exhausted"))
    }
}

/// Model that searches for every user message and reads back the results.
///
/// Useful for running the whole stack offline: a user message turns into a
/// `semanticSearch` call and the tool output turns into a plain answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalEchoModel;

impl RetrievalEchoModel {
    fn summarize(output: &Value) -> String {
        if let Some(error) = output.get("error").and_then(Value::as_str) {
            return format!("I couldn't look that up right now ({error}).");
        }

        let contents: Vec<&str> = output
            .get("relevantOutlets")
            .and_then(Value::as_array)
            .map(|outlets| {
                outlets
                    .iter()
                    .filter_map(|outlet| outlet.get("content").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        if contents.is_empty() {
            return "I couldn't find any outlets matching that.".to_string();
        }

        format!("Here is what I found:\n\n{}", contents.join("\n\n"))
    }
}

#[async_trait::async_trait]
impl LanguageModel for RetrievalEchoModel {
    fn model_name(&self) -> &str {
        "retrieval-echo"
    }

    async fn complete(&self, request: ModelRequest) -> Result<ModelTurn> {
        let turn = match request.messages.last() {
            Some(ChatMessage::User { content }) => ModelTurn::tool_calls(vec![
                ToolCall::generated("semanticSearch", json!({ "query": content })),
            ]),
            Some(ChatMessage::Tool { content, .. }) => ModelTurn::text(Self::summarize(content)),
            _ => ModelTurn::text("How can I help you find an outlet?"),
        };

        Ok(turn)
    }
}
