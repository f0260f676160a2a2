//! Agent executor that runs the conversation loop.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;

use super::{AgentConfig, AgentState};
use crate::chat::{ChatEvent, ChatResponse, FinishReason};
use crate::provider::{ChatMessage, LanguageModel, ModelRequest, ModelTurn};
use crate::tool::ToolRegistry;
use crate::{Error, Result, TRACING_TARGET};

/// Answer used when the budget runs out before the model wrote any text.
const BUDGET_EXHAUSTED_ANSWER: &str = "Sorry, I couldn't finish looking that up. \
    Please try asking again, perhaps more specifically.";

/// Capacity of the per-round-trip text delta channel.
const DELTA_BUFFER: usize = 32;

/// Runs the agent loop for one conversation turn.
#[derive(Clone)]
pub struct AgentExecutor {
    config: AgentConfig,
    tools: Arc<ToolRegistry>,
    model: Arc<dyn LanguageModel>,
}

impl AgentExecutor {
    /// Creates a new executor.
    pub fn new(config: AgentConfig, tools: Arc<ToolRegistry>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            config,
            tools,
            model,
        }
    }

    /// Returns the loop configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Runs the loop until the model answers or the step budget runs out.
    ///
    /// Tool calls, tool results and the answer text are sent to `events`
    /// as they happen. The final [`ChatEvent::Done`] is left to the caller.
    pub async fn run(
        &self,
        messages: Vec<ChatMessage>,
        events: Option<&mpsc::Sender<ChatEvent>>,
    ) -> Result<ChatResponse> {
        let mut history = messages;
        let mut state = AgentState::Idle;
        let mut steps = 0;
        let mut partial = String::new();

        loop {
            tracing::trace!(target: TRACING_TARGET, state = state.name(), steps, "Agent state");

            state = match state {
                AgentState::Idle => {
                    if history.is_empty() {
                        return Err(Error::agent("conversation has no messages"));
                    }
                    AgentState::AwaitingModel
                }

                AgentState::AwaitingModel if steps >= self.config.max_steps => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        steps,
                        max_steps = self.config.max_steps,
                        "Step budget exhausted"
                    );

                    // Partial text was already streamed as it arrived.
                    let content = if partial.is_empty() {
                        emit(events, ChatEvent::TextDelta {
                            delta: BUDGET_EXHAUSTED_ANSWER.to_string(),
                        })
                        .await?;
                        BUDGET_EXHAUSTED_ANSWER.to_string()
                    } else {
                        partial.clone()
                    };

                    AgentState::Done(Box::new(ChatResponse::new(
                        content,
                        self.model.model_name(),
                        steps,
                        FinishReason::StepBudgetExhausted,
                    )))
                }

                AgentState::AwaitingModel => {
                    steps += 1;
                    let request = ModelRequest {
                        system_prompt: self.config.system_prompt.clone(),
                        messages: history.clone(),
                        tools: self.tools.definitions(),
                    };

                    let turn = self.request_turn(request, events).await?;
                    tracing::debug!(
                        target: TRACING_TARGET,
                        step = steps,
                        text_len = turn.text.len(),
                        tool_calls = turn.tool_calls.len(),
                        "Model turn received"
                    );

                    if !turn.text.is_empty() {
                        partial.clone_from(&turn.text);
                    }

                    if turn.is_final() {
                        AgentState::FinalAnswer(partial.clone())
                    } else {
                        history.push(ChatMessage::assistant_with_tools(
                            turn.text,
                            turn.tool_calls.clone(),
                        ));
                        AgentState::ToolRequested(turn.tool_calls)
                    }
                }

                AgentState::ToolRequested(calls) => {
                    for call in &calls {
                        emit(events, ChatEvent::ToolCall { call: call.clone() }).await?;
                    }

                    // join_all yields results in input order.
                    let results = join_all(calls.iter().map(|call| self.tools.execute(call))).await;

                    for result in results {
                        history.push(ChatMessage::tool(&result));
                        emit(events, ChatEvent::ToolResult { result }).await?;
                    }

                    AgentState::AwaitingModel
                }

                AgentState::FinalAnswer(content) => {
                    AgentState::Done(Box::new(ChatResponse::new(
                        content,
                        self.model.model_name(),
                        steps,
                        FinishReason::Stop,
                    )))
                }

                AgentState::Done(response) => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        steps = response.steps,
                        finish_reason = %response.finish_reason,
                        content_len = response.content.len(),
                        "Conversation turn finished"
                    );
                    return Ok(*response);
                }
            };
        }
    }

    /// Runs one model round trip.
    ///
    /// With an event channel the answer text is streamed as
    /// [`ChatEvent::TextDelta`]s while the model produces it.
    async fn request_turn(
        &self,
        request: ModelRequest,
        events: Option<&mpsc::Sender<ChatEvent>>,
    ) -> Result<ModelTurn> {
        if events.is_none() {
            return self.model.complete(request).await;
        }

        let (deltas, mut received) = mpsc::channel(DELTA_BUFFER);
        let forward = async move {
            while let Some(delta) = received.recv().await {
                emit(events, ChatEvent::TextDelta { delta }).await?;
            }
            Ok::<(), Error>(())
        };

        let (turn, forwarded) = tokio::join!(self.model.stream(request, deltas), forward);
        forwarded?;
        turn
    }
}

async fn emit(events: Option<&mpsc::Sender<ChatEvent>>, event: ChatEvent) -> Result<()> {
    let Some(events) = events else {
        return Ok(());
    };

    events
        .send(event)
        .await
        .map_err(|_| Error::agent("event stream closed"))
}

impl std::fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("model", &self.model.model_name())
            .field("max_steps", &self.config.max_steps)
            .field("tools", &self.tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rig::tool::Tool;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::mock::ScriptedModel;
    use crate::tool::{OutletTool, ToolCall, ToolDefinition, ToolError, definition_of};

    #[derive(Debug, Deserialize, JsonSchema)]
    struct SleepArgs {
        label: String,
        delay_ms: u64,
    }

    #[derive(Debug, Clone)]
    struct SleepTool;

    impl Tool for SleepTool {
        type Args = SleepArgs;
        type Error = ToolError;
        type Output = Value;

        const NAME: &'static str = "sleep";

        async fn definition(&self, _prompt: String) -> ToolDefinition {
            definition_of::<Self>().unwrap()
        }

        async fn call(&self, args: Self::Args) -> std::result::Result<Self::Output, Self::Error> {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
            Ok(json!({ "label": args.label }))
        }
    }

    impl OutletTool for SleepTool {
        const DESCRIPTION: &'static str = "Sleep, then echo the label";
    }

    fn sleep_call(id: &str, delay_ms: u64) -> ToolCall {
        ToolCall::new(id, "sleep", json!({ "label": id, "delay_ms": delay_ms }))
    }

    fn executor(model: &ScriptedModel, max_steps: usize) -> AgentExecutor {
        let mut tools = ToolRegistry::new();
        tools.register(SleepTool).unwrap();

        AgentExecutor::new(
            AgentConfig::default().with_max_steps(max_steps),
            Arc::new(tools),
            Arc::new(model.clone()),
        )
    }

    /// Streams the scripted answer one word at a time.
    #[derive(Debug, Clone)]
    struct WordStreamingModel(ScriptedModel);

    #[async_trait::async_trait]
    impl LanguageModel for WordStreamingModel {
        fn model_name(&self) -> &str {
            self.0.model_name()
        }

        async fn complete(&self, request: ModelRequest) -> Result<ModelTurn> {
            self.0.complete(request).await
        }

        async fn stream(
            &self,
            request: ModelRequest,
            deltas: mpsc::Sender<String>,
        ) -> Result<ModelTurn> {
            let turn = self.0.complete(request).await?;
            for word in turn.text.split_inclusive(' ') {
                let _ = deltas.send(word.to_string()).await;
            }
            Ok(turn)
        }
    }

    fn deltas(events: &[ChatEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|event| match event {
                ChatEvent::TextDelta { delta } => Some(delta.as_str()),
                _ => None,
            })
            .collect()
    }

    async fn drain(mut rx: mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_final_answer_in_one_step() {
        let model = ScriptedModel::new([ModelTurn::text("Bangsar opens at 8 AM.")]);
        let executor = executor(&model, 5);

        let response = executor
            .run(vec![ChatMessage::user("When does Bangsar open?")], None)
            .await
            .unwrap();

        assert_eq!(response.content, "Bangsar opens at 8 AM.");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.steps, 1);
        assert_eq!(response.model, "scripted");

        let request = &model.requests()[0];
        assert_eq!(request.system_prompt, AgentConfig::default().system_prompt);
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_budget_never_exceeded() {
        let turn = ModelTurn::tool_calls(vec![sleep_call("a", 0), sleep_call("b", 0)]);
        let model = ScriptedModel::repeating(turn);
        let executor = executor(&model, 3);

        let response = executor
            .run(vec![ChatMessage::user("loop forever")], None)
            .await
            .unwrap();

        assert_eq!(model.call_count(), 3);
        assert_eq!(response.steps, 3);
        assert_eq!(response.finish_reason, FinishReason::StepBudgetExhausted);
        assert_eq!(response.content, BUDGET_EXHAUSTED_ANSWER);
    }

    #[tokio::test]
    async fn test_budget_keeps_latest_partial_text() {
        let turn = ModelTurn {
            text: "Still checking the outlets".to_string(),
            tool_calls: vec![sleep_call("a", 0)],
        };
        let model = ScriptedModel::repeating(turn);
        let executor = executor(&model, 2);

        let response = executor
            .run(vec![ChatMessage::user("hi")], None)
            .await
            .unwrap();

        assert_eq!(response.content, "Still checking the outlets");
        assert_eq!(response.finish_reason, FinishReason::StepBudgetExhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_results_keep_request_order() {
        let model = ScriptedModel::new([
            ModelTurn::tool_calls(vec![
                sleep_call("slow", 30),
                sleep_call("medium", 20),
                sleep_call("fast", 10),
            ]),
            ModelTurn::text("done"),
        ]);
        let executor = executor(&model, 5);
        let (tx, rx) = mpsc::channel(64);

        let started = tokio::time::Instant::now();
        let response = executor
            .run(vec![ChatMessage::user("go")], Some(&tx))
            .await
            .unwrap();
        let elapsed = started.elapsed();
        drop(tx);

        assert_eq!(response.steps, 2);
        assert!(elapsed < Duration::from_millis(60), "tools ran sequentially");

        let events = drain(rx).await;
        let result_ids: Vec<&str> = events
            .iter()
            .filter_map(|event| match event {
                ChatEvent::ToolResult { result } => Some(result.call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(result_ids, vec!["slow", "medium", "fast"]);

        let second = &model.requests()[1];
        let tool_ids: Vec<&str> = second
            .messages
            .iter()
            .filter_map(|message| match message {
                ChatMessage::Tool { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(tool_ids, vec!["slow", "medium", "fast"]);
        assert!(matches!(
            &second.messages[1],
            ChatMessage::Assistant { tool_calls, .. } if tool_calls.len() == 3
        ));
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let model = ScriptedModel::new([
            ModelTurn::tool_calls(vec![sleep_call("a", 0)]),
            ModelTurn::text("answer"),
        ]);
        let executor = executor(&model, 5);
        let (tx, rx) = mpsc::channel(64);

        executor
            .run(vec![ChatMessage::user("go")], Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let types: Vec<&str> = drain(rx).await.iter().map(ChatEvent::event_type).collect();
        assert_eq!(types, vec!["tool_call", "tool_result", "text_delta"]);
    }

    #[tokio::test]
    async fn test_answer_streams_in_chunks() {
        let model = WordStreamingModel(ScriptedModel::new([ModelTurn::text(
            "Bangsar opens at 8 AM.",
        )]));
        let executor = AgentExecutor::new(
            AgentConfig::default(),
            Arc::new(ToolRegistry::new()),
            Arc::new(model),
        );
        let (tx, rx) = mpsc::channel(64);

        let response = executor
            .run(vec![ChatMessage::user("When does Bangsar open?")], Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let events = drain(rx).await;
        assert_eq!(deltas(&events), vec!["Bangsar ", "opens ", "at ", "8 ", "AM."]);
        assert_eq!(deltas(&events).concat(), response.content);
        assert_eq!(events.len(), 5);
    }

    #[tokio::test]
    async fn test_budget_does_not_repeat_streamed_text() {
        let turn = ModelTurn {
            text: "Still checking the outlets".to_string(),
            tool_calls: vec![sleep_call("a", 0)],
        };
        let model = ScriptedModel::repeating(turn);
        let executor = executor(&model, 2);
        let (tx, rx) = mpsc::channel(64);

        let response = executor
            .run(vec![ChatMessage::user("hi")], Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let events = drain(rx).await;
        let types: Vec<&str> = events.iter().map(ChatEvent::event_type).collect();
        assert_eq!(types, vec![
            "text_delta",
            "tool_call",
            "tool_result",
            "text_delta",
            "tool_call",
            "tool_result",
        ]);
        assert_eq!(response.content, "Still checking the outlets");
        assert_eq!(response.finish_reason, FinishReason::StepBudgetExhausted);
    }

    #[tokio::test]
    async fn test_budget_without_text_streams_apology() {
        let model = ScriptedModel::repeating(ModelTurn::tool_calls(vec![sleep_call("a", 0)]));
        let executor = executor(&model, 1);
        let (tx, rx) = mpsc::channel(64);

        executor
            .run(vec![ChatMessage::user("hi")], Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let events = drain(rx).await;
        assert_eq!(deltas(&events), vec![BUDGET_EXHAUSTED_ANSWER]);
    }

    #[tokio::test]
    async fn test_invalid_tool_call_is_reported_to_model() {
        let model = ScriptedModel::new([
            ModelTurn::tool_calls(vec![ToolCall::new("bad", "sleep", json!({"label": 1}))]),
            ModelTurn::text("sorry"),
        ]);
        let executor = executor(&model, 5);

        executor
            .run(vec![ChatMessage::user("go")], None)
            .await
            .unwrap();

        let second = &model.requests()[1];
        match second.messages.last() {
            Some(ChatMessage::Tool { content, .. }) => assert!(content["error"].is_string()),
            other => panic!("expected tool message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = ScriptedModel::failing("rate limited");
        let executor = executor(&model, 5);

        let error = executor
            .run(vec![ChatMessage::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Provider { .. }));
    }

    #[tokio::test]
    async fn test_empty_conversation() {
        let model = ScriptedModel::new([]);
        let executor = executor(&model, 5);

        assert!(executor.run(Vec::new(), None).await.is_err());
        assert_eq!(model.call_count(), 0);
    }
}
