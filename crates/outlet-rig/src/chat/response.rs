//! Chat response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

/// Why a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    /// The model produced a final answer.
    Stop,
    /// The step budget ran out; the content is the best partial answer.
    StepBudgetExhausted,
}

/// Complete answer of one conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique message ID.
    pub id: Uuid,

    /// Answer text.
    pub content: String,

    /// Model used for completion.
    pub model: String,

    /// Number of model round trips taken.
    pub steps: usize,

    /// Why the turn ended.
    pub finish_reason: FinishReason,

    /// When the answer was produced.
    pub created_at: Timestamp,
}

impl ChatResponse {
    /// Creates a new chat response.
    pub fn new(
        content: impl Into<String>,
        model: impl Into<String>,
        steps: usize,
        finish_reason: FinishReason,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            model: model.into(),
            steps,
            finish_reason,
            created_at: Timestamp::now(),
        }
    }
}
