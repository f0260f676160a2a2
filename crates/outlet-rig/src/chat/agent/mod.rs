//! Bounded agent loop.
//!
//! One conversation turn moves through [`AgentState`]s:
//!
//! ```text
//! Idle -> AwaitingModel -> ToolRequested -> AwaitingModel -> ... -> FinalAnswer -> Done
//! ```
//!
//! Every entry into `AwaitingModel` costs one step. When the budget runs out
//! the turn ends with the best partial answer instead of another model call.

mod executor;
mod prompt;

pub use executor::AgentExecutor;
pub use prompt::DEFAULT_SYSTEM_PROMPT;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use super::ChatResponse;
use crate::tool::ToolCall;
use crate::{Error, Result};

/// Default number of model round trips per turn.
pub const DEFAULT_MAX_STEPS: usize = 5;

/// Configuration for the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct AgentConfig {
    /// Maximum number of model round trips per conversation turn
    #[cfg_attr(
        feature = "config",
        arg(long = "max-steps", env = "AGENT_MAX_STEPS", default_value = "5")
    )]
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// System prompt sent with every model request.
    #[cfg_attr(feature = "config", arg(skip = DEFAULT_SYSTEM_PROMPT.to_string()))]
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            system_prompt: default_system_prompt(),
        }
    }
}

impl AgentConfig {
    /// Sets the step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::config("max_steps must be greater than 0"));
        }
        Ok(())
    }
}

/// State of the agent loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    /// The turn has not started.
    Idle,
    /// Waiting for the next model round trip.
    AwaitingModel,
    /// The model asked for these tool calls.
    ToolRequested(Vec<ToolCall>),
    /// The model produced its answer.
    FinalAnswer(String),
    /// The turn is over.
    Done(Box<ChatResponse>),
}

impl AgentState {
    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingModel => "awaiting_model",
            Self::ToolRequested(_) => "tool_requested",
            Self::FinalAnswer(_) => "final_answer",
            Self::Done(_) => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_config_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_steps, 5);
        assert!(config.system_prompt.contains("semanticSearch"));
        assert!(config.validate().is_ok());
        assert!(config.with_max_steps(0).validate().is_err());
    }
}
