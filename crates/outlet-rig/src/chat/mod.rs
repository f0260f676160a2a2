//! Conversation turns over the outlet tools.
//!
//! - [`ChatService`] runs one turn per request: it makes sure the index is
//!   built, then drives the [`agent`] loop
//! - [`ChatStream`] delivers the turn's [`ChatEvent`]s
//! - [`ChatResponse`] is the final answer carried by [`ChatEvent::Done`]

pub mod agent;
mod event;
mod response;
mod service;
mod stream;

pub use agent::{AgentConfig, AgentExecutor, AgentState, DEFAULT_MAX_STEPS, DEFAULT_SYSTEM_PROMPT};
pub use event::ChatEvent;
pub use response::{ChatResponse, FinishReason};
pub use service::ChatService;
pub use stream::ChatStream;
