//! Model providers.
//!
//! The rest of the crate talks to models through two seams:
//! - [`Embedder`] turns text into fixed-length vectors
//! - [`LanguageModel`] runs one completion round trip with tool definitions
//!
//! [`EmbeddingProvider`] and [`CompletionProvider`] implement them on top of
//! rig's OpenAI client.

mod completion;
mod config;
mod embedding;

pub use completion::{ChatMessage, CompletionProvider, LanguageModel, ModelRequest, ModelTurn};
pub use config::{
    DEFAULT_COMPLETION_MODEL, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
    ProviderConfig,
};
pub use embedding::{Embedder, EmbeddingProvider};
