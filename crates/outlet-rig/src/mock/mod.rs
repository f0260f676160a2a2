//! Offline providers for tests and local runs.
//!
//! Nothing here talks to the network: the embedder hashes tokens into a
//! bag-of-words vector, the catalog is an in-memory list with call counters
//! and the language models follow a script or echo retrieval results.

mod catalog;
mod completion;
mod embedding;

pub use catalog::{CountingCatalog, sample_outlets};
pub use completion::{RetrievalEchoModel, ScriptedModel};
pub use embedding::{DEFAULT_MOCK_DIMENSIONS, HashingEmbedder};
