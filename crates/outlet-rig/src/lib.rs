#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod chat;
mod error;
pub mod provider;
pub mod rag;
pub mod tool;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

pub use error::{Error, Result};

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "outlet_rig";
