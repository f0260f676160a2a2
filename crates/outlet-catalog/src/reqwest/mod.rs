//! Reqwest-based HTTP client for the remote outlet catalog.
//!
//! This module provides a reqwest-based implementation of the
//! [`CatalogProvider`](crate::CatalogProvider) trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use outlet_catalog::reqwest::{ReqwestClient, ReqwestConfig};
//! use outlet_catalog::CatalogService;
//!
//! let client = ReqwestClient::new(ReqwestConfig::default())?;
//! let service: CatalogService = client.into_service();
//! ```

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::ReqwestConfig;
pub use error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "outlet_catalog::reqwest";
