//! Semantic search over the outlet index.

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{OutletTool, ToolError, definition_of};
use crate::rag::RetrievalEngine;

/// Arguments for semantic search.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SemanticSearchArgs {
    /// What the user is looking for, in natural language
    pub query: String,
}

/// A retrieved outlet document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevantOutlet {
    pub content: String,
    pub name: String,
    /// Cosine similarity rounded to two decimals.
    pub similarity: f64,
}

/// Output of semantic search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSearchOutput {
    pub relevant_outlets: Vec<RelevantOutlet>,
}

/// Tool that queries the [`RetrievalEngine`].
#[derive(Debug, Clone)]
pub struct SemanticSearchTool {
    engine: RetrievalEngine,
}

impl SemanticSearchTool {
    /// Creates a new semantic search tool.
    pub fn new(engine: RetrievalEngine) -> Self {
        Self { engine }
    }
}

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Tool for SemanticSearchTool {
    type Args = SemanticSearchArgs;
    type Error = ToolError;
    type Output = SemanticSearchOutput;

    const NAME: &'static str = "semanticSearch";

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of::<Self>().unwrap_or_else(|_| ToolDefinition {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            parameters: serde_json::json!({ "type": "object" }),
        })
    }

    #[tracing::instrument(skip(self, args), fields(tool = Self::NAME, query_len = args.query.len()))]
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let results = self.engine.query(&args.query).await?;

        let relevant_outlets: Vec<RelevantOutlet> = results
            .into_iter()
            .map(|result| RelevantOutlet {
                content: result.content,
                name: result.metadata.name,
                similarity: round2(result.similarity),
            })
            .collect();

        tracing::debug!(result_count = relevant_outlets.len(), "semanticSearch completed");
        Ok(SemanticSearchOutput { relevant_outlets })
    }
}

impl OutletTool for SemanticSearchTool {
    const DESCRIPTION: &'static str = "Search the outlet knowledge base by meaning. \
        Use this first for every question about outlets, their locations or opening hours.";
}
