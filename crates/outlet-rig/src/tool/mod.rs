//! Tools the model can call.
//!
//! Every tool is a rig [`Tool`] whose argument type derives
//! [`JsonSchema`](schemars::JsonSchema). The [`ToolRegistry`] generates the
//! parameter schema from that type, validates incoming arguments against it
//! and only then invokes the tool. Failures come back as structured
//! [`ToolResult`]s instead of errors.

mod error;
mod list_outlets;
mod nearby_outlets;
mod outlet_details;
mod registry;
mod schema;
mod semantic_search;

pub use error::ToolError;
pub use list_outlets::{ListOutletsArgs, ListOutletsOutput, ListOutletsTool, OutletSummary};
pub use nearby_outlets::{NearbyOutlet, NearbyOutletsArgs, NearbyOutletsOutput, NearbyOutletsTool};
pub use outlet_details::{OutletDetailsArgs, OutletDetailsOutput, OutletDetailsTool};
pub use registry::{ToolHandler, ToolRegistry};
pub use rig::completion::ToolDefinition;
use rig::tool::Tool;
pub use schema::{definition_of, parameters_schema};
pub use semantic_search::{
    RelevantOutlet, SemanticSearchArgs, SemanticSearchOutput, SemanticSearchTool,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A rig tool whose arguments carry a JSON schema.
pub trait OutletTool: Tool<Args: schemars::JsonSchema> + 'static {
    /// Description shown to the model.
    const DESCRIPTION: &'static str;
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the result.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Creates a tool call with a fresh id.
    pub fn generated(name: impl Into<String>, arguments: Value) -> Self {
        Self::new(format!("call_{}", Uuid::now_v7().simple()), name, arguments)
    }
}

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call this answers.
    pub call_id: String,
    /// Tool name.
    pub name: String,
    /// Tool output, or `{"error": "..."}` on failure.
    pub output: Value,
    /// Whether the call failed.
    pub is_error: bool,
}

impl ToolResult {
    /// Creates a successful result.
    pub fn success(call: &ToolCall, output: Value) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            output,
            is_error: false,
        }
    }

    /// Creates a failed result carrying an error payload.
    pub fn failure(call: &ToolCall, message: impl std::fmt::Display) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            output: serde_json::json!({ "error": message.to_string() }),
            is_error: true,
        }
    }
}
