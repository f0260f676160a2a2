//! Lookup of a single outlet.

use outlet_catalog::{CatalogService, Outlet};
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, de};

use super::{OutletTool, ToolError, definition_of};

/// Arguments for an outlet lookup.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OutletDetailsArgs {
    /// Numeric outlet id, as returned by the other tools
    #[serde(deserialize_with = "whole_number")]
    pub id: i64,
}

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// Accepts `7` as well as `7.0`; models often send ids as floats.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Integer(i64),
        Float(f64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Integer(id) => Ok(id),
        RawId::Float(id) if id.fract() == 0.0 && id.abs() <= MAX_EXACT_F64 => Ok(id as i64),
        RawId::Float(id) => Err(de::Error::custom(format!(
            "outlet id must be a whole number, got {id}"
        ))),
    }
}

/// Output of an outlet lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletDetailsOutput {
    pub outlet: Outlet,
}

/// Tool that fetches the full record of one outlet.
#[derive(Debug, Clone)]
pub struct OutletDetailsTool {
    catalog: CatalogService,
}

impl OutletDetailsTool {
    /// Creates a new lookup tool.
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

impl Tool for OutletDetailsTool {
    type Args = OutletDetailsArgs;
    type Error = ToolError;
    type Output = OutletDetailsOutput;

    const NAME: &'static str = "outletDetails";

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of::<Self>().unwrap_or_else(|_| ToolDefinition {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            parameters: serde_json::json!({ "type": "object" }),
        })
    }

    #[tracing::instrument(skip(self), fields(tool = Self::NAME))]
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let outlet = self
            .catalog
            .get_outlet(args.id)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("Outlet {} not found", args.id)))?;

        Ok(OutletDetailsOutput { outlet })
    }
}

impl OutletTool for OutletDetailsTool {
    const DESCRIPTION: &'static str = "Get the full record of one outlet by id: address, \
        opening hours, coordinates and navigation links.";
}
