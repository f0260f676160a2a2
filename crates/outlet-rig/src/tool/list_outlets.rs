//! Outlet listing with optional name/address filter.

use outlet_catalog::{CatalogService, Outlet};
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{OutletTool, ToolError, definition_of};

/// Arguments for listing outlets.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListOutletsArgs {
    /// Optional text to match against outlet names and addresses
    #[serde(default)]
    pub query: Option<String>,
}

/// Summary of an outlet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletSummary {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub operating_hours: Option<String>,
}

impl From<Outlet> for OutletSummary {
    fn from(outlet: Outlet) -> Self {
        Self {
            id: outlet.id,
            name: outlet.name,
            address: outlet.address,
            operating_hours: outlet.operating_hours,
        }
    }
}

/// Output of the listing tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListOutletsOutput {
    pub outlets: Vec<OutletSummary>,
}

/// Tool that lists catalog outlets.
#[derive(Debug, Clone)]
pub struct ListOutletsTool {
    catalog: CatalogService,
}

impl ListOutletsTool {
    /// Creates a new listing tool.
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

impl Tool for ListOutletsTool {
    type Args = ListOutletsArgs;
    type Error = ToolError;
    type Output = ListOutletsOutput;

    const NAME: &'static str = "listOutlets";

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of::<Self>().unwrap_or_else(|_| ToolDefinition {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            parameters: serde_json::json!({ "type": "object" }),
        })
    }

    #[tracing::instrument(skip(self, args), fields(tool = Self::NAME, query = ?args.query))]
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let outlets = match args.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => self.catalog.search_outlets(query).await?,
            _ => self.catalog.list_outlets().await?,
        };

        let outlets: Vec<OutletSummary> = outlets.into_iter().map(OutletSummary::from).collect();

        tracing::debug!(result_count = outlets.len(), "listOutlets completed");
        Ok(ListOutletsOutput { outlets })
    }
}

impl OutletTool for ListOutletsTool {
    const DESCRIPTION: &'static str = "List all outlets, or only those whose name or address \
        contains the given text (case-insensitive).";
}

#[cfg(test)]
mod tests {
    use outlet_catalog::InMemoryCatalog;

    use super::*;
    use crate::mock::{CountingCatalog, sample_outlets};

    fn tool() -> ListOutletsTool {
        ListOutletsTool::new(InMemoryCatalog::new(sample_outlets()).into_service())
    }

    #[tokio::test]
    async fn test_lists_everything_without_query() {
        let output = tool().call(ListOutletsArgs::default()).await.unwrap();
        assert_eq!(output.outlets.len(), 2);
    }

    #[tokio::test]
    async fn test_filters_by_name_or_address() {
        let output = tool()
            .call(ListOutletsArgs {
                query: Some("BANGSAR".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(output.outlets.len(), 1);
        assert_eq!(output.outlets[0].id, 1);

        let output = tool()
            .call(ListOutletsArgs {
                query: Some("petaling jaya".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(output.outlets.len(), 1);
        assert_eq!(output.outlets[0].id, 2);
    }

    #[tokio::test]
    async fn test_query_goes_through_catalog_search() {
        let catalog = CountingCatalog::new(sample_outlets());
        let tool = ListOutletsTool::new(CatalogService::new(catalog.clone()));

        let output = tool
            .call(ListOutletsArgs {
                query: Some("  bangsar ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(output.outlets.len(), 1);
        assert_eq!(catalog.search_calls(), 1);
        assert_eq!(catalog.list_calls(), 0);

        let output = tool
            .call(ListOutletsArgs {
                query: Some("   ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(output.outlets.len(), 2);
        assert_eq!(catalog.search_calls(), 1);
        assert_eq!(catalog.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let output = tool()
            .call(ListOutletsArgs {
                query: Some("one utama".to_string()),
            })
            .await
            .unwrap();

        let json = serde_json::to_value(&output).unwrap();
        let outlet = &json["outlets"][0];
        assert_eq!(outlet["id"], 2);
        assert_eq!(outlet["operatingHours"], "0800 - 2200 (Sun - Thur)");
        assert!(outlet.get("lat").is_none());
    }
}
