//! Proximity search around a coordinate.

use outlet_catalog::{CatalogService, DEFAULT_RADIUS_KM, GeoPoint, Outlet};
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{OutletTool, ToolError, definition_of};

fn default_radius() -> f64 {
    DEFAULT_RADIUS_KM
}

/// Arguments for a proximity search.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NearbyOutletsArgs {
    /// Latitude of the search centre in degrees
    pub lat: f64,
    /// Longitude of the search centre in degrees
    pub long: f64,
    /// Search radius in kilometres
    #[serde(default = "default_radius")]
    pub radius: f64,
}

/// An outlet within the search radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyOutlet {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub operating_hours: Option<String>,
    /// Distance from the search centre in kilometres.
    pub distance: f64,
}

/// Output of a proximity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyOutletsOutput {
    pub outlets: Vec<NearbyOutlet>,
    pub count: usize,
    pub radius: f64,
}

/// Tool that finds outlets near a coordinate.
#[derive(Debug, Clone)]
pub struct NearbyOutletsTool {
    catalog: CatalogService,
}

impl NearbyOutletsTool {
    /// Creates a new proximity tool.
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

impl NearbyOutlet {
    fn from_outlet(outlet: Outlet, distance: f64) -> Self {
        Self {
            id: outlet.id,
            name: outlet.name,
            address: outlet.address,
            operating_hours: outlet.operating_hours,
            distance,
        }
    }
}

impl Tool for NearbyOutletsTool {
    type Args = NearbyOutletsArgs;
    type Error = ToolError;
    type Output = NearbyOutletsOutput;

    const NAME: &'static str = "nearbyOutlets";

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of::<Self>().unwrap_or_else(|_| ToolDefinition {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            parameters: serde_json::json!({ "type": "object" }),
        })
    }

    #[tracing::instrument(skip(self), fields(tool = Self::NAME))]
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let origin = GeoPoint::new(args.lat, args.long);
        if !origin.is_valid() {
            return Err(ToolError::InvalidArguments(format!(
                "coordinates ({}, {}) are out of range",
                args.lat, args.long
            )));
        }
        if !args.radius.is_finite() || args.radius <= 0.0 {
            return Err(ToolError::InvalidArguments(format!(
                "radius must be a positive number of kilometres, got {}",
                args.radius
            )));
        }

        let outlets: Vec<NearbyOutlet> = self
            .catalog
            .nearby_outlets(origin, args.radius)
            .await?
            .into_iter()
            .filter_map(|outlet| {
                let distance = outlet.distance?;
                (distance <= args.radius).then(|| NearbyOutlet::from_outlet(outlet, distance))
            })
            .collect();

        tracing::debug!(result_count = outlets.len(), "nearbyOutlets completed");
        Ok(NearbyOutletsOutput {
            count: outlets.len(),
            outlets,
            radius: args.radius,
        })
    }
}

impl OutletTool for NearbyOutletsTool {
    const DESCRIPTION: &'static str = "Find outlets within a radius (kilometres, default 5) \
        of a latitude/longitude, nearest first.";
}

#[cfg(test)]
mod tests {
    use outlet_catalog::InMemoryCatalog;

    use super::*;
    use crate::mock::sample_outlets;

    fn tool() -> NearbyOutletsTool {
        NearbyOutletsTool::new(InMemoryCatalog::new(sample_outlets()).into_service())
    }

    fn args(lat: f64, long: f64, radius: f64) -> NearbyOutletsArgs {
        NearbyOutletsArgs { lat, long, radius }
    }

    #[tokio::test]
    async fn test_never_exceeds_radius() {
        let output = tool().call(args(3.128099, 101.678678, 5.0)).await.unwrap();

        assert_eq!(output.count, 1);
        assert_eq!(output.radius, 5.0);
        assert!(output.outlets.iter().all(|o| o.distance <= 5.0));
        assert_eq!(output.outlets[0].id, 1);
    }

    #[tokio::test]
    async fn test_empty_when_nothing_within_radius() {
        let output = tool().call(args(3.139, 101.6869, 1.0)).await.unwrap();

        assert!(output.outlets.is_empty());
        assert_eq!(output.count, 0);
        assert_eq!(output.radius, 1.0);
    }

    #[tokio::test]
    async fn test_sorted_by_distance() {
        let output = tool().call(args(3.151251, 101.615116, 20.0)).await.unwrap();

        let ids: Vec<i64> = output.outlets.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_default_radius() {
        let args: NearbyOutletsArgs =
            serde_json::from_value(serde_json::json!({"lat": 3.1, "long": 101.6})).unwrap();
        assert_eq!(args.radius, 5.0);
    }

    #[tokio::test]
    async fn test_rejects_invalid_input() {
        assert!(matches!(
            tool().call(args(95.0, 101.0, 5.0)).await,
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            tool().call(args(3.1, 101.6, 0.0)).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
