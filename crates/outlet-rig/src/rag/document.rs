//! Documents derived from outlet records.

use outlet_catalog::Outlet;
use serde::Serialize;

/// Placeholder used when an outlet has no published hours.
const HOURS_NOT_LISTED: &str = "Not listed";

/// Text form of an outlet, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletDocument {
    /// Composed text: name, address and hours, in that order.
    pub content: String,
    /// The outlet the document was built from.
    pub metadata: Outlet,
}

impl OutletDocument {
    /// Builds the document for an outlet.
    ///
    /// The template is fixed so the same record always embeds identically.
    pub fn from_outlet(outlet: &Outlet) -> Self {
        let hours = outlet
            .operating_hours
            .as_deref()
            .filter(|hours| !hours.trim().is_empty())
            .unwrap_or(HOURS_NOT_LISTED);

        Self {
            content: format!(
                "{}\nAddress: {}\nOperating hours: {}",
                outlet.name, outlet.address, hours
            ),
            metadata: outlet.clone(),
        }
    }
}

/// A document together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub document: OutletDocument,
    pub embedding: Vec<f64>,
}

/// A ranked match returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub content: String,
    pub metadata: Outlet,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f64,
}
