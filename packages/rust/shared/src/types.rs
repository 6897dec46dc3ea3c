//! Core domain types for the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Stable product identifier. The only record field guaranteed stable across
/// catalog edits.
pub type ProductId = u64;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ProductRecord
// ---------------------------------------------------------------------------

/// One entry of `products.json`. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique, stable product id.
    pub id: ProductId,
    /// Display title; may carry promotional prefixes.
    pub title: String,
    /// Original price.
    pub price: f64,
    /// Sale price, expected to be `<= price`.
    pub sale_price: f64,
    /// Image URL; empty when the catalog has none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_link: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// DescriptionIndex
// ---------------------------------------------------------------------------

/// Mapping from product id (as text) to a free-text description.
///
/// Loaded once per run and shared read-only by every worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptionIndex(BTreeMap<String, String>);

impl DescriptionIndex {
    /// An index with no entries; every lookup falls back to the template.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up the description for a product id.
    pub fn get(&self, id: ProductId) -> Option<&str> {
        self.0.get(&id.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ProductId, String)> for DescriptionIndex {
    fn from_iter<I: IntoIterator<Item = (ProductId, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, text)| (id.to_string(), text))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_parses_integer_prices_and_null_image() {
        let json = r#"{"id": 7, "title": "عرض جهاز", "price": 200, "sale_price": 150, "image_link": null}"#;
        let record: ProductRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.id, 7);
        assert_eq!(record.price, 200.0);
        assert_eq!(record.image_link, "");
    }

    #[test]
    fn record_tolerates_missing_image_and_extra_fields() {
        let json = r#"{"id": 3, "title": "x", "price": 10.5, "sale_price": 9, "brand": "n/a"}"#;
        let record: ProductRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.image_link, "");
        assert_eq!(record.sale_price, 9.0);
    }

    #[test]
    fn description_index_lookup_by_numeric_id() {
        let json = r#"{"7": "وصف المنتج", "9": "other"}"#;
        let index: DescriptionIndex = serde_json::from_str(json).expect("parse index");
        assert_eq!(index.get(7), Some("وصف المنتج"));
        assert_eq!(index.get(8), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn run_id_display_is_uuid() {
        let id = RunId::new();
        assert_eq!(id.to_string().len(), 36);
    }
}
