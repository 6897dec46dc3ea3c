//! Catalog and description-index loading.
//!
//! The catalog is the run's single source of truth: if it cannot be read,
//! parsed, or contains duplicate ids, nothing is written. The description
//! index is optional and every failure degrades to templated descriptions.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use catalogc_shared::{CatalogError, DescriptionIndex, ProductId, ProductRecord, Result};

/// Read and validate the catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<ProductRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CatalogError::catalog(format!("cannot read catalog {}: {e}", path.display()))
    })?;

    let records = parse_catalog(&content)
        .map_err(|e| CatalogError::catalog(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), records = records.len(), "catalog loaded");
    Ok(records)
}

/// Parse a JSON array of records and validate it as a whole.
pub fn parse_catalog(json: &str) -> Result<Vec<ProductRecord>> {
    let records: Vec<ProductRecord> = serde_json::from_str(json)
        .map_err(|e| CatalogError::catalog(format!("malformed catalog: {e}")))?;

    ensure_unique_ids(&records)?;

    for record in records.iter().filter(|r| r.sale_price > r.price) {
        warn!(
            product_id = record.id,
            price = record.price,
            sale_price = record.sale_price,
            "sale price above price, discount clamped to zero"
        );
    }

    Ok(records)
}

/// Reject the batch when two records share an id.
///
/// Ids prefix every output filename, so uniqueness is what keeps concurrent
/// writers on disjoint paths.
pub fn ensure_unique_ids(records: &[ProductRecord]) -> Result<()> {
    let mut seen: BTreeMap<ProductId, usize> = BTreeMap::new();
    for record in records {
        *seen.entry(record.id).or_default() += 1;
    }

    let duplicates: Vec<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, count)| format!("{id} (x{count})"))
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "duplicate product ids: {}",
            duplicates.join(", ")
        )))
    }
}

/// Load the description index, returning an empty index on any failure.
pub fn load_descriptions(path: &Path) -> DescriptionIndex {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no description index, using templates");
            return DescriptionIndex::empty();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "description index unreadable, using templates");
            return DescriptionIndex::empty();
        }
    };

    match serde_json::from_str::<DescriptionIndex>(&content) {
        Ok(index) => {
            info!(path = %path.display(), entries = index.len(), "description index loaded");
            index
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "description index malformed, using templates");
            DescriptionIndex::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("catalogc-catalog-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parses_catalog_array() {
        let json = r#"[
            {"id": 1, "title": "a", "price": 10, "sale_price": 8, "image_link": "https://x/a.jpg"},
            {"id": 2, "title": "b", "price": 5.5, "sale_price": 5.5, "image_link": ""}
        ]"#;
        let records = parse_catalog(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].price, 5.5);
    }

    #[test]
    fn duplicate_ids_reject_the_batch() {
        let json = r#"[
            {"id": 4, "title": "a", "price": 1, "sale_price": 1},
            {"id": 4, "title": "b", "price": 1, "sale_price": 1},
            {"id": 5, "title": "c", "price": 1, "sale_price": 1}
        ]"#;
        let err = parse_catalog(json).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("4 (x2)"));
    }

    #[test]
    fn malformed_catalog_is_fatal() {
        let err = parse_catalog("{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Catalog { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_catalog_is_fatal() {
        let dir = temp_dir();
        let err = load_catalog(&dir.join("products.json")).unwrap_err();
        assert!(err.is_fatal());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn descriptions_degrade_gracefully() {
        let dir = temp_dir();
        assert!(load_descriptions(&dir.join("missing.json")).is_empty());

        let bad = dir.join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert!(load_descriptions(&bad).is_empty());

        let good = dir.join("descriptions.json");
        std::fs::write(&good, r#"{"7": "وصف المنتج"}"#).unwrap();
        let index = load_descriptions(&good);
        assert_eq!(index.get(7), Some("وصف المنتج"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
