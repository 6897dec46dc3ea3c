//! Read-only comparison of the catalog against the output directory.

use std::collections::BTreeSet;

use serde::Serialize;

use catalogc_products::resolve;
use catalogc_shared::{ProductId, ProductRecord, Result, RunConfig};

use crate::store::{Located, ProductStore, document_id};

/// What is on disk relative to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub catalog_records: usize,
    /// Records whose document exists under its canonical name.
    pub documents_present: usize,
    /// Records whose document exists only under an older name.
    pub stale_documents: Vec<ProductId>,
    /// Records with no document at all.
    pub missing: Vec<ProductId>,
    /// Document files that belong to no catalog record. Never deleted.
    pub orphans: Vec<String>,
    pub feed_present: bool,
    pub sitemap_present: bool,
}

impl StatusReport {
    /// Whether every record has its canonical document and both artifacts exist.
    pub fn is_complete(&self) -> bool {
        self.stale_documents.is_empty()
            && self.missing.is_empty()
            && self.feed_present
            && self.sitemap_present
    }
}

pub(crate) fn collect_status(
    records: &[ProductRecord],
    store: &ProductStore,
    run: &RunConfig,
) -> Result<StatusReport> {
    let names = store.list()?;
    let mut report = StatusReport {
        catalog_records: records.len(),
        feed_present: run.feed_path().is_file(),
        sitemap_present: run.sitemap_path().is_file(),
        ..Default::default()
    };

    let mut claimed = BTreeSet::new();
    for record in records {
        let slug = resolve(record);
        match store.locate(&names, record.id, &slug) {
            Some(Located::Canonical(_)) => report.documents_present += 1,
            Some(Located::Stale(_)) => report.stale_documents.push(record.id),
            None => report.missing.push(record.id),
        }
        claimed.insert(record.id);
    }

    report.orphans = names
        .into_iter()
        .filter(|name| document_id(name).is_none_or(|id| !claimed.contains(&id)))
        .collect();

    Ok(report)
}
