//! Emit statistics.

use std::collections::BTreeMap;

use catalogc_products::{ExclusionReason, Verdict};

/// Totals for one emit run. `eligible + excluded_total() == total` always.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// Records in the catalog.
    pub total: usize,
    /// Records written to the feed.
    pub eligible: usize,
    /// Records kept out of the feed, by reason.
    pub excluded: BTreeMap<ExclusionReason, usize>,
    /// Product entries written to the sitemap.
    pub sitemap_entries: usize,
    /// Catalog records left out of the sitemap because their document is missing.
    pub sitemap_missing: usize,
}

impl EmitStats {
    pub fn record_verdict(&mut self, verdict: &Verdict) {
        self.total += 1;
        match verdict.reason() {
            None => self.eligible += 1,
            Some(reason) => *self.excluded.entry(reason).or_default() += 1,
        }
    }

    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }

    /// Count for one reason, zero when absent.
    pub fn excluded_for(&self, reason: ExclusionReason) -> usize {
        self.excluded.get(&reason).copied().unwrap_or(0)
    }
}
