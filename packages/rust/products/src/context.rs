//! Per-run catalog context.
//!
//! Everything a worker needs to render one product, built once and shared
//! read-only (behind an `Arc`) by every task in the pool.

use chrono::NaiveDate;

use catalogc_shared::{AppConfig, DescriptionIndex, ProductRecord, Result, SiteConfig};

use crate::eligibility::{EligibilityFilter, Verdict};
use crate::view::ProductView;

/// Image shown when a record has no publishable image.
const PLACEHOLDER_IMAGE: &str = "logo.png";

#[derive(Debug, Clone)]
pub struct CatalogContext {
    site: SiteConfig,
    products_segment: String,
    filter: EligibilityFilter,
    descriptions: DescriptionIndex,
    build_date: NaiveDate,
}

impl CatalogContext {
    /// Build the context from validated configuration.
    ///
    /// `build_date` stamps sitemap `lastmod`; nothing else in the output
    /// depends on the clock.
    pub fn new(
        config: &AppConfig,
        descriptions: DescriptionIndex,
        build_date: NaiveDate,
    ) -> Result<Self> {
        Ok(Self {
            site: config.site.clone(),
            products_segment: config.paths.products_dir.trim_matches('/').to_string(),
            filter: EligibilityFilter::new(&config.filter)?,
            descriptions,
            build_date,
        })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// URL path segment (and directory name) of product documents.
    pub fn products_segment(&self) -> &str {
        &self.products_segment
    }

    pub fn filter(&self) -> &EligibilityFilter {
        &self.filter
    }

    pub fn descriptions(&self) -> &DescriptionIndex {
        &self.descriptions
    }

    pub fn build_date(&self) -> NaiveDate {
        self.build_date
    }

    /// Run the eligibility filter on a record.
    pub fn eligibility(&self, record: &ProductRecord) -> Verdict {
        self.filter.check(record)
    }

    /// Derive every rendered value for a record.
    pub fn view<'a>(&self, record: &'a ProductRecord) -> ProductView<'a> {
        ProductView::build(self, record)
    }

    pub(crate) fn placeholder_image(&self) -> String {
        format!("{}/{PLACEHOLDER_IMAGE}", self.site.base())
    }
}
