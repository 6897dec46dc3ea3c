//! Feed and sitemap emission.
//!
//! [`emit`] turns the whole catalog into the merchant feed and the sitemap in
//! one pass. Feed membership follows the eligibility filter. Sitemap
//! membership follows the documents present on disk: a catalog record is
//! listed when its canonical document file exists, in catalog order.
//! Eligibility never affects the sitemap and files without a catalog record
//! are never listed.

pub mod feed;
pub mod sitemap;
pub mod stats;
mod xml;

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use catalogc_products::{CatalogContext, Verdict};
use catalogc_shared::{ProductRecord, StaticPage};

pub use feed::{FeedEntry, GOOGLE_NS, render_feed};
pub use sitemap::{IMAGE_NS, SITEMAP_NS, SitemapEntry, SitemapImage, render_sitemap};
pub use stats::EmitStats;

/// Serialized artifacts and the statistics of the run that produced them.
#[derive(Debug, Clone)]
pub struct Emitted {
    pub feed_xml: String,
    pub sitemap_xml: String,
    pub stats: EmitStats,
}

/// Build the feed and sitemap for `records`.
///
/// `documents` holds the file names present in the products directory.
#[instrument(skip_all, fields(records = records.len(), documents = documents.len()))]
pub fn emit(
    records: &[ProductRecord],
    ctx: &CatalogContext,
    static_pages: &[StaticPage],
    documents: &BTreeSet<String>,
) -> Emitted {
    let site = ctx.site();
    let lastmod = ctx.build_date();

    let mut stats = EmitStats::default();
    let mut feed_entries = Vec::new();
    let mut sitemap_entries: Vec<SitemapEntry> = static_pages
        .iter()
        .map(|page| SitemapEntry::for_static_page(site, page, lastmod))
        .collect();

    for record in records {
        let view = ctx.view(record);
        let verdict = ctx.eligibility(record);
        stats.record_verdict(&verdict);

        if let Verdict::Eligible { image_link } = verdict {
            feed_entries.push(FeedEntry::new(&view, image_link));
        }

        if documents.contains(&view.slug.file_name()) {
            sitemap_entries.push(SitemapEntry::for_product(&view, lastmod));
            stats.sitemap_entries += 1;
        } else {
            debug!(product_id = record.id, slug = %view.slug, "no document, left out of sitemap");
            stats.sitemap_missing += 1;
        }
    }

    if stats.sitemap_missing > 0 {
        warn!(
            missing = stats.sitemap_missing,
            "catalog records without a document were left out of the sitemap"
        );
    }

    info!(
        total = stats.total,
        eligible = stats.eligible,
        excluded = stats.excluded_total(),
        sitemap_entries = stats.sitemap_entries,
        "artifacts rendered"
    );

    Emitted {
        feed_xml: render_feed(site, &feed_entries),
        sitemap_xml: render_sitemap(&sitemap_entries),
        stats,
    }
}
