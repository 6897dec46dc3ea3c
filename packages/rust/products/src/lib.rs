//! Per-record catalog logic.
//!
//! Pure functions shared by every generator: slug resolution, the feed
//! eligibility filter, the taxonomy classifier, pricing, and the derived
//! [`ProductView`] that document, metadata, and feed rendering all read from.
//! Nothing here touches the output directory; only catalog loading does I/O.

pub mod catalog;
pub mod context;
pub mod description;
pub mod eligibility;
pub mod image;
pub mod links;
pub mod pricing;
pub mod slug;
pub mod taxonomy;
pub mod view;

pub use catalog::{ensure_unique_ids, load_catalog, load_descriptions, parse_catalog};
pub use context::CatalogContext;
pub use description::{Description, DescriptionSource, excerpt, select_description};
pub use eligibility::{EligibilityFilter, Exclusion, ExclusionReason, Verdict};
pub use image::{ImageProblem, normalize_image_link};
pub use pricing::{Pricing, format_amount, format_money};
pub use slug::{MAX_SLUG_BYTES, MAX_SLUG_CHARS, Slug, clean_title, normalize_title, resolve, resolve_parts};
pub use taxonomy::{Classification, TAXONOMY, classify};
pub use view::ProductView;
