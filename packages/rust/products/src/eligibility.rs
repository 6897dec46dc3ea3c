//! Feed eligibility filter.
//!
//! Rules run in a fixed order and the first failing rule decides the
//! exclusion reason:
//! 1. image validity
//! 2. policy compliance markers
//! 3. restricted brand names (word-boundary matching)

use regex::Regex;
use tracing::debug;

use catalogc_shared::{CatalogError, FilterConfig, ProductRecord, Result};

use crate::image::normalize_image_link;

/// Why a record was kept out of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExclusionReason {
    ImageInvalid,
    PolicyViolation,
    BrandRestricted,
}

impl ExclusionReason {
    /// Every reason, in rule order.
    pub const ALL: [ExclusionReason; 3] = [
        Self::ImageInvalid,
        Self::PolicyViolation,
        Self::BrandRestricted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageInvalid => "image invalid",
            Self::PolicyViolation => "policy violation",
            Self::BrandRestricted => "brand restricted",
        }
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed rule together with the offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub reason: ExclusionReason,
    pub detail: String,
}

/// Outcome of the eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Publishable; carries the normalized image link.
    Eligible { image_link: String },
    Excluded(Exclusion),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    pub fn reason(&self) -> Option<ExclusionReason> {
        match self {
            Self::Eligible { .. } => None,
            Self::Excluded(e) => Some(e.reason),
        }
    }
}

/// Compiled eligibility rules. Built once per run, shared read-only.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    latin_brands: Option<Regex>,
    other_brands: Vec<String>,
    policy_markers: Vec<String>,
    rewrite_video_links: bool,
}

impl EligibilityFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let (latin, other): (Vec<&String>, Vec<&String>) = config
            .restricted_brands
            .iter()
            .filter(|b| !b.trim().is_empty())
            .partition(|b| b.is_ascii());

        let latin_brands = if latin.is_empty() {
            None
        } else {
            let alternation = latin
                .iter()
                .map(|b| {
                    b.trim()
                        .split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            Some(Regex::new(&pattern).map_err(|e| {
                CatalogError::config(format!("invalid restricted brand list: {e}"))
            })?)
        };

        Ok(Self {
            latin_brands,
            other_brands: other.iter().map(|b| b.trim().to_lowercase()).collect(),
            policy_markers: config
                .policy_markers
                .iter()
                .filter(|m| !m.trim().is_empty())
                .map(|m| m.to_lowercase())
                .collect(),
            rewrite_video_links: config.rewrite_video_links,
        })
    }

    /// Whether video links are rewritten to still images instead of rejected.
    pub fn rewrites_video_links(&self) -> bool {
        self.rewrite_video_links
    }

    /// Decide whether a record may appear in the public feed. Never fails.
    pub fn check(&self, record: &ProductRecord) -> Verdict {
        let image_link = match normalize_image_link(&record.image_link, self.rewrite_video_links) {
            Ok(link) => link,
            Err(problem) => {
                return self.exclude(record, ExclusionReason::ImageInvalid, problem.to_string());
            }
        };

        let title = record.title.to_lowercase();

        if let Some(marker) = self.policy_markers.iter().find(|m| title.contains(m.as_str())) {
            return self.exclude(record, ExclusionReason::PolicyViolation, marker.clone());
        }

        if let Some(brand) = self.restricted_brand_in(&title) {
            return self.exclude(record, ExclusionReason::BrandRestricted, brand);
        }

        Verdict::Eligible { image_link }
    }

    /// The first restricted brand appearing as a whole word in `title`.
    fn restricted_brand_in(&self, title: &str) -> Option<String> {
        if let Some(m) = self.latin_brands.as_ref().and_then(|re| re.find(title)) {
            return Some(m.as_str().to_string());
        }

        self.other_brands
            .iter()
            .find(|brand| contains_bounded(title, brand))
            .cloned()
    }

    fn exclude(&self, record: &ProductRecord, reason: ExclusionReason, detail: String) -> Verdict {
        debug!(product_id = record.id, %reason, %detail, "excluded from feed");
        Verdict::Excluded(Exclusion { reason, detail })
    }
}

/// Literal substring match whose neighbours are not letters or digits.
fn contains_bounded(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
