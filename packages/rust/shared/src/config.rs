//! Application configuration for catalogc.
//!
//! The site config lives in `catalogc.toml` next to the catalog.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CatalogError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "catalogc.toml";

// ---------------------------------------------------------------------------
// Config structs (matching catalogc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store identity and link building.
    #[serde(default)]
    pub site: SiteConfig,

    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Feed eligibility policy.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Worker pool settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Static pages listed at the top of the sitemap.
    #[serde(default = "default_static_pages")]
    pub static_pages: Vec<StaticPage>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig::default(),
            filter: FilterConfig::default(),
            build: BuildConfig::default(),
            static_pages: default_static_pages(),
        }
    }
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL of the published site, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Store name used as brand, feed title, and page title suffix.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Feed channel description.
    #[serde(default = "default_feed_description")]
    pub feed_description: String,

    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// ISO 3166 country code for shipping and returns.
    #[serde(default = "default_country")]
    pub country: String,

    /// Document language (`<html lang>`).
    #[serde(default = "default_language")]
    pub language: String,

    /// Contact phone number in international format, digits only.
    #[serde(default = "default_contact_phone")]
    pub contact_phone: String,

    /// Base of the pre-filled contact link (`{base}/{phone}?text=...`).
    #[serde(default = "default_contact_url_base")]
    pub contact_url_base: String,

    /// `priceValidUntil` for structured data. Fixed so injection stays idempotent.
    #[serde(default = "default_price_valid_until")]
    pub price_valid_until: String,

    /// Placeholder aggregate rating.
    #[serde(default = "default_rating_value")]
    pub rating_value: String,

    /// Placeholder review count.
    #[serde(default = "default_review_count")]
    pub review_count: u32,

    /// Merchant return window in days.
    #[serde(default = "default_return_days")]
    pub return_days: u32,

    /// Handling time range in days.
    #[serde(default = "default_handling_days")]
    pub handling_days: [u32; 2],

    /// Transit time range in days.
    #[serde(default = "default_transit_days")]
    pub transit_days: [u32; 2],

    /// Prefix for generated manufacturer part numbers.
    #[serde(default = "default_mpn_prefix")]
    pub mpn_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            store_name: default_store_name(),
            feed_description: default_feed_description(),
            currency: default_currency(),
            country: default_country(),
            language: default_language(),
            contact_phone: default_contact_phone(),
            contact_url_base: default_contact_url_base(),
            price_valid_until: default_price_valid_until(),
            rating_value: default_rating_value(),
            review_count: default_review_count(),
            return_days: default_return_days(),
            handling_days: default_handling_days(),
            transit_days: default_transit_days(),
            mpn_prefix: default_mpn_prefix(),
        }
    }
}

impl SiteConfig {
    /// Base URL with any trailing slash removed.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn default_base_url() -> String {
    "https://sherow1982.github.io/alsooq-alsaudi".into()
}
fn default_store_name() -> String {
    "السوق السعودي".into()
}
fn default_feed_description() -> String {
    "أفضل العروض والمنتجات الأصلية بأسعار تنافسية".into()
}
fn default_currency() -> String {
    "SAR".into()
}
fn default_country() -> String {
    "SA".into()
}
fn default_language() -> String {
    "ar".into()
}
fn default_contact_phone() -> String {
    "201110760081".into()
}
fn default_contact_url_base() -> String {
    "https://wa.me".into()
}
fn default_price_valid_until() -> String {
    "2026-12-31".into()
}
fn default_rating_value() -> String {
    "4.5".into()
}
fn default_review_count() -> u32 {
    25
}
fn default_return_days() -> u32 {
    14
}
fn default_handling_days() -> [u32; 2] {
    [0, 1]
}
fn default_transit_days() -> [u32; 2] {
    [1, 3]
}
fn default_mpn_prefix() -> String {
    "ALS".into()
}

/// `[paths]` section. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Catalog JSON array.
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Optional id → description JSON object.
    #[serde(default = "default_descriptions")]
    pub descriptions: String,

    /// Site root that receives the feed, sitemap, and product directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Product document directory, relative to `output_dir`.
    #[serde(default = "default_products_dir")]
    pub products_dir: String,

    /// Merchant feed file name.
    #[serde(default = "default_feed_file")]
    pub feed_file: String,

    /// Sitemap file name.
    #[serde(default = "default_sitemap_file")]
    pub sitemap_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            descriptions: default_descriptions(),
            output_dir: default_output_dir(),
            products_dir: default_products_dir(),
            feed_file: default_feed_file(),
            sitemap_file: default_sitemap_file(),
        }
    }
}

fn default_catalog() -> String {
    "products.json".into()
}
fn default_descriptions() -> String {
    "descriptions.json".into()
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_products_dir() -> String {
    "products".into()
}
fn default_feed_file() -> String {
    "product-feed.xml".into()
}
fn default_sitemap_file() -> String {
    "sitemap.xml".into()
}

/// `[filter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Brand names that may not appear in feed titles.
    #[serde(default = "default_restricted_brands")]
    pub restricted_brands: Vec<String>,

    /// Marker strings that flag a title as non-compliant.
    #[serde(default = "default_policy_markers")]
    pub policy_markers: Vec<String>,

    /// Rewrite video links to their `.jpg` poster instead of excluding them.
    #[serde(default)]
    pub rewrite_video_links: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            restricted_brands: default_restricted_brands(),
            policy_markers: default_policy_markers(),
            rewrite_video_links: false,
        }
    }
}

fn default_restricted_brands() -> Vec<String> {
    [
        "nike",
        "adidas",
        "apple",
        "samsung",
        "gucci",
        "chanel",
        "dior",
        "rolex",
        "louis vuitton",
        "ray-ban",
        "نايك",
        "اديداس",
        "أديداس",
        "ابل",
        "سامسونج",
        "قوتشي",
        "شانيل",
        "ديور",
        "رولكس",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_policy_markers() -> Vec<String> {
    vec!["not compatible with our policy".into()]
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Size of the per-record worker pool.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    8
}

/// `[[static_pages]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPage {
    /// Path relative to the base URL (`""` for the home page).
    pub path: String,
    /// Sitemap change frequency.
    pub changefreq: String,
    /// Sitemap priority in `[0, 1]`.
    pub priority: f64,
}

impl StaticPage {
    fn new(path: &str, changefreq: &str, priority: f64) -> Self {
        Self {
            path: path.into(),
            changefreq: changefreq.into(),
            priority,
        }
    }
}

fn default_static_pages() -> Vec<StaticPage> {
    vec![
        StaticPage::new("", "daily", 1.0),
        StaticPage::new("about.html", "monthly", 0.8),
        StaticPage::new("contact.html", "monthly", 0.8),
        StaticPage::new("shipping.html", "monthly", 0.6),
        StaticPage::new("return-policy.html", "monthly", 0.6),
        StaticPage::new("terms.html", "monthly", 0.5),
        StaticPage::new("privacy.html", "monthly", 0.5),
    ]
}

impl AppConfig {
    /// Reject configurations that would produce broken links or an idle pool.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.site.base_url).map_err(|e| {
            CatalogError::config(format!("invalid site.base_url '{}': {e}", self.site.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CatalogError::config(format!(
                "site.base_url must be http(s), got '{}'",
                url.scheme()
            )));
        }

        NaiveDate::parse_from_str(&self.site.price_valid_until, "%Y-%m-%d").map_err(|e| {
            CatalogError::config(format!(
                "site.price_valid_until '{}' is not YYYY-MM-DD: {e}",
                self.site.price_valid_until
            ))
        })?;

        if self.build.workers == 0 {
            return Err(CatalogError::config("build.workers must be at least 1"));
        }

        if let Some(page) = self
            .static_pages
            .iter()
            .find(|p| !(0.0..=1.0).contains(&p.priority))
        {
            return Err(CatalogError::config(format!(
                "static page '{}' has priority {} outside [0, 1]",
                page.path, page.priority
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Resolved file locations and pool size for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Catalog JSON path.
    pub catalog_path: PathBuf,
    /// Description index JSON path.
    pub descriptions_path: PathBuf,
    /// Site root directory.
    pub output_dir: PathBuf,
    /// Product document directory name, relative to `output_dir`.
    pub products_dir: String,
    /// Feed file name, relative to `output_dir`.
    pub feed_file: String,
    /// Sitemap file name, relative to `output_dir`.
    pub sitemap_file: String,
    /// Worker pool size.
    pub workers: usize,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            catalog_path: PathBuf::from(&config.paths.catalog),
            descriptions_path: PathBuf::from(&config.paths.descriptions),
            output_dir: PathBuf::from(&config.paths.output_dir),
            products_dir: config.paths.products_dir.clone(),
            feed_file: config.paths.feed_file.clone(),
            sitemap_file: config.paths.sitemap_file.clone(),
            workers: config.build.workers,
        }
    }
}

impl RunConfig {
    /// Directory holding one document per product.
    pub fn products_path(&self) -> PathBuf {
        self.output_dir.join(&self.products_dir)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.output_dir.join(&self.feed_file)
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.output_dir.join(&self.sitemap_file)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the config from `path`, or from `./catalogc.toml` when no path is given.
///
/// An explicit path must exist; the implicit one falls back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => {
            let default_path = PathBuf::from(CONFIG_FILE_NAME);
            if !default_path.exists() {
                tracing::debug!(path = %default_path.display(), "config file not found, using defaults");
                AppConfig::default()
            } else {
                load_config_from(&default_path)?
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CatalogError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file. Refuses to overwrite an existing one.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(CatalogError::config(format!(
            "{} already exists; remove it first to regenerate defaults",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CatalogError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| CatalogError::io(path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path.to_path_buf())
}
