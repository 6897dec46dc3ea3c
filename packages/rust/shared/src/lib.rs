//! Shared types, error model, and configuration for catalogc.
//!
//! This crate is the foundation depended on by all other catalogc crates.
//! It provides:
//! - [`CatalogError`], the unified error type
//! - Domain types ([`ProductRecord`], [`DescriptionIndex`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, CONFIG_FILE_NAME, FilterConfig, PathsConfig, RunConfig, SiteConfig,
    StaticPage, init_config, load_config, load_config_from,
};
pub use error::{CatalogError, Result};
pub use types::{DescriptionIndex, ProductId, ProductRecord, RunId};
