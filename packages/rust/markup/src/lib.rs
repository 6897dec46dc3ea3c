//! Product document rendering.
//!
//! [`synthesize`] builds a complete product page; [`inject`] keeps the
//! metadata region of an existing page in sync with the catalog without
//! touching anything else in the file.

pub mod document;
pub mod inject;
pub mod schema;

pub use document::synthesize;
pub use inject::{
    HEAD_END, Injection, REGION_BEGIN, REGION_END, inject, render_region,
    strip_owned_regions,
};
pub use schema::{ProductSchema, StoreSchema, to_script_json};
