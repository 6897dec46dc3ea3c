//! Run orchestration for catalogc.
//!
//! Ties the catalog, document markup, and artifact emission together into the
//! `build`, `inject`, `emit`, and `all` pipelines, fanned across a bounded
//! worker pool.

pub mod coordinator;
pub mod pipeline;
pub mod status;
pub mod store;

pub use coordinator::{BatchFailure, BatchProgress, BatchReport, SilentProgress, run_batch};
pub use pipeline::{
    BuildMode, BuildReport, EmitReport, InjectOutcome, InjectReport, Pipeline, RunAllReport,
};
pub use status::StatusReport;
pub use store::{ArtifactMeta, Located, ProductStore, document_id, write_artifact, write_atomic};
