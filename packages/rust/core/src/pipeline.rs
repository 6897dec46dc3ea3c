//! Run pipelines: build, inject, emit, and all three in order.
//!
//! A [`Pipeline`] is loaded once per run. Loading is the only step that can
//! abort the run; after that every per-record problem is reported, counted,
//! and skipped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use catalogc_artifacts::{EmitStats, emit};
use catalogc_markup::{Injection, inject, synthesize};
use catalogc_products::{CatalogContext, load_catalog, load_descriptions};
use catalogc_shared::{AppConfig, ProductId, ProductRecord, Result, RunConfig, RunId, StaticPage};

use crate::coordinator::{BatchFailure, BatchProgress, run_batch};
use crate::status::{StatusReport, collect_status};
use crate::store::{ArtifactMeta, Located, ProductStore, write_artifact};

/// Which documents `build` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Synthesize every document, replacing existing files.
    #[default]
    Overwrite,
    /// Only synthesize records that have no document under any name.
    MissingOnly,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub run_id: RunId,
    pub total: usize,
    pub written: usize,
    pub skipped_existing: usize,
    pub failures: Vec<BatchFailure>,
    pub elapsed: Duration,
}

/// Per-document result of an injection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Updated,
    Unchanged,
    NoAnchor,
}

#[derive(Debug, Clone)]
pub struct InjectReport {
    pub run_id: RunId,
    pub total: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub no_anchor: Vec<ProductId>,
    /// Records whose document was found only under an older file name.
    pub stale_names: Vec<ProductId>,
    /// Records with no document at all.
    pub missing: Vec<ProductId>,
    pub failures: Vec<BatchFailure>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct EmitReport {
    pub run_id: RunId,
    pub stats: EmitStats,
    pub feed: ArtifactMeta,
    pub sitemap: ArtifactMeta,
}

#[derive(Debug, Clone)]
pub struct RunAllReport {
    pub build: BuildReport,
    pub inject: InjectReport,
    pub emit: EmitReport,
}

impl RunAllReport {
    /// Per-item failures across every phase.
    pub fn failure_count(&self) -> usize {
        self.build.failures.len() + self.inject.failures.len()
    }
}

/// Everything one run needs, shared read-only by every worker.
pub struct Pipeline {
    run_id: RunId,
    run: RunConfig,
    static_pages: Vec<StaticPage>,
    ctx: Arc<CatalogContext>,
    records: Arc<Vec<ProductRecord>>,
    store: ProductStore,
}

impl Pipeline {
    /// Load the catalog and description index and build the run context.
    ///
    /// Fails when the catalog is missing, malformed, or has duplicate ids.
    #[instrument(skip_all, fields(catalog = %run.catalog_path.display()))]
    pub fn load(config: &AppConfig, run: RunConfig, build_date: NaiveDate) -> Result<Self> {
        let run_id = RunId::new();
        let records = load_catalog(&run.catalog_path)?;
        let descriptions = load_descriptions(&run.descriptions_path);
        let ctx = CatalogContext::new(config, descriptions, build_date)?;
        let store = ProductStore::new(run.products_path());

        info!(
            %run_id,
            records = records.len(),
            workers = run.workers,
            products_dir = %store.dir().display(),
            "pipeline ready"
        );

        Ok(Self {
            run_id,
            run,
            static_pages: config.static_pages.clone(),
            ctx: Arc::new(ctx),
            records: Arc::new(records),
            store,
        })
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn context(&self) -> &CatalogContext {
        &self.ctx
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    /// Synthesize product documents.
    #[instrument(skip_all, fields(run_id = %self.run_id, ?mode))]
    pub async fn build_documents(
        &self,
        mode: BuildMode,
        progress: &dyn BatchProgress,
    ) -> Result<BuildReport> {
        let start = Instant::now();
        self.store.ensure_dir()?;
        let existing = self.store.list()?;

        let mut skipped_existing = 0;
        let mut items = Vec::with_capacity(self.records.len());
        for record in self.records.iter() {
            if mode == BuildMode::MissingOnly {
                let slug = catalogc_products::resolve(record);
                if self.store.locate(&existing, record.id, &slug).is_some() {
                    skipped_existing += 1;
                    continue;
                }
            }
            items.push((record.id, record.clone()));
        }

        progress.phase("Building documents", items.len());

        let ctx = Arc::clone(&self.ctx);
        let store = self.store.clone();
        let report = run_batch(
            items,
            self.run.workers,
            move |record: ProductRecord| -> Result<()> {
                let view = ctx.view(&record);
                let html = synthesize(&view, ctx.site())?;
                let path = store.path_for(&view.slug);
                store.write(&path, &html)?;
                debug!(product_id = record.id, path = %path.display(), "document written");
                Ok(())
            },
            progress,
        )
        .await;

        let result = BuildReport {
            run_id: self.run_id.clone(),
            total: self.records.len(),
            written: report.succeeded(),
            skipped_existing,
            failures: report.failures,
            elapsed: start.elapsed(),
        };

        info!(
            total = result.total,
            written = result.written,
            skipped_existing = result.skipped_existing,
            failed = result.failures.len(),
            elapsed_ms = result.elapsed.as_millis(),
            "build complete"
        );

        Ok(result)
    }

    /// Re-inject the metadata region of every existing document.
    #[instrument(skip_all, fields(run_id = %self.run_id))]
    pub async fn inject_documents(&self, progress: &dyn BatchProgress) -> Result<InjectReport> {
        let start = Instant::now();
        let existing = self.store.list()?;

        let mut missing = Vec::new();
        let mut stale_names = Vec::new();
        let mut items: Vec<(ProductId, (ProductRecord, PathBuf))> = Vec::new();

        for record in self.records.iter() {
            let slug = catalogc_products::resolve(record);
            match self.store.locate(&existing, record.id, &slug) {
                Some(Located::Canonical(path)) => items.push((record.id, (record.clone(), path))),
                Some(Located::Stale(path)) => {
                    warn!(
                        product_id = record.id,
                        found = %path.display(),
                        expected = %slug.file_name(),
                        "document has a stale file name"
                    );
                    stale_names.push(record.id);
                    items.push((record.id, (record.clone(), path)));
                }
                None => {
                    warn!(product_id = record.id, slug = %slug, "no document to inject");
                    missing.push(record.id);
                }
            }
        }

        progress.phase("Injecting metadata", items.len());

        let ctx = Arc::clone(&self.ctx);
        let store = self.store.clone();
        let report = run_batch(
            items,
            self.run.workers,
            move |(record, path): (ProductRecord, PathBuf)| -> Result<InjectOutcome> {
                let original = store.read(&path)?;
                let view = ctx.view(&record);
                match inject(&original, &view, ctx.site())? {
                    Injection::NoAnchor => {
                        warn!(product_id = record.id, path = %path.display(), "no </head> anchor, document left untouched");
                        Ok(InjectOutcome::NoAnchor)
                    }
                    Injection::Injected(text) if text == original => Ok(InjectOutcome::Unchanged),
                    Injection::Injected(text) => {
                        store.write(&path, &text)?;
                        debug!(product_id = record.id, path = %path.display(), "metadata rewritten");
                        Ok(InjectOutcome::Updated)
                    }
                }
            },
            progress,
        )
        .await;

        let mut result = InjectReport {
            run_id: self.run_id.clone(),
            total: self.records.len(),
            updated: 0,
            unchanged: 0,
            no_anchor: Vec::new(),
            stale_names,
            missing,
            failures: report.failures,
            elapsed: start.elapsed(),
        };
        for (id, outcome) in report.outcomes {
            match outcome {
                InjectOutcome::Updated => result.updated += 1,
                InjectOutcome::Unchanged => result.unchanged += 1,
                InjectOutcome::NoAnchor => result.no_anchor.push(id),
            }
        }

        info!(
            total = result.total,
            updated = result.updated,
            unchanged = result.unchanged,
            no_anchor = result.no_anchor.len(),
            stale_names = result.stale_names.len(),
            missing = result.missing.len(),
            failed = result.failures.len(),
            elapsed_ms = result.elapsed.as_millis(),
            "inject complete"
        );

        Ok(result)
    }

    /// Render and write the feed and sitemap.
    #[instrument(skip_all, fields(run_id = %self.run_id))]
    pub fn emit_artifacts(&self) -> Result<EmitReport> {
        let documents = self.store.list()?;
        let emitted = emit(&self.records, &self.ctx, &self.static_pages, &documents);

        let feed = write_artifact(&self.run.feed_path(), &emitted.feed_xml)?;
        let sitemap = write_artifact(&self.run.sitemap_path(), &emitted.sitemap_xml)?;

        info!(
            feed = %feed.path.display(),
            feed_sha256 = %feed.sha256,
            sitemap = %sitemap.path.display(),
            sitemap_sha256 = %sitemap.sha256,
            "artifacts written"
        );

        Ok(EmitReport {
            run_id: self.run_id.clone(),
            stats: emitted.stats,
            feed,
            sitemap,
        })
    }

    /// Build, inject, then emit.
    #[instrument(skip_all, fields(run_id = %self.run_id))]
    pub async fn run_all(
        &self,
        mode: BuildMode,
        progress: &dyn BatchProgress,
    ) -> Result<RunAllReport> {
        let build = self.build_documents(mode, progress).await?;
        let inject = self.inject_documents(progress).await?;
        progress.phase("Emitting feed and sitemap", 0);
        let emit = self.emit_artifacts()?;
        Ok(RunAllReport {
            build,
            inject,
            emit,
        })
    }

    /// Compare the catalog with the output directory.
    pub fn status(&self) -> Result<StatusReport> {
        collect_status(&self.records, &self.store, &self.run)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use catalogc_markup::REGION_BEGIN;
    use catalogc_products::resolve;

    use super::*;
    use crate::coordinator::SilentProgress;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("catalogc-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const CATALOG: &str = r#"[
        {"id": 7, "title": "عرض جهاز تدليك كهربائي", "price": 200, "sale_price": 150, "image_link": "http://x/img.webp"},
        {"id": 8, "title": "ساعة ذكية", "price": 300, "sale_price": 250, "image_link": "https://cdn.test/v.mp4"},
        {"id": 9, "title": "حذاء nike رياضي", "price": 400, "sale_price": 380, "image_link": "https://cdn.test/n.jpg"},
        {"id": 10, "title": "technike gadget", "price": 50, "sale_price": 50, "image_link": "https://cdn.test/t.jpg"},
        {"id": 11, "title": "", "price": 0, "sale_price": 0, "image_link": null}
    ]"#;

    fn setup(root: &Path, catalog: &str) -> (AppConfig, RunConfig) {
        std::fs::write(root.join("products.json"), catalog).unwrap();
        std::fs::write(
            root.join("descriptions.json"),
            r#"{"10": "أداة عملية صغيرة الحجم مناسبة للاستخدام اليومي في المنزل"}"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.paths.catalog = root.join("products.json").display().to_string();
        config.paths.descriptions = root.join("descriptions.json").display().to_string();
        config.paths.output_dir = root.join("site").display().to_string();
        config.build.workers = 3;
        let run = RunConfig::from(&config);
        (config, run)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn snapshot(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| {
                (
                    e.file_name().to_string_lossy().into_owned(),
                    std::fs::read_to_string(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn full_run_twice_is_byte_identical() {
        let root = temp_dir();
        let (config, run) = setup(&root, CATALOG);

        let first = Pipeline::load(&config, run.clone(), date()).unwrap();
        let report = first.run_all(BuildMode::Overwrite, &SilentProgress).await.unwrap();
        assert_eq!(report.build.written, 5);
        assert_eq!(report.failure_count(), 0);
        assert_eq!(report.inject.unchanged, 5);
        assert_eq!(report.emit.stats.eligible, 2);
        assert_eq!(report.emit.stats.sitemap_entries, 5);

        let feed = std::fs::read_to_string(run.feed_path()).unwrap();
        let sitemap = std::fs::read_to_string(run.sitemap_path()).unwrap();
        let documents = snapshot(&run.products_path());
        assert_eq!(documents.len(), 5);
        assert!(documents.iter().any(|(name, _)| name == "11.html"));

        let second = Pipeline::load(&config, run.clone(), date()).unwrap();
        let again = second.run_all(BuildMode::Overwrite, &SilentProgress).await.unwrap();
        assert_eq!(again.emit.feed.sha256, report.emit.feed.sha256);
        assert_eq!(std::fs::read_to_string(run.feed_path()).unwrap(), feed);
        assert_eq!(std::fs::read_to_string(run.sitemap_path()).unwrap(), sitemap);
        assert_eq!(snapshot(&run.products_path()), documents);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn inject_preserves_hand_edited_body() {
        let root = temp_dir();
        let (config, run) = setup(&root, CATALOG);
        let pipeline = Pipeline::load(&config, run.clone(), date()).unwrap();
        pipeline.build_documents(BuildMode::Overwrite, &SilentProgress).await.unwrap();

        let slug = resolve(&pipeline.records()[0]);
        let path = run.products_path().join(slug.file_name());
        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace("<main class=\"container\">", "<main class=\"container\">\n<p>ملاحظة يدوية</p>");
        std::fs::write(&path, &edited).unwrap();

        let report = pipeline.inject_documents(&SilentProgress).await.unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), edited);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_only_keeps_existing_documents() {
        let root = temp_dir();
        let (config, run) = setup(&root, CATALOG);
        let products = run.products_path();
        std::fs::create_dir_all(&products).unwrap();
        // Document for id 7 under an older title.
        std::fs::write(products.join("7-قديم.html"), "<html><head></head><body>يدوي</body></html>").unwrap();

        let pipeline = Pipeline::load(&config, run.clone(), date()).unwrap();
        let build = pipeline
            .build_documents(BuildMode::MissingOnly, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(build.skipped_existing, 1);
        assert_eq!(build.written, 4);

        let inject = pipeline.inject_documents(&SilentProgress).await.unwrap();
        assert_eq!(inject.stale_names, vec![7]);
        assert_eq!(inject.updated, 1);
        let stale = std::fs::read_to_string(products.join("7-قديم.html")).unwrap();
        assert_eq!(stale.matches(REGION_BEGIN).count(), 1);
        assert!(stale.ends_with("</head><body>يدوي</body></html>"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn documents_without_anchor_are_reported() {
        let root = temp_dir();
        let (config, run) = setup(&root, CATALOG);
        let pipeline = Pipeline::load(&config, run.clone(), date()).unwrap();
        pipeline.build_documents(BuildMode::Overwrite, &SilentProgress).await.unwrap();

        let slug = resolve(&pipeline.records()[1]);
        std::fs::write(run.products_path().join(slug.file_name()), "<p>fragment</p>").unwrap();
        std::fs::remove_file(run.products_path().join(resolve(&pipeline.records()[2]).file_name())).unwrap();

        let report = pipeline.inject_documents(&SilentProgress).await.unwrap();
        assert_eq!(report.no_anchor, vec![8]);
        assert_eq!(report.missing, vec![9]);
        assert_eq!(report.unchanged, 3);
        assert!(report.failures.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn one_unwritable_document_does_not_stop_the_others() {
        let root = temp_dir();
        let (config, run) = setup(&root, CATALOG);
        let pipeline = Pipeline::load(&config, run.clone(), date()).unwrap();
        let products = run.products_path();

        // A directory squatting on the canonical path makes the rename fail.
        let blocked = products.join(resolve(&pipeline.records()[0]).file_name());
        std::fs::create_dir_all(&blocked).unwrap();

        let build = pipeline.build_documents(BuildMode::Overwrite, &SilentProgress).await.unwrap();
        assert_eq!(build.written, 4);
        assert_eq!(build.failures.len(), 1);
        assert_eq!(build.failures[0].id, 7);
        assert!(blocked.is_dir());

        // Bytes that are not UTF-8 make the read fail.
        let unreadable = products.join(resolve(&pipeline.records()[3]).file_name());
        std::fs::write(&unreadable, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let inject = pipeline.inject_documents(&SilentProgress).await.unwrap();
        assert_eq!(inject.failures.len(), 1);
        assert_eq!(inject.failures[0].id, 10);
        assert_eq!(inject.unchanged, 3);
        assert_eq!(inject.missing, vec![7]);

        let leftovers = std::fs::read_dir(&products)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn duplicate_ids_abort_before_writing() {
        let root = temp_dir();
        let catalog = r#"[
            {"id": 1, "title": "a", "price": 1, "sale_price": 1},
            {"id": 1, "title": "b", "price": 1, "sale_price": 1}
        ]"#;
        let (config, run) = setup(&root, catalog);

        let err = Pipeline::load(&config, run.clone(), date()).err().unwrap();
        assert!(err.is_fatal());
        assert!(!run.output_dir.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_catalog_is_fatal() {
        let root = temp_dir();
        let mut config = AppConfig::default();
        config.paths.catalog = root.join("nope.json").display().to_string();
        let err = Pipeline::load(&config, RunConfig::from(&config), date()).err().unwrap();
        assert!(err.is_fatal());
        let _ = std::fs::remove_dir_all(&root);
    }
}
