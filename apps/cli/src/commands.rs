//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use catalogc_core::{
    BatchFailure, BatchProgress, BuildMode, BuildReport, EmitReport, InjectReport, Pipeline,
    StatusReport,
};
use catalogc_products::ExclusionReason;
use catalogc_shared::{AppConfig, CONFIG_FILE_NAME, RunConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// catalogc: product pages, merchant feed, and sitemap from one catalog.
#[derive(Parser)]
#[command(
    name = "catalogc",
    version,
    about = "Generate product pages, a merchant feed, and a sitemap from a product catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./catalogc.toml when present).
    #[arg(long, global = true, env = "CATALOGC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog JSON path, overriding `paths.catalog`.
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Site root directory, overriding `paths.output_dir`.
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Worker pool size, overriding `build.workers`.
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Synthesize product documents.
    Build {
        /// Only create documents that do not exist yet.
        #[arg(long)]
        missing_only: bool,
    },

    /// Refresh the metadata region of existing documents.
    Inject,

    /// Write the merchant feed and the sitemap.
    Emit,

    /// Build, inject, and emit in one run.
    All {
        /// Only create documents that do not exist yet.
        #[arg(long)]
        missing_only: bool,
    },

    /// Compare the catalog with the output directory.
    Status {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "catalogc=info",
        1 => "catalogc=debug",
        _ => "catalogc=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(cli.config.as_deref()),
            ConfigAction::Show => cmd_config_show(&cli),
        };
    }

    let config = resolve_config(&cli)?;
    let run = RunConfig::from(&config);
    let build_date = Local::now().date_naive();
    let pipeline = Pipeline::load(&config, run, build_date)?;

    match cli.command {
        Command::Build { missing_only } => cmd_build(&pipeline, build_mode(missing_only)).await,
        Command::Inject => cmd_inject(&pipeline).await,
        Command::Emit => cmd_emit(&pipeline),
        Command::All { missing_only } => cmd_all(&pipeline, build_mode(missing_only)).await,
        Command::Status { json } => cmd_status(&pipeline, json),
        Command::Config { .. } => Ok(()),
    }
}

/// Load the config file and apply flag overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(catalog) = &cli.catalog {
        config.paths.catalog = catalog.clone();
    }
    if let Some(output) = &cli.output {
        config.paths.output_dir = output.clone();
    }
    if let Some(workers) = cli.workers {
        config.build.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

fn build_mode(missing_only: bool) -> BuildMode {
    if missing_only {
        BuildMode::MissingOnly
    } else {
        BuildMode::Overwrite
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Progress bar over the per-record batches.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchProgress for CliProgress {
    fn phase(&self, name: &str, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message(name.to_string());
    }

    fn item_done(&self, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(pipeline: &Pipeline, mode: BuildMode) -> Result<()> {
    let progress = CliProgress::new();
    let report = pipeline.build_documents(mode, &progress).await;
    progress.finish();
    let report = report?;

    println!();
    print_build(&report);
    println!();

    fail_on(&report.failures)
}

async fn cmd_inject(pipeline: &Pipeline) -> Result<()> {
    let progress = CliProgress::new();
    let report = pipeline.inject_documents(&progress).await;
    progress.finish();
    let report = report?;

    println!();
    print_inject(&report);
    println!();

    fail_on(&report.failures)
}

fn cmd_emit(pipeline: &Pipeline) -> Result<()> {
    let report = pipeline.emit_artifacts()?;

    println!();
    print_emit(&report);
    println!();

    Ok(())
}

async fn cmd_all(pipeline: &Pipeline, mode: BuildMode) -> Result<()> {
    info!(run_id = %pipeline.run_id(), ?mode, "running build, inject, and emit");

    let progress = CliProgress::new();
    let report = pipeline.run_all(mode, &progress).await;
    progress.finish();
    let report = report?;

    println!();
    print_build(&report.build);
    println!();
    print_inject(&report.inject);
    println!();
    print_emit(&report.emit);
    println!();

    let mut failures = report.build.failures.clone();
    failures.extend(report.inject.failures.iter().cloned());
    fail_on(&failures)
}

fn cmd_status(pipeline: &Pipeline, json: bool) -> Result<()> {
    let report: StatusReport = pipeline.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("  Catalog records:   {}", report.catalog_records);
    println!("  Documents present: {}", report.documents_present);
    println!("  Stale file names:  {}", report.stale_documents.len());
    println!("  Missing documents: {}", report.missing.len());
    println!("  Orphan documents:  {}", report.orphans.len());
    for name in &report.orphans {
        println!("    {name}");
    }
    println!("  Feed:    {}", present(report.feed_present));
    println!("  Sitemap: {}", present(report.sitemap_present));
    println!();

    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let path = init_config(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

fn print_build(report: &BuildReport) {
    println!("  Build");
    println!("  Records:  {}", report.total);
    println!("  Written:  {}", report.written);
    println!("  Skipped:  {}", report.skipped_existing);
    println!("  Failed:   {}", report.failures.len());
    print_failures(&report.failures);
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
}

fn print_inject(report: &InjectReport) {
    println!("  Inject");
    println!("  Records:    {}", report.total);
    println!("  Updated:    {}", report.updated);
    println!("  Unchanged:  {}", report.unchanged);
    println!("  No </head>: {}", report.no_anchor.len());
    println!("  Stale name: {}", report.stale_names.len());
    println!("  Missing:    {}", report.missing.len());
    println!("  Failed:     {}", report.failures.len());
    print_failures(&report.failures);
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
}

fn print_emit(report: &EmitReport) {
    let stats = &report.stats;
    println!("  Emit");
    println!("  Records:  {}", stats.total);
    println!("  In feed:  {}", stats.eligible);
    println!("  Excluded: {}", stats.excluded_total());
    for reason in ExclusionReason::ALL {
        println!("    {:<18} {}", reason.as_str(), stats.excluded_for(reason));
    }
    println!(
        "  Sitemap:  {} products ({} without a document)",
        stats.sitemap_entries, stats.sitemap_missing
    );
    println!(
        "  Feed:     {} ({} bytes, sha256 {})",
        report.feed.path.display(),
        report.feed.size_bytes,
        report.feed.sha256
    );
    println!(
        "  Sitemap:  {} ({} bytes, sha256 {})",
        report.sitemap.path.display(),
        report.sitemap.size_bytes,
        report.sitemap.sha256
    );
}

fn print_failures(failures: &[BatchFailure]) {
    for failure in failures {
        println!("    #{}: {}", failure.id, failure.error);
    }
}

fn present(flag: bool) -> &'static str {
    if flag { "present" } else { "missing" }
}

/// Per-item failures do not abort a run, but they fail the command.
fn fail_on(failures: &[BatchFailure]) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(eyre!("{} product(s) failed", failures.len()))
    }
}
