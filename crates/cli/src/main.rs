use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use reconcile_core::{
    read_records, BackingStore, Config, FailureLog, SourceRecord, WorkingStore,
};
use reconcile_engine::{Dispatcher, Pipeline, RunSummary};
use reconcile_index_client::{HttpIndex, IndexAdmin};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "reconcile")]
#[command(about = "Reconcile a content dataset against its search index", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "reconcile.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log only warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    #[command(flatten)]
    overrides: Overrides,
}

/// Flag overrides for the most commonly adjusted config values; flags win
/// over the config file.
#[derive(Args)]
struct Overrides {
    /// Dataset file (overrides dataset_file)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Index base URL (overrides index_url)
    #[arg(long, global = true)]
    index_url: Option<String>,

    /// Working directory (overrides work_dir)
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Verification batch size (overrides verify_batch_size)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Query strategy: db-range or ancestor (overrides query_strategy)
    #[arg(long, global = true)]
    strategy: Option<String>,

    /// Dispatch to all instances concurrently
    #[arg(long, global = true)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: verify, scan, cross-check, fix
    Run(SummaryArgs),

    /// Canonicalize the dataset and verify it against the index
    Verify(SummaryArgs),

    /// Scan for error documents and stage purge candidates
    Scan(SummaryArgs),

    /// Dispatch corrective requests for staged missing/purge files
    Fix(SummaryArgs),

    /// Delete the accumulated corrective failure log
    #[command(name = "clear-failures")]
    ClearFailures,
}

#[derive(Args)]
struct SummaryArgs {
    /// Print the run summary as JSON instead of a table
    #[arg(long)]
    summary_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli.overrides);
    config.validate()?;

    let store = WorkingStore::open(&config.work_dir)
        .with_context(|| format!("opening working directory {}", config.work_dir.display()))?;
    let pipeline = Pipeline::new(&config, &store);

    match cli.command {
        Commands::Run(args) => {
            let records = load_dataset(&config)?;
            let index = HttpIndex::from_config(&config)?;
            let dispatcher = build_dispatcher(&config, &store)?;
            let summary = pipeline.run(&records, &index, &dispatcher).await?;
            report(&summary, args.summary_json)?;
        }
        Commands::Verify(args) => {
            let records = load_dataset(&config)?;
            let index = HttpIndex::from_config(&config)?;
            let sets = pipeline.canonicalize_phase(&records)?;
            let mut summary = RunSummary::default();
            pipeline.verify_phase(&index, &sets, &mut summary).await?;
            report(&summary, args.summary_json)?;
        }
        Commands::Scan(args) => {
            let index = HttpIndex::from_config(&config)?;
            let mut summary = RunSummary::default();
            pipeline.scan_phase(&index, &mut summary).await?;
            report(&summary, args.summary_json)?;
        }
        Commands::Fix(args) => {
            let dispatcher = build_dispatcher(&config, &store)?;
            let mut summary = RunSummary::default();
            pipeline.fix_phase(&dispatcher, &mut summary).await?;
            report(&summary, args.summary_json)?;
        }
        Commands::ClearFailures => {
            FailureLog::clear(store.failure_log_path())?;
            log::info!("failure log cleared");
        }
    }

    Ok(())
}

fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(dataset) = &overrides.dataset {
        config.dataset_file = Some(dataset.clone());
    }
    if let Some(index_url) = &overrides.index_url {
        config.index_url = index_url.clone();
    }
    if let Some(work_dir) = &overrides.work_dir {
        config.work_dir = work_dir.clone();
    }
    if let Some(batch_size) = overrides.batch_size {
        config.verify_batch_size = batch_size;
    }
    if let Some(strategy) = &overrides.strategy {
        config.query_strategy = strategy.clone();
    }
    if overrides.parallel {
        config.parallel_dispatch = true;
    }
}

fn load_dataset(config: &Config) -> Result<Vec<SourceRecord>> {
    match config.backing_store()? {
        BackingStore::File => {
            let path = config
                .dataset_file
                .as_ref()
                .context("backing_store = \"file\" requires dataset_file")?;
            let file = File::open(path)
                .with_context(|| format!("opening dataset {}", path.display()))?;
            let records = read_records(BufReader::new(file))
                .with_context(|| format!("reading dataset {}", path.display()))?;
            log::info!("dataset: {} records from {}", records.len(), path.display());
            Ok(records)
        }
    }
}

fn build_dispatcher(config: &Config, store: &WorkingStore) -> Result<Dispatcher> {
    let failure_log = Arc::new(FailureLog::open(store.failure_log_path())?);
    let mut instances: Vec<Arc<dyn IndexAdmin>> = Vec::new();
    for url in config.instances() {
        instances.push(Arc::new(HttpIndex::for_instance(config, &url)?));
    }
    log::info!(
        "dispatching to {} instance(s), {}",
        instances.len(),
        if config.parallel_dispatch { "parallel" } else { "sequential" }
    );
    Ok(Dispatcher::new(
        instances,
        config.parallel_dispatch,
        failure_log,
    ))
}

fn report(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{}", summary.render());
    }
    let failed = summary.total_failed();
    if failed > 0 {
        log::warn!("{failed} corrective request(s) failed; see the failure log");
    }
    Ok(())
}
