use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use release_matrix::config::{MatrixConfig, data_dir, version_path};
use release_matrix::logging::init_logging;
use release_matrix::matrix::{ProductStatus, build_matrix, run_update};
use release_matrix::release::HttpFetcher;
use release_matrix::version::{JsonStore, VersionRecord, VersionStore};

#[derive(Parser)]
#[command(name = "release-matrix")]
#[command(version, about = "Forward-guarded release matrix for VMS product images")]
struct Cli {
    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch releases, reconcile against the version record and save it
    Update {
        /// Version record path
        #[arg(long)]
        version_path: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reconcile without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the release matrix for the saved version record
    Matrix {
        #[arg(long)]
        version_path: Option<PathBuf>,

        /// Output file, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the saved version record
    Show {
        #[arg(long)]
        version_path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_level, cli.json_logs, Some(data_dir().as_path()));

    match cli.command {
        Command::Update {
            version_path,
            config,
            dry_run,
        } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(update(version_path, config.as_deref(), dry_run)),
        Command::Matrix {
            version_path,
            output,
        } => matrix(&load_record(version_path)?, output.as_deref()),
        Command::Show { version_path } => {
            show(&load_record(version_path)?);
            Ok(())
        }
    }
}

async fn update(
    version_path_arg: Option<PathBuf>,
    config_path: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let config = MatrixConfig::load(config_path)?;
    let store = JsonStore::new(version_path_arg.unwrap_or_else(version_path));
    let fetcher = HttpFetcher::new(&config.releases.base_url)?;

    let report = run_update(&store, &fetcher, &config, dry_run)
        .await
        .with_context(|| format!("Update of {} failed", store.path().display()))?;

    for outcome in &report.outcomes {
        match outcome.status {
            ProductStatus::Reconciled(result) => println!("{}: {}", outcome.product, result),
            ProductStatus::Skipped => println!("{}: skipped", outcome.product),
        }
    }
    println!("changed: {}", report.changed);

    Ok(())
}

fn load_record(version_path_arg: Option<PathBuf>) -> anyhow::Result<VersionRecord> {
    let store = JsonStore::new(version_path_arg.unwrap_or_else(version_path));
    store
        .load()?
        .with_context(|| format!("No version record at {}", store.path().display()))
}

fn matrix(record: &VersionRecord, output: Option<&Path>) -> anyhow::Result<()> {
    let mut content = serde_json::to_string_pretty(&build_matrix(record))?;
    content.push('\n');

    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", content),
    }

    Ok(())
}

fn show(record: &VersionRecord) {
    for set in record.products() {
        for entry in set.entries() {
            let labels: Vec<&str> = entry.labels.iter().map(|label| label.as_str()).collect();
            println!("{} {} [{}]", set.product(), entry.version, labels.join(", "));
        }
    }
}
