use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use shardmeta::{
    MySqlDdlParser, RunnerConfig, TableMetaReconciler, TokioSqlJobRunner, Topology, init_table_meta,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shardmeta")]
#[command(about = "Reconcile table metadata across the shards of a logical table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe every data node of the topology's tables and print the reconciled metadata
    Reconcile {
        #[arg(long)]
        topology: PathBuf,
        /// Only reconcile this table
        #[arg(long)]
        table: Option<String>,
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
        #[arg(long, default_value_t = 1)]
        attempts: usize,
    },
    /// Parse a single CREATE TABLE statement into table metadata
    Parse {
        #[arg(long)]
        table: String,
        ddl: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Reconcile {
            topology,
            table,
            timeout_ms,
            attempts,
        } => {
            let config = RunnerConfig::new()
                .query_timeout(Duration::from_millis(timeout_ms))
                .max_attempts(attempts);
            reconcile(&topology, table.as_deref(), config).await
        }
        Command::Parse { table, ddl } => parse(&table, &ddl),
    }
}

async fn reconcile(path: &Path, only: Option<&str>, config: RunnerConfig) -> Result<()> {
    let topology = Topology::from_path(path)
        .with_context(|| format!("failed to load topology {}", path.display()))?;
    if let Some(name) = only {
        if topology.table(name).is_none() {
            return Err(anyhow!("table '{}' is not in the topology", name));
        }
    }

    let registry = Arc::new(topology.build_registry()?);
    let runner = Arc::new(TokioSqlJobRunner::new(config)?);
    let reconciler = TableMetaReconciler::new(registry, runner);

    let mut report = serde_json::Map::new();
    for table in topology.table_configs()? {
        if only.is_some_and(|name| name != table.name()) {
            continue;
        }
        let outcome = reconciler.reconcile(&topology.schema, Arc::clone(&table)).await?;
        info!(
            table = %table.name(),
            data_nodes = table.data_nodes().len(),
            drift = outcome.has_drift(),
            "table meta reconciled"
        );
        report.insert(table.name().to_string(), serde_json::to_value(&outcome)?);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse(table: &str, ddl_path: &Path) -> Result<()> {
    let ddl = fs::read_to_string(ddl_path)
        .with_context(|| format!("failed to read {}", ddl_path.display()))?;
    let version = chrono::Utc::now().timestamp_millis();
    let meta = init_table_meta(&MySqlDdlParser::new(), table, &ddl, version)?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}
