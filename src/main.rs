use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use brewery_quality::app::ports::TableStorePort;
use brewery_quality::app::{IngestUseCase, PaginationSettings, QualityGateUseCase, TableNames};
use brewery_quality::config::Config;
use brewery_quality::constants;
use brewery_quality::dashboard::{find_invalid_types, render_invalid_types, Dashboard};
use brewery_quality::infra::{InMemoryTableStore, ReqwestHttp, SqliteTableStore};
use brewery_quality::logging;
use brewery_quality::metrics;
use brewery_quality::pipeline::processing::quality_gate::QualityGate;

#[derive(Parser)]
#[command(name = "brewery_quality")]
#[command(about = "Fetch the brewery dataset, run data quality checks and store raw, check and clean tables")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory for JSON log files
    #[arg(long, global = true, default_value = constants::DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all pages, check quality, clean, and replace the three tables
    Run {
        /// Keep results in memory instead of writing the SQLite database
        #[arg(long)]
        dry_run: bool,
    },
    /// Check and clean a local JSON array of records without network or storage
    Check {
        /// JSON file containing an array of records
        #[arg(long)]
        input: PathBuf,
    },
    /// Summarize the stored raw, quality and clean tables
    Dashboard,
    /// List stored raw rows whose brewery type is not accepted
    InvalidTypes,
}

async fn run_pipeline(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    let http = ReqwestHttp::new(Duration::from_secs(config.api.timeout_seconds))?;
    let ingest = IngestUseCase::new(Box::new(http), PaginationSettings::from(&config.api));

    let store: Box<dyn TableStorePort> = if dry_run {
        info!("Dry run: tables are kept in memory");
        Box::new(InMemoryTableStore::new())
    } else {
        Box::new(SqliteTableStore::open(&config.storage.db_path)?)
    };
    let use_case = QualityGateUseCase::new(
        QualityGate::new(config.quality_gate_config()),
        store,
        TableNames::from(&config.storage),
    );

    println!("📡 Fetching breweries from {}...", config.api.base_url);
    let raw = ingest.fetch_all().await?;
    println!("✅ Fetched {} raw records", raw.len());

    let summary = use_case.run(&raw).await?;
    if summary.raw_count == 0 {
        println!("No data fetched; stored tables left unchanged.");
        return Ok(());
    }

    println!("\n📊 Pipeline Results (run {}):", summary.run_id);
    println!("   Raw records:   {}", summary.raw_count);
    println!("   Clean records: {}", summary.clean_count);
    println!(
        "   Checks passed: {}/{}",
        summary.rules_passed(),
        summary.report.len()
    );
    for result in &summary.report.results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!("   - [{}] {}: {}", status, result.name, result.description);
    }
    Ok(())
}

fn check_file(config: &Config, input: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let raw = match serde_json::from_str::<Value>(&content)? {
        Value::Array(records) => records,
        _ => bail!("{} must contain a JSON array of records", input.display()),
    };

    let gate = QualityGate::new(config.quality_gate_config());
    let records = gate.parse_records(&raw);
    let report = gate.evaluate(&records);
    let clean = gate.clean(&records);

    let output = json!({
        "report": report,
        "original_count": clean.original_count(),
        "clean_count": clean.len(),
        "dropped": clean.drops(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Open the database for reading. A database that was never created reads as empty.
fn open_read_store(config: &Config) -> anyhow::Result<Box<dyn TableStorePort>> {
    if Path::new(&config.storage.db_path).exists() {
        Ok(Box::new(SqliteTableStore::open(&config.storage.db_path)?))
    } else {
        info!(
            "Database {} not found, showing empty tables",
            config.storage.db_path
        );
        Ok(Box::new(InMemoryTableStore::new()))
    }
}

async fn show_dashboard(config: &Config) -> anyhow::Result<()> {
    let store = open_read_store(config)?;
    let dashboard = Dashboard::load(
        store.as_ref(),
        &TableNames::from(&config.storage),
        &config.quality.category_field,
    )
    .await?;
    print!("{}", dashboard.render());
    Ok(())
}

async fn show_invalid_types(config: &Config) -> anyhow::Result<()> {
    let store = open_read_store(config)?;
    let raw = store.load_table(&config.storage.raw_table).await?;
    let invalid = find_invalid_types(&raw, &config.quality_gate_config());
    print!("{}", render_invalid_types(&invalid));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    logging::init_logging(&cli.log_dir);
    metrics::init_metrics();

    let config = Config::load(&cli.config)?;

    let result = match &cli.command {
        Commands::Run { dry_run } => {
            println!("🚀 Running brewery pipeline...");
            run_pipeline(&config, *dry_run).await
        }
        Commands::Check { input } => check_file(&config, input),
        Commands::Dashboard => show_dashboard(&config).await,
        Commands::InvalidTypes => show_invalid_types(&config).await,
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
