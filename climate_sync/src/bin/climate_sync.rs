use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use climate_sync::config::{CO2_EMISSIONS_TOTAL, IngestConfig, load_config_path};
use climate_sync::db::{connection::connect_sqlite, migrate};
use climate_sync::ingest::{self, IngestOptions, RunSummary};
use climate_sync::query;
use shared_utils::env::{get_env_var, get_env_var_opt};

#[derive(Parser)]
#[command(version, about = "Climate Sync CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply embedded schema migrations.
    Migrate,
    /// Fetch one dataset and reconcile it into the store.
    Ingest {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        config: ConfigArg,
    },
    /// List configured datasets.
    Datasets {
        #[command(flatten)]
        config: ConfigArg,
    },
    /// Print stored data as JSON.
    Export(ExportCmd),
}

#[derive(Args)]
struct ConfigArg {
    /// Dataset catalog TOML; defaults to $CLIMATE_SYNC_CONFIG, then the built-in catalog.
    #[arg(long, value_name = "FILE")]
    config: Option<String>,
}

impl ConfigArg {
    fn load(&self) -> Result<IngestConfig> {
        match self.config.clone().or_else(|| get_env_var_opt("CLIMATE_SYNC_CONFIG")) {
            Some(path) => load_config_path(path),
            None => IngestConfig::builtin(),
        }
    }
}

#[derive(Args)]
struct ExportCmd {
    #[command(flatten)]
    config: ConfigArg,
    #[command(subcommand)]
    sub: ExportSub,
}

#[derive(Subcommand)]
enum ExportSub {
    /// Upper, lower and global average anomaly per region and year.
    Temperature,
    /// Total emissions as year -> region code -> value.
    Co2,
    /// Every indicator of a group, nested by region and year.
    Group { name: String },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db_url = || get_env_var("DATABASE_URL").context("DATABASE_URL must point at the SQLite store");

    match cli.cmd {
        Cmd::Migrate => migrate::run_all(&db_url()?)?,
        Cmd::Datasets { config } => {
            let cfg = config.load()?;
            for (name, ds) in &cfg.datasets {
                println!("{name}\t{}\t{}", ds.group.name, ds.csv_url);
            }
        }
        Cmd::Ingest {
            dataset,
            dry_run,
            config,
        } => {
            let cfg = config.load()?;
            let ds = cfg.dataset(&dataset)?;
            info!(dataset = %dataset, group = %ds.group.name, dry_run, "starting ingestion");
            let source = climate_source::providers::build_source()?;
            let mut conn = connect_sqlite(&db_url()?)?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let fetched = runtime.block_on(ingest::fetch(source.as_ref(), &cfg, &dataset))?;

            let plan = ingest::ingest_fetched(
                &mut conn,
                &cfg,
                &dataset,
                &fetched,
                IngestOptions { dry_run },
            )?;
            if dry_run {
                println!("{plan}");
            }
            print_json(&RunSummary::from(&plan))?;
        }
        Cmd::Export(ExportCmd { config, sub }) => {
            let cfg = config.load()?;
            let mut conn = connect_sqlite(&db_url()?)?;
            match sub {
                ExportSub::Temperature => {
                    let keys = query::TemperatureKeys {
                        group: cfg.dataset("temperature")?.group.name.clone(),
                        ..Default::default()
                    };
                    print_json(&query::temperature_by_region(&mut conn, &keys)?)?
                }
                ExportSub::Co2 => {
                    let group = &cfg.dataset("co2")?.group.name;
                    print_json(&query::values_by_year(&mut conn, group, CO2_EMISSIONS_TOTAL)?)?
                }
                ExportSub::Group { name } => print_json(&query::group_series(&mut conn, &name)?)?,
            }
        }
    }

    Ok(())
}
