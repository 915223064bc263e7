use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use fttm_core::{AppConfig, BrandsFile, DashboardState, DatePreset, MetricKind};
use fttm_db::{PgMetricStore, PoolConfig, RetryPolicy};
use fttm_import::{ImportOptions, Strategy};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

mod dashboard;
mod entry;
mod format;
mod import;
mod login;
mod overview;
mod summary;

#[cfg(test)]
mod tests;

use entry::EntryCommands;

#[derive(Debug, Parser)]
#[command(name = "fttm-cli")]
#[command(about = "FTT marketing metrics command line interface")]
struct Cli {
    /// Operator username for commands that write data
    #[arg(long, env = "FTTM_USER", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Enter a single metric row by hand
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Import a CSV file of metric rows
    Import {
        /// Record kind: traffic, ads, postings, index or rank
        kind: MetricKind,
        file: PathBuf,
        /// Answer for rows that already exist, instead of prompting
        #[arg(long)]
        on_duplicate: Option<Strategy>,
        /// Reconcile and report without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a CSV template for a record kind
    Template { kind: MetricKind },
    /// Print stored rows, newest first
    Overview {
        #[arg(long)]
        kind: Option<MetricKind>,
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// KPIs and trends for a date range
    Dashboard {
        /// last-7-days, last-30-days, last-60-days, last-90-days or year-to-date
        #[arg(long, conflicts_with_all = ["from", "to"])]
        preset: Option<DatePreset>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Restrict to these brands (repeatable; defaults to all)
        #[arg(long = "brand")]
        brands: Vec<String>,
    },
    /// Printable per-brand summary of the latest rows
    Summary {
        #[arg(long, default_value = "4")]
        latest: u32,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn dashboard_state(
    brands: &BrandsFile,
    today: NaiveDate,
    preset: Option<DatePreset>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    selected: Vec<String>,
) -> anyhow::Result<DashboardState> {
    if let Some(unknown) = selected.iter().find(|b| !brands.is_known(b)) {
        anyhow::bail!(
            "unknown brand '{unknown}'; configured brands: {}",
            brands.names().join(", ")
        );
    }
    let selected = if selected.is_empty() {
        brands.names()
    } else {
        selected
    };
    Ok(DashboardState::resolve(today, preset, from, to, selected))
}

/// Reads configuration and brands and starts logging. Touches no database.
fn load_settings() -> anyhow::Result<(AppConfig, BrandsFile)> {
    let config = fttm_core::load_app_config().context("failed to load configuration")?;
    init_tracing(&config)?;
    let brands =
        fttm_core::load_brands(&config.brands_path).context("failed to load brands config")?;
    Ok((config, brands))
}

/// Configuration, brands and store shared by every database-backed command.
struct Runtime {
    config: AppConfig,
    brands: BrandsFile,
    pool: PgPool,
    store: PgMetricStore,
}

impl Runtime {
    async fn load() -> anyhow::Result<Self> {
        let (config, brands) = load_settings()?;
        Self::connect(config, brands).await
    }

    /// Like [`Runtime::load`] for commands that write: the operator must log
    /// in before any connection is opened.
    async fn load_as_operator(user: Option<&str>) -> anyhow::Result<Self> {
        let (config, brands) = load_settings()?;
        let password = std::env::var("FTTM_PASSWORD").ok();
        Self::connect_as_operator(config, brands, user, password.as_deref()).await
    }

    async fn connect_as_operator(
        config: AppConfig,
        brands: BrandsFile,
        user: Option<&str>,
        password: Option<&str>,
    ) -> anyhow::Result<Self> {
        login::require_operator(&config, user, password)?;
        Self::connect(config, brands).await
    }

    async fn connect(config: AppConfig, brands: BrandsFile) -> anyhow::Result<Self> {
        let pool =
            fttm_db::connect_pool(&config.database_url, PoolConfig::from_app_config(&config))
                .await
                .context("failed to connect to database")?;
        let store = PgMetricStore::new(pool.clone(), RetryPolicy::from_app_config(&config));

        Ok(Self {
            config,
            brands,
            pool,
            store,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Template { kind }) => {
            print!("{}", fttm_import::template_csv(kind)?);
        }
        Some(Commands::Db { command }) => {
            let rt = Runtime::load().await?;
            match command {
                DbCommands::Ping => {
                    fttm_db::ping(&rt.pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = fttm_db::run_migrations(&rt.pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Some(Commands::Entry { command }) => {
            let rt = Runtime::load_as_operator(cli.user.as_deref()).await?;
            entry::run_entry(&rt.store, &rt.brands, command, today).await?;
        }
        Some(Commands::Import {
            kind,
            file,
            on_duplicate,
            dry_run,
        }) => {
            let rt = Runtime::load_as_operator(cli.user.as_deref()).await?;
            import::run_import(
                &rt.store,
                kind,
                &file,
                ImportOptions::from_app_config(&rt.config),
                on_duplicate,
                dry_run,
            )
            .await?;
        }
        Some(Commands::Overview { kind, limit, json }) => {
            let rt = Runtime::load().await?;
            overview::run_overview(&rt.store, kind, limit, json).await?;
        }
        Some(Commands::Dashboard {
            preset,
            from,
            to,
            brands,
        }) => {
            let rt = Runtime::load().await?;
            let state = dashboard_state(&rt.brands, today, preset, from, to, brands)?;
            dashboard::run_dashboard(&rt.store, &state).await?;
        }
        Some(Commands::Summary { latest }) => {
            let rt = Runtime::load().await?;
            summary::run_summary(&rt.store, &rt.brands, latest).await?;
        }
        None => println!("fttm-cli ready; run with --help for commands"),
    }

    Ok(())
}
