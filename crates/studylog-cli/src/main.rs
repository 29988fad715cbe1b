use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use studylog_adapters::{LeetCodeClient, ProblemSource};
use studylog_storage::{MemoryProblemStore, PgProblemStore, ProblemStore};
use studylog_sync::{
    import_range, import_slugs, seed_top100, AppConfig, Reconciler, Scheduler, Top100Seed,
};
use studylog_web::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "studylog")]
#[command(about = "Coding-problem study log: daily problem sync and catalog API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP API and the midnight scheduler.
    Serve {
        /// Keep the catalog in memory instead of PostgreSQL.
        #[arg(long)]
        in_memory: bool,
    },
    /// Run one daily reconciliation pass and exit.
    Sync,
    /// Insert the Top-100 list.
    Seed {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Fetch problems by slug or by frontend-id range and add them to the catalog.
    Import {
        #[arg(long = "slug")]
        slugs: Vec<String>,
        #[arg(long, requires = "to")]
        from: Option<u32>,
        #[arg(long, requires = "from")]
        to: Option<u32>,
    },
    /// Apply database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve { in_memory: false }) {
        Commands::Serve { in_memory } => serve(config, in_memory).await?,
        Commands::Sync => {
            let store = open_store(&config, false).await?;
            let reconciler = Reconciler::new(source(&config)?, store);
            let report = reconciler.run_pass(Local::now().date_naive()).await?;
            println!(
                "sync complete: run_id={} date={} problem_id={} title={} created={} history_recorded={}",
                report.run_id,
                report.date,
                report.problem_id,
                report.title,
                report.created,
                report.history_recorded
            );
        }
        Commands::Seed { file } => {
            let store = open_store(&config, false).await?;
            let seed = Top100Seed::load(file.as_deref().or(config.seed_path.as_deref())).await?;
            let summary = seed_top100(store.as_ref(), &seed).await;
            println!(
                "seed complete: inserted={} skipped={} failed={}",
                summary.inserted, summary.skipped, summary.failed
            );
        }
        Commands::Import { slugs, from, to } => {
            let store = open_store(&config, false).await?;
            let source = source(&config)?;
            let summary = match (from, to) {
                (Some(from), Some(to)) => {
                    import_range(source.as_ref(), store.as_ref(), from, to, config.import_delay())
                        .await?
                }
                _ if !slugs.is_empty() => {
                    import_slugs(source.as_ref(), store.as_ref(), &slugs, config.import_delay())
                        .await
                }
                _ => bail!("import needs --slug or --from/--to"),
            };
            println!(
                "import complete: imported={} skipped={} failed={}",
                summary.imported, summary.skipped, summary.failed
            );
        }
        Commands::Migrate => {
            open_store(&config, false).await?;
            println!("migrations applied");
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig, in_memory: bool) -> Result<Arc<dyn ProblemStore>> {
    if in_memory {
        warn!("using in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryProblemStore::new()));
    }
    let store = PgProblemStore::connect(&config.database_url)
        .await
        .context("connecting to postgres")?;
    store.run_migrations().await.context("running migrations")?;
    Ok(Arc::new(store))
}

fn source(config: &AppConfig) -> Result<Arc<dyn ProblemSource>> {
    let client = LeetCodeClient::new(config.leetcode()).context("building leetcode client")?;
    Ok(Arc::new(client))
}

async fn serve(config: AppConfig, in_memory: bool) -> Result<()> {
    let store = open_store(&config, in_memory).await?;
    let seed = Top100Seed::load(config.seed_path.as_deref()).await?;
    if config.seed_on_start {
        seed_top100(store.as_ref(), &seed).await;
    }

    let reconciler = Arc::new(Reconciler::new(source(&config)?, store.clone()));
    let cancel = CancellationToken::new();

    let scheduler = if config.scheduler_enabled {
        Some(Scheduler::new(reconciler.clone()).spawn(cancel.clone()))
    } else {
        info!("daily scheduler disabled");
        None
    };

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "could not listen for ctrl-c");
                return;
            }
            info!("shutdown requested");
            cancel.cancel();
        }
    });

    let state = AppState::new(store).with_job(reconciler).with_seed(seed);
    let served = studylog_web::serve(state, config.web_port, cancel.clone()).await;
    cancel.cancel();

    if let Some(handle) = scheduler {
        let exit = handle.await.context("joining scheduler task")?;
        info!(?exit, "scheduler exited");
    }
    served
}
