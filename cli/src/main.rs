//! Process entrypoint. Subcommands select which role this instance plays:
//! the HTTP submission/progress surface (`serve`), the pipeline worker pool
//! (`worker`), or a one-shot sweep of stale `pending` requests (`sweep`),
//! matching the teacher's pattern of one binary dispatching roles via
//! `clap::Parser` subcommands rather than separate crates per role.

mod bootstrap;

use bootstrap::Bootstrap;
use clap::Parser;
use clap::Subcommand;
use serenity_submission::Sweeper;
use serenity_worker::StartRateLimiter;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "serenity", version, about = "Meditation video generation control plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP submission/list/progress API (spec §6).
    Serve,
    /// Run the pipeline worker pool plus the background sweeper (spec §4.6, §4.4 S1).
    Worker,
    /// Run one sweep of stale `pending` requests and exit.
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = serenity_config::Config::load()?;
    let bootstrap = Bootstrap::connect(&config).await?;

    match cli.command {
        Command::Serve => run_serve(bootstrap).await,
        Command::Worker => run_worker(bootstrap).await,
        Command::Sweep => run_sweep(bootstrap).await,
    }
}

async fn run_serve(bootstrap: Bootstrap) -> anyhow::Result<()> {
    let state = serenity_api::AppState::new(bootstrap.submission(), bootstrap.store.clone());
    let app = serenity_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bootstrap.config.http_listen_addr).await?;
    tracing::info!(addr = %bootstrap.config.http_listen_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_worker(bootstrap: Bootstrap) -> anyhow::Result<()> {
    let worker = Arc::new(bootstrap.pipeline_worker());
    let rate_limiter = Arc::new(StartRateLimiter::new(
        bootstrap.config.worker_rate_limit_per_minute,
    ));
    let concurrency = bootstrap.config.worker_concurrency;
    let store = bootstrap.store.clone();
    let queue = bootstrap.queue.clone();

    let sweeper = Sweeper::new(store.clone(), queue.clone(), to_chrono(bootstrap.config.sweeper_grace_period));
    let sweeper_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match sweeper.sweep_once().await {
                Ok(count) if count > 0 => tracing::info!(count, "sweeper re-enqueued stale requests"),
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "sweep failed"),
            }
        }
    });

    serenity_worker::run(worker, store, queue, concurrency, rate_limiter).await;
    sweeper_handle.abort();
    Ok(())
}

async fn run_sweep(bootstrap: Bootstrap) -> anyhow::Result<()> {
    let sweeper = Sweeper::new(
        bootstrap.store.clone(),
        bootstrap.queue.clone(),
        to_chrono(bootstrap.config.sweeper_grace_period),
    );
    let count = sweeper.sweep_once().await?;
    tracing::info!(count, "sweep complete");
    Ok(())
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::seconds(300))
}
