//! shiptrack - terminal front end for package tracking.
//!
//! Looks up tracking numbers against the spreadsheet-backed shipment store
//! and exposes the admin create/update/delete operations.

mod cli;
mod render;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shiptrack_core::{
    AdminRepository, Config, Lookup, Refresh, RefreshEvent, RefreshOutcome, RefreshTicker,
    Settings, SheetClient, StatusCatalog, UpdatePath,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{AdminCommand, Cli, Command};

/// Buffer size for the refresh event channel.
const EVENT_CHANNEL_SIZE: usize = 16;

/// Log file prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "shiptrack.log";

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let mut config = Config::load()?;
    config.apply_env()?;
    args.apply(&mut config);
    let settings = config.resolve()?;

    let _log_guard = init_tracing(settings.log_dir.as_deref());
    info!(tab = %settings.tab, "shiptrack starting");

    let store = Arc::new(
        SheetClient::from_settings(&settings).context("Failed to create store client")?,
    );

    match args.command {
        Command::Track { tracking_id } => track(store, &settings, &tracking_id).await,
        Command::Refresh => refresh(store, &settings).await,
        Command::Watch { tracking_id, ticks, admin } => {
            watch(store, &settings, tracking_id, ticks, admin).await
        }
        Command::Admin { command } => run_admin(store, &settings, command).await,
    }
}

fn lookup_for(store: Arc<SheetClient>, settings: &Settings) -> Lookup<SheetClient> {
    Lookup::with_system_clock(store, settings.cache_ttl)
}

async fn track(store: Arc<SheetClient>, settings: &Settings, tracking_id: &str) -> Result<()> {
    let lookup = lookup_for(store, settings);
    let results = lookup
        .search(tracking_id)
        .await
        .context("We're having trouble connecting to the tracking system")?;

    match results.first() {
        Some(latest) => print!("{}", render::shipment_details(latest, results.len(), Utc::now())),
        None => println!("{}", render::not_found(tracking_id)),
    }
    Ok(())
}

async fn refresh(store: Arc<SheetClient>, settings: &Settings) -> Result<()> {
    let lookup = lookup_for(store, settings);
    match lookup.force_refresh().await.context("Refresh failed")? {
        RefreshOutcome::Refreshed(count) => println!("Loaded {} shipments", count),
        RefreshOutcome::Skipped => println!("Refresh already in progress"),
    }
    println!("{}", lookup.cache_status().await);
    Ok(())
}

async fn watch(
    store: Arc<SheetClient>,
    settings: &Settings,
    tracking_id: Option<String>,
    ticks: Option<usize>,
    admin: bool,
) -> Result<()> {
    let lookup = Arc::new(lookup_for(store.clone(), settings));
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

    let target: Arc<dyn Refresh> = if admin {
        let repo = Arc::new(AdminRepository::with_system_clock(store).with_lookup(lookup.clone()));
        repo.list().await.context("Initial load failed")?;
        repo as Arc<dyn Refresh>
    } else {
        lookup.prefetch().await.context("Initial load failed")?;
        lookup.clone() as Arc<dyn Refresh>
    };
    println!("{} - refreshing every {}s", lookup.cache_status().await, settings.refresh_interval.as_secs());

    let handle = RefreshTicker::spawn(target, settings.refresh_interval, tx);

    let mut seen = 0;
    while let Some(event) = rx.recv().await {
        println!("{}", render::event_line(&event, Utc::now()));

        if let (Some(id), RefreshEvent::Refreshed { .. }) = (&tracking_id, &event) {
            match lookup.search_cached(id).await.first() {
                Some(latest) => println!(
                    "  {} is {} ({:.0}%)",
                    latest.tracking_id,
                    StatusCatalog::metadata_for(&latest.status).label,
                    latest.progress_percent()
                ),
                None => println!("  {}", render::not_found(id).lines().next().unwrap_or_default()),
            }
        }

        seen += 1;
        if ticks.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    handle.abort();
    Ok(())
}

async fn run_admin(store: Arc<SheetClient>, settings: &Settings, command: AdminCommand) -> Result<()> {
    let repo = AdminRepository::with_system_clock(store);

    match command {
        AdminCommand::List => {
            let shipments = repo.list().await.context("Failed to load shipments")?;
            print!("{}", render::admin_table(&shipments));
        }
        AdminCommand::Add(args) => {
            let row = repo
                .create(args.into())
                .await
                .context("Failed to add shipment")?;
            println!("Shipment {} added (ETA {})", row[0], row[5]);
        }
        AdminCommand::Update(args) => {
            let (row, changes) = args.into_update();
            let path = repo
                .update(row, changes)
                .await
                .context("Failed to update shipment")?;
            match path {
                UpdatePath::Patched => println!("Shipment at row {} updated", row),
                UpdatePath::AppendedFallback => println!(
                    "Store rejected the in-place edit; row {} was re-added with the changes",
                    row
                ),
            }
        }
        AdminCommand::Delete { row, yes } => {
            let shipments = repo.list().await.context("Failed to load shipments")?;
            let tracking_id = shipments
                .iter()
                .find(|s| s.row_index == row)
                .map(|s| s.tracking_id.clone())
                .unwrap_or_else(|| format!("at row {}", row));

            if !yes && !confirm(&format!("Are you sure you want to delete shipment {}?", tracking_id))? {
                println!("Cancelled");
                return Ok(());
            }
            repo.delete(row).await.context("Failed to delete shipment")?;
            println!("Shipment {} deleted", tracking_id);
        }
    }

    info!(tab = %settings.tab, "Admin command complete");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
