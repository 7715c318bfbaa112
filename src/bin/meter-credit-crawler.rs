// ABOUTME: Command-line entry point for the meter credit crawler
// ABOUTME: Runs one batch, runs on a schedule, or manages the local SQLite store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Usage:
//! ```bash
//! # Crawl every due account once
//! meter-credit-crawler run-once
//!
//! # Crawl on the configured interval until Ctrl-C
//! meter-credit-crawler schedule
//!
//! # Create the local SQLite tables
//! meter-credit-crawler init-db
//!
//! # Add an account to the local SQLite store
//! meter-credit-crawler register-account --account-id 10001234 --secret hunter2
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use meter_credit_crawler::{
    build_orchestrator,
    config::{CrawlerConfig, StoreConfig},
    logging::{self, CrawlLogger},
    models::Credential,
    run_once,
    scheduler::CrawlScheduler,
    store::SqliteStore,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "meter-credit-crawler",
    about = "Harvest prepaid meter credit balances from the utility portal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl every due account once and exit
    RunOnce,

    /// Crawl on a fixed interval until interrupted
    Schedule,

    /// Add or update an account in the SQLite store
    RegisterAccount {
        /// Portal login id
        #[arg(long)]
        account_id: String,

        /// Portal password
        #[arg(long)]
        secret: String,
    },

    /// Create the SQLite tables
    InitDb,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_from_env()?;

    let config = CrawlerConfig::from_env().context("Failed to load configuration")?;
    info!("{}", config.summary());

    match cli.command {
        Command::RunOnce => match run_once(&config).await {
            Ok(report) => {
                println!("{}", report.summary());
                Ok(())
            }
            Err(e) => {
                CrawlLogger::log_run_failure(&e);
                Err(e.into())
            }
        },
        Command::Schedule => {
            let orchestrator = build_orchestrator(&config).await?;
            let mut scheduler = CrawlScheduler::new(orchestrator, config.schedule.interval);
            scheduler.run_until(shutdown_signal()).await;
            Ok(())
        }
        Command::RegisterAccount { account_id, secret } => {
            let store = sqlite_store(&config).await?;
            let credential = Credential::new(account_id, secret);
            store.register_account(&credential, None).await?;
            info!(account.id = %credential.account_id, "Account registered");
            Ok(())
        }
        Command::InitDb => {
            sqlite_store(&config).await?;
            info!("SQLite tables ready");
            Ok(())
        }
    }
}

async fn sqlite_store(config: &CrawlerConfig) -> Result<SqliteStore> {
    let StoreConfig::Sqlite { database_url } = &config.store else {
        bail!("This command manages the SQLite store; set STORE_BACKEND=sqlite");
    };
    Ok(SqliteStore::connect(database_url).await?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
