pub mod cli;
pub mod config;
pub mod crypto;
pub mod db;
pub mod entities;
pub mod services;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use crypto::{CredentialHasher, MasterKey, SecretCodec};
use db::Store;
use services::{AuditRecorder, Scheduler, SeaOrmVaultService, SessionManager};

/// Wire a vault service over an open store using the given config.
///
/// # Errors
///
/// Fails when the configured master key is missing or malformed.
pub fn build_vault_service(config: &Config, store: Store) -> anyhow::Result<SeaOrmVaultService> {
    let master_key = config.master_key()?;
    let codec = SecretCodec::new(&master_key);
    let hasher = CredentialHasher::new(&config.security);
    let sessions = SessionManager::new(store.clone(), hasher.clone(), &config.vault);
    let audit = AuditRecorder::new(store.clone());

    Ok(SeaOrmVaultService::new(
        store,
        codec,
        hasher,
        sessions,
        audit,
        &config.vault,
    ))
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon => {
            config.validate()?;
            run_daemon(config).await
        }
        Commands::Sweep => {
            config.validate()?;
            run_sweep(config).await
        }
        Commands::GenKey => {
            cmd_gen_key();
            Ok(())
        }
        Commands::Init => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml, set the master key, and run again.");
            Ok(())
        }
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Callvault v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let store = open_store(&config).await?;
    store.ping().await?;

    let hasher = CredentialHasher::new(&config.security);
    let sessions = SessionManager::new(store, hasher, &config.vault);
    let scheduler = Scheduler::new(sessions, config.scheduler.clone());

    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    info!("Daemon stopped");

    Ok(())
}

async fn run_sweep(config: Config) -> anyhow::Result<()> {
    info!("Running session sweep...");

    let store = open_store(&config).await?;
    let hasher = CredentialHasher::new(&config.security);
    let sessions = SessionManager::new(store, hasher, &config.vault);
    let scheduler = Scheduler::new(sessions, config.scheduler.clone());

    let swept = scheduler.run_once().await?;

    println!("✓ Swept {swept} expired vault session(s)");
    Ok(())
}

fn cmd_gen_key() {
    let key = MasterKey::generate();

    println!("{}", key.to_hex());
    println!();
    println!("Set this as VAULT_MASTER_KEY or vault.master_key in config.toml.");
    println!("Keep it out of version control; losing it makes stored credentials unreadable.");
}
