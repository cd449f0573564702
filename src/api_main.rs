//! Bingo Hall API Server Binary

use bingohall::{
    api::ApiServer,
    config::{ConfigLoader, HallConfig},
    ledger::{BalanceStore, EntityAccount, InMemoryBalanceBook},
};
use clap::{Parser, ValueEnum};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Development,
    Production,
}

#[derive(Parser, Debug)]
#[command(name = "bingohall-api")]
#[command(about = "Bingo hall pattern and settlement API", long_about = None)]
struct Args {
    /// TOML configuration file; environment overrides still apply
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a named preset instead of the defaults (ignored with --config)
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// JSON array of card layouts
    #[arg(long)]
    card_pool: Option<PathBuf>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// JSON array of accounts to seed, parents before children
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Write the resolved configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<HallConfig, Box<dyn std::error::Error>> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => ConfigLoader::new().with_path(path).load()?,
            (None, Some(Preset::Development)) => {
                ConfigLoader::new().load_with_base(HallConfig::development())?
            }
            (None, Some(Preset::Production)) => {
                ConfigLoader::new().load_with_base(HallConfig::production())?
            }
            (None, None) => ConfigLoader::new().load()?,
        };

        if let Some(host) = &self.host {
            config.api.host = host.clone();
        }
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(path) = &self.card_pool {
            config.game.card_pool_path = Some(path.clone());
        }
        if let Some(origins) = &self.cors_origins {
            config.api.allowed_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(timeout) = self.timeout {
            config.api.request_timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

async fn seed_accounts(path: &Path) -> Result<InMemoryBalanceBook, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let accounts: Vec<EntityAccount> = serde_json::from_str(&content)?;
    let book = InMemoryBalanceBook::new();
    for account in accounts {
        book.upsert(account).await?;
    }
    Ok(book)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.resolve_config()?;

    if let Some(path) = &args.write_config {
        ConfigLoader::new().save(&config, path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let store = match &args.accounts {
        Some(path) => Arc::new(seed_accounts(path).await?),
        None => Arc::new(InMemoryBalanceBook::new()),
    };

    ApiServer::with_store(config, store).run().await?;
    Ok(())
}
