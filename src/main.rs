//! `srv` service entry point.
//!
//! # Startup
//!
//! ```text
//! logging (bootstrap filter)
//!     → config::ConfigLoader (local → remote → validate)
//!     → logging filter set from log.level
//!     → Params handed to the service components
//! ```
//!
//! Any configuration error is fatal: the process exits non-zero before
//! serving anything.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use srv::config::remote::crypt;
use srv::config::{ConfigLoader, LocalResolver};
use srv::observability::logging;

#[derive(Parser)]
#[command(name = "srv")]
#[command(about = "Resolve and check the service configuration", long_about = None)]
struct Cli {
    /// Extra directory to search for config.toml (searched first, repeatable)
    #[arg(short = 'c', long = "config-dir")]
    config_dirs: Vec<PathBuf>,

    /// Print the resolved configuration as JSON
    #[arg(long)]
    print: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a keyring for encrypted remote config
    Keygen,
    /// Encrypt a config document for storage in the remote provider
    Seal {
        /// Keyring file
        #[arg(short, long)]
        keyring: PathBuf,
        /// JSON document to encrypt
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Keygen) => {
            let key = crypt::generate_key().map_err(|_| "random source unavailable")?;
            println!("{}", key);
            return Ok(());
        }
        Some(Commands::Seal { keyring, file }) => {
            let key = crypt::load_keyring(&keyring)?;
            let document = std::fs::read(&file)?;
            srv::config::remote::flatten_document(&document)?;
            let sealed = crypt::seal(&key, &document).map_err(|_| "encryption failed")?;
            println!("{}", sealed);
            return Ok(());
        }
        None => {}
    }

    let log = logging::init();
    tracing::info!("srv v{} starting", env!("CARGO_PKG_VERSION"));

    let mut local = LocalResolver::new();
    for dir in cli.config_dirs.into_iter().rev() {
        local = local.prepend_search_path(dir);
    }

    let params = match ConfigLoader::new().with_local(local).load().await {
        Ok(params) => params,
        Err(e) => {
            tracing::error!(error = %e, "Configuration failed, refusing to start");
            return Err(e.into());
        }
    };

    log.apply(params.log_level()?);

    if cli.print {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    tracing::info!(
        server_address = %params.server_address,
        stats_prefix = %params.stats.prefix,
        stats_network = %params.stats.network()?,
        stats_address = %params.stats.address,
        stats_flush_ms = params.stats.flush_period,
        "Configuration ready"
    );

    Ok(())
}
