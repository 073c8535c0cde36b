//! basalt-server: loads the catalog, binds the socket and serves clients
//! one at a time until a `shutdown` command arrives.

use anyhow::Context;
use basalt::config::ServerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "basalt-server", about = "Basalt column store server", version)]
struct Args {
    /// Path to a basalt.toml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Unix-domain socket to listen on (overrides config)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Data directory holding the catalog and column files (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Disable metrics flushing
    #[arg(long)]
    no_metrics: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(socket) = args.socket {
        config.socket_path = socket;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if args.no_metrics {
        config.metrics_enabled = false;
    }

    println!(
        "basalt-server listening on {} (data: {})",
        config.socket_path.display(),
        config.data_dir.display()
    );
    basalt::net::serve(&config).context("server loop")?;
    println!("basalt-server stopped.");
    Ok(())
}
