use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use server::config::ServerConfig;

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Coedit Realtime Document Server")]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file (overrides COEDIT_DB)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory of static assets to serve (overrides COEDIT_STATIC_DIR)
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    if let Some(port) = cli.port {
        config.bind_addr.set_port(port);
    }
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(dir) = cli.static_dir {
        config.static_dir = Some(dir);
    }

    server::run(config).await
}
