//! passkeys-server binary.

use clap::Parser;
use passkeys_server::{Cli, server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let _guard = passkeys_log::init_with(config.logging.clone())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen,
        backend = ?config.database.backend,
        "passkeys server starting"
    );

    let manager = server::build_manager(&config).await?;
    server::serve(&config, manager).await
}
