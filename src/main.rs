//! roomchatd - the roomchat server binary.

use anyhow::Context as _;
use roomchat::config::{self, Config, ENV_VAR};
use roomchat::network::Gateway;
use roomchat::services::spawn_mute_sweeper;
use roomchat::state::Matrix;
use roomchat::telemetry;
use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            eprintln!("config error: {e}");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    let activity_log = match config.logging.activity_log_path() {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open activity log {path}"))?,
        ),
        None => None,
    };
    telemetry::init(activity_log);

    let address_mode = config
        .listen
        .address_mode(std::env::var(ENV_VAR).ok().as_deref());
    info!(
        server = %config.server.name,
        admin = %config.server.admin_username,
        address_mode = ?address_mode,
        "Starting roomchatd"
    );

    let matrix = Arc::new(Matrix::new(&config, address_mode));

    spawn_mute_sweeper(
        Arc::clone(&matrix),
        Duration::from_secs(config.moderation.sweep_interval_secs),
    );

    {
        let matrix = Arc::clone(&matrix);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupt received");
                    matrix.lifecycle.shutdown("signal");
                }
                Err(e) => error!(error = %e, "Failed to listen for interrupt"),
            }
        });
    }

    let gateway = Gateway::bind(
        config.listen.address,
        Arc::clone(&matrix),
        config.limits.max_line_length,
    )
    .await?;

    gateway.run().await?;
    info!("Server stopped");
    Ok(())
}
