//! Standalone host for the provisioning reloader.
//!
//! Usage: `provisioning-reloader [settings-file]`
//!
//! Settings come from the optional file plus `RELOADER__*` environment
//! overrides. The service account token is read from
//! `GF_PLUGIN_APP_CLIENT_SECRET`.

use provisioning_reloader::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ENV_PREFIX: &str = "RELOADER";
const TOKEN_ENV: &str = "GF_PLUGIN_APP_CLIENT_SECRET";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "provisioning reloader failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = ReloaderSettings::load(settings_path.as_deref(), ENV_PREFIX)?;

    let token = std::env::var(TOKEN_ENV)
        .map_err(|_| ReloaderError::Settings(format!("{} is not set", TOKEN_ENV)))?;
    let client = bearer_client(&token)?;

    let supervisor = Supervisor::start(&settings, client)?;
    if supervisor.scopes().is_empty() {
        return Err(ReloaderError::Settings("no provisioning paths configured".to_string()));
    }
    info!(
        base_url = %settings.base_url(),
        scopes = ?supervisor.scopes(),
        "provisioning reloader started"
    );

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }

    info!("shutting down");
    if !supervisor.shutdown(settings.shutdown_timeout()).await {
        error!("failed to stop all observers in time");
    }
    Ok(())
}
