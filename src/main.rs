use std::{process::ExitCode, sync::Arc};

use datagraph_mcp::{
    api::{probe_health, HttpDataGraphClient},
    config::Config,
    logging,
    mcp::stdio::run_stdio,
    AppState,
};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("datagraph-mcp: {err}");
            return ExitCode::FAILURE;
        }
    };

    let client = match HttpDataGraphClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("datagraph-mcp: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        api_url = %config.api_url,
        auth_scheme = %config.auth_scheme,
        timeout_secs = config.timeout.as_secs(),
        "server starting"
    );

    let state = AppState::new(&config, Arc::new(client));
    probe_health(state.api.as_ref()).await;

    match run_stdio(&state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "stdio transport failed");
            ExitCode::FAILURE
        }
    }
}
