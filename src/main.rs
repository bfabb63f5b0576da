use std::path::PathBuf;

use employee_api::config::load_config;
use employee_api::lifecycle::{bootstrap, Shutdown};
use employee_api::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file: first argument, else EMPLOYEE_API_CONFIG, else defaults + env.
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("EMPLOYEE_API_CONFIG").map(PathBuf::from));

    let config = load_config(config_path.as_deref())?;
    init_logging(&config.observability)?;

    tracing::info!("employee-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = ?config.store.backend,
        table = %config.store.table,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let (server, listener) = bootstrap(config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
