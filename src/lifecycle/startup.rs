//! Startup orchestration.
//!
//! Order: store client, metrics, store ping, listener. The exporter goes
//! first so the ping result is recorded. Only a bad store
//! configuration or an unbindable address is fatal; an unreachable store is
//! logged and requests will report it.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::store::{self, StoreError};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the server and bind its listener.
pub async fn bootstrap(config: ServiceConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let store = store::build_store(&config.store)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    match store.ping().await {
        Ok(()) => {
            tracing::info!(backend = ?config.store.backend, "Store reachable");
            metrics::record_store_health(true);
        }
        Err(e) => {
            tracing::warn!(backend = ?config.store.backend, error = %e, "Store unreachable; continuing");
            metrics::record_store_health(false);
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address: address.clone(), source })?;

    Ok((HttpServer::new(config, store), listener))
}
