//! IB Gateway/TWS client connection management.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{IbError, Result};

pub use spread_trader_core::IbConfig;

/// Wrapper around ibapi::Client with connection retry and convenience methods.
pub struct IBClient {
    config: IbConfig,
    client: ibapi::Client,
}

impl IBClient {
    /// Connect to IB Gateway/TWS, retrying a bounded number of times.
    ///
    /// # Errors
    ///
    /// Returns `IbError::Connection` once `connect_attempts` are exhausted.
    pub async fn connect(config: IbConfig) -> Result<Self> {
        let url = config.connection_url();
        let attempts = config.connect_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            info!(url = %url, client_id = config.client_id, attempt, "Connecting to IB Gateway");

            match ibapi::Client::connect(&url, config.client_id).await {
                Ok(client) => {
                    info!(readonly = config.readonly, "Connected to IB Gateway");
                    return Ok(Self { config, client });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Failed to connect to IB Gateway");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_secs(config.connect_retry_secs)).await;
                    }
                }
            }
        }

        Err(IbError::Connection {
            attempts,
            message: last_error,
        })
    }

    /// Get a reference to the underlying ibapi client.
    pub fn inner(&self) -> &ibapi::Client {
        &self.client
    }

    /// Check if the connection is alive.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Get the configuration.
    pub fn config(&self) -> &IbConfig {
        &self.config
    }

    pub(crate) fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.config.snapshot_timeout_ms)
    }

    pub(crate) fn ensure_writable(&self, what: &str) -> Result<()> {
        if self.config.readonly {
            return Err(IbError::ReadOnly(what.to_string()));
        }
        Ok(())
    }
}
