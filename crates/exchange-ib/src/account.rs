//! IB account queries: positions.

use ibapi::accounts::PositionUpdate;
use tracing::{debug, warn};

use crate::client::IBClient;
use crate::convert::{from_ib_contract, to_decimal};
use crate::error::{IbError, Result};
use crate::types::PositionRecord;

impl IBClient {
    /// Snapshot of every position across the connected accounts.
    pub async fn position_snapshot(&self) -> Result<Vec<PositionRecord>> {
        let mut subscription = self.inner().positions().await?;
        let mut positions = Vec::new();

        let drain = async {
            while let Some(update) = subscription.next().await {
                match update? {
                    PositionUpdate::Position(position) => {
                        let contract = match from_ib_contract(&position.contract) {
                            Ok(contract) => contract,
                            Err(e) => {
                                warn!(error = %e, "Skipping position with unsupported contract");
                                continue;
                            }
                        };
                        positions.push(PositionRecord {
                            account: position.account.clone(),
                            contract,
                            position: to_decimal(position.position)?,
                            avg_cost: to_decimal(position.average_cost)?,
                        });
                    }
                    PositionUpdate::PositionEnd => break,
                }
            }
            Ok::<_, IbError>(())
        };

        tokio::time::timeout(self.snapshot_timeout() * 5, drain)
            .await
            .map_err(|_| IbError::Timeout("position snapshot".into()))??;

        debug!(count = positions.len(), "Positions retrieved");
        Ok(positions)
    }
}
