//! Contract details and option chain queries.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::broker::ContractResolver;
use crate::client::IBClient;
use crate::convert::{from_ib_contract, to_decimal, to_ib_contract};
use crate::error::Result;
use crate::types::{ContractSpec, OptionChainParams, QualifiedContract};

#[async_trait]
impl ContractResolver for IBClient {
    async fn contract_details(&self, spec: &ContractSpec) -> Result<Vec<QualifiedContract>> {
        debug!(contract = %spec.display_name(), "Requesting contract details");

        let details = self
            .inner()
            .contract_details(&to_ib_contract(spec, 0))
            .await?;

        let mut contracts = Vec::with_capacity(details.len());
        for detail in &details {
            match from_ib_contract(&detail.contract) {
                Ok(contract) => contracts.push(contract),
                Err(e) => warn!(error = %e, "Skipping contract with unsupported fields"),
            }
        }

        debug!(contract = %spec.display_name(), count = contracts.len(), "Contract details received");
        Ok(contracts)
    }

    async fn option_chain(
        &self,
        underlying: &QualifiedContract,
        exchange: &str,
    ) -> Result<Vec<OptionChainParams>> {
        debug!(underlying = %underlying.display_name(), exchange, "Requesting option chain");

        let ib_contract = to_ib_contract(&underlying.spec, underlying.con_id);
        let mut subscription = self
            .inner()
            .option_chain(
                &underlying.spec.symbol,
                exchange,
                ib_contract.security_type.clone(),
                underlying.con_id,
            )
            .await?;

        let mut chains = Vec::new();
        while let Some(item) = subscription.next().await {
            let chain = item?;
            let mut strikes = Vec::with_capacity(chain.strikes.len());
            for strike in &chain.strikes {
                strikes.push(to_decimal(*strike)?);
            }
            chains.push(OptionChainParams {
                exchange: chain.exchange.clone(),
                trading_class: chain.trading_class.clone(),
                multiplier: chain.multiplier.clone(),
                underlying_con_id: chain.underlying_contract_id,
                expirations: chain.expirations.clone(),
                strikes,
            });
        }

        Ok(chains)
    }
}
