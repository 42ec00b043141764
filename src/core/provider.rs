use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};
use web3::{transports::Http, Transport, Web3};

use crate::core::blocks::{records_from_block, Record};
use crate::utils::error::{BrowserError, ProviderError};

/// Source of block numbers and the transactions they contain.
///
/// Authentication and transport are the implementor's business; callers only
/// see the two lookups and the two failure kinds.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Number of the most recent block.
    async fn current_key(&self) -> Result<u64, ProviderError>;

    /// Transactions of block `key`, in the order the node returns them.
    async fn children_for_key(&self, key: u64) -> Result<Vec<Record>, ProviderError>;
}

#[derive(Clone)]
pub struct Web3Provider {
    web3_client: Web3<Http>,
    endpoint: String,
}

impl Web3Provider {
    pub fn new(endpoint: &str) -> Result<Self, BrowserError> {
        let transport = Http::new(endpoint).map_err(|e| BrowserError::RpcError(e.to_string()))?;

        Ok(Self {
            web3_client: Web3::new(transport),
            endpoint: redact(endpoint),
        })
    }
}

#[async_trait]
impl DataProvider for Web3Provider {
    async fn current_key(&self) -> Result<u64, ProviderError> {
        info!(
            event = "fetching_latest_block",
            message = "Attempting to get latest block number",
            rpc_endpoint = %self.endpoint
        );

        match self.web3_client.eth().block_number().await {
            Ok(block_number) => {
                let number = block_number.as_u64();
                info!(
                    event = "latest_block_fetched",
                    message = "Successfully got latest block number",
                    block_number = number
                );
                Ok(number)
            }
            Err(e) => {
                error!(
                    event = "latest_block_error",
                    message = "Failed to get latest block number",
                    error = %e
                );
                Err(e.into())
            }
        }
    }

    async fn children_for_key(&self, key: u64) -> Result<Vec<Record>, ProviderError> {
        // Raw call so the detail pane sees every field the node sends (chainId included).
        let params = vec![json!(format!("{:#x}", key)), json!(true)];
        let block = self
            .web3_client
            .transport()
            .execute("eth_getBlockByNumber", params)
            .await
            .map_err(|e| {
                error!(
                    event = "block_fetch_error",
                    message = "Failed to fetch block",
                    error = %e,
                    block_number = key
                );
                ProviderError::from(e)
            })?;

        if block.is_null() {
            warn!(
                event = "block_not_found",
                message = "Node has no block with this number",
                block_number = key
            );
            return Err(ProviderError::NotFound { key });
        }

        let records = records_from_block(&block)?;
        info!(
            event = "block_fetched",
            message = "Successfully fetched block",
            block_number = key,
            tx_count = records.len()
        );
        Ok(records)
    }
}

/// Drops the path of hosted-provider URLs, which carries the API key.
fn redact(endpoint: &str) -> String {
    match endpoint.find("/v2/") {
        Some(idx) => format!("{}/v2/***", &endpoint[..idx]),
        None => endpoint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_not_logged() {
        assert_eq!(
            redact("https://eth-mainnet.g.alchemy.com/v2/secret"),
            "https://eth-mainnet.g.alchemy.com/v2/***"
        );
        assert_eq!(redact("http://localhost:8545"), "http://localhost:8545");
    }

    #[test]
    fn invalid_endpoint_is_a_setup_error() {
        assert!(matches!(
            Web3Provider::new("not a url"),
            Err(BrowserError::RpcError(_))
        ));
    }
}
