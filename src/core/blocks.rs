use serde::Deserialize;
use serde_json::Value;
use web3::types::{Address, H256, U256, U64};

use crate::utils::error::ProviderError;

/// A transaction of the browsed block.
///
/// The grid columns are decoded into typed fields; the node's full JSON object
/// is kept untouched for the detail pane.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub hash: H256,
    pub block_number: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: U256,
    pub chain_id: Option<u64>,
    raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnFields {
    hash: H256,
    #[serde(default)]
    block_number: Option<U64>,
    from: Address,
    #[serde(default)]
    to: Option<Address>,
    nonce: U256,
    // Legacy (pre EIP-155) transactions carry no chainId.
    #[serde(default)]
    chain_id: Option<U64>,
}

impl Record {
    pub fn from_json(raw: Value) -> Result<Self, ProviderError> {
        let fields: ColumnFields = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Network(format!("malformed transaction: {e}")))?;

        Ok(Self {
            hash: fields.hash,
            block_number: fields.block_number.map(|n| n.as_u64()),
            from: fields.from,
            to: fields.to,
            nonce: fields.nonce,
            chain_id: fields.chain_id.map(|n| n.as_u64()),
            raw,
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Decodes the `transactions` array of an `eth_getBlockByNumber(_, true)` result.
pub fn records_from_block(block: &Value) -> Result<Vec<Record>, ProviderError> {
    let transactions = block
        .get("transactions")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Network("block without transactions array".into()))?;

    transactions.iter().cloned().map(Record::from_json).collect()
}
