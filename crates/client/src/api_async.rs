//! Typed bindings for the `bub` namespace, suspending mode.
//!
//! Mirrors [`crate::api::Bub`] over the async request manager; suspension
//! happens at provider calls and at receipt-polling waits.

use crate::api::{address_param, hash_param, methods, storage_at_munger};
use crate::error::ClientError;
use crate::formatters;
use crate::manager::AsyncRequestManager;
use crate::method::{
    block_id_munger, block_selector_munger, call_munger, default_root_munger, filter_munger,
};
use alloy_primitives::{hex, Address, B256, U256};
use bubble_common::{BlockId, FilterParams};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Suspending `bub` namespace bound to an async request manager.
pub struct AsyncBub<'a> {
    manager: &'a AsyncRequestManager,
}

impl<'a> AsyncBub<'a> {
    pub(crate) fn new(manager: &'a AsyncRequestManager) -> Self {
        Self { manager }
    }

    /// Current chain head height.
    pub async fn block_number(&self) -> Result<u64, ClientError> {
        let v =
            self.manager.execute(&methods::BLOCK_NUMBER, default_root_munger(vec![])).await?;
        formatters::to_u64(&v)
    }

    /// The chain id.
    pub async fn chain_id(&self) -> Result<u64, ClientError> {
        let v = self.manager.execute(&methods::CHAIN_ID, default_root_munger(vec![])).await?;
        formatters::to_u64(&v)
    }

    /// Current gas price.
    pub async fn gas_price(&self) -> Result<U256, ClientError> {
        let v = self.manager.execute(&methods::GAS_PRICE, default_root_munger(vec![])).await?;
        formatters::to_u256(&v)
    }

    /// Accounts managed by the node.
    pub async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        let v = self.manager.execute(&methods::ACCOUNTS, default_root_munger(vec![])).await?;
        formatters::to_array(v)?.iter().map(formatters::to_address).collect()
    }

    /// Sync status: `false` or a progress object.
    pub async fn syncing(&self) -> Result<Value, ClientError> {
        self.manager.execute(&methods::SYNCING, default_root_munger(vec![])).await
    }

    /// Balance of `address` at `block` (default `latest`).
    pub async fn get_balance(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<U256, ClientError> {
        let call = block_id_munger(address_param(address), block);
        let v = self.manager.execute(&methods::GET_BALANCE, call).await?;
        formatters::to_u256(&v)
    }

    /// Nonce of `address` at `block` (default `latest`).
    pub async fn get_transaction_count(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<u64, ClientError> {
        let call = block_id_munger(address_param(address), block);
        let v = self.manager.execute(&methods::GET_TRANSACTION_COUNT, call).await?;
        formatters::to_u64(&v)
    }

    /// Code deployed at `address`.
    pub async fn get_code(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<Vec<u8>, ClientError> {
        let call = block_id_munger(address_param(address), block);
        let v = self.manager.execute(&methods::GET_CODE, call).await?;
        formatters::to_bytes(&v)
    }

    /// One storage slot of `address`.
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: Option<BlockId>,
    ) -> Result<B256, ClientError> {
        let call = storage_at_munger(address, slot, block);
        let v = self.manager.execute(&methods::GET_STORAGE_AT, call).await?;
        formatters::to_b256(&v)
    }

    /// A block by hash, number or tag; the endpoint is selected from the
    /// identifier's shape.
    pub async fn get_block(
        &self,
        block: impl Into<BlockId>,
        full_transactions: bool,
    ) -> Result<Value, ClientError> {
        let call = block_selector_munger(block.into(), vec![Value::Bool(full_transactions)]);
        self.manager.execute(&methods::GET_BLOCK, call).await
    }

    /// Number of transactions in a block.
    pub async fn get_block_transaction_count(
        &self,
        block: impl Into<BlockId>,
    ) -> Result<u64, ClientError> {
        let call = block_selector_munger(block.into(), vec![]);
        let v = self.manager.execute(&methods::GET_BLOCK_TRANSACTION_COUNT, call).await?;
        formatters::to_u64(&v)
    }

    /// A transaction by hash; unknown hashes are a typed failure.
    pub async fn get_transaction(&self, hash: B256) -> Result<Value, ClientError> {
        self.manager
            .execute(&methods::GET_TRANSACTION, default_root_munger(vec![hash_param(hash)]))
            .await
    }

    /// A transaction receipt by hash; pending transactions are a typed
    /// failure.
    pub async fn get_transaction_receipt(&self, hash: B256) -> Result<Value, ClientError> {
        self.manager
            .execute(
                &methods::GET_TRANSACTION_RECEIPT,
                default_root_munger(vec![hash_param(hash)]),
            )
            .await
    }

    /// Polls for a receipt until `timeout` elapses.
    ///
    /// The wait suspends between polls; cancellation drops the sleep timer
    /// cleanly. Expiry raises [`ClientError::TimeoutExhausted`].
    pub async fn wait_for_transaction_receipt(
        &self,
        hash: B256,
        timeout: Duration,
        poll_latency: Duration,
    ) -> Result<Value, ClientError> {
        let started = Instant::now();
        loop {
            match self.get_transaction_receipt(hash).await {
                Ok(receipt) => return Ok(receipt),
                Err(ClientError::NotFound(_)) => {}
                Err(other) => return Err(other),
            }
            if started.elapsed() >= timeout {
                return Err(ClientError::TimeoutExhausted { waited_secs: timeout.as_secs() });
            }
            tokio::time::sleep(poll_latency).await;
        }
    }

    /// Executes a read-only call; reverts surface as
    /// [`ClientError::ContractLogic`].
    pub async fn call(
        &self,
        transaction: Value,
        block: Option<BlockId>,
    ) -> Result<Value, ClientError> {
        self.manager.execute(&methods::CALL, call_munger(transaction, block)?).await
    }

    /// Estimates the gas a transaction would use.
    pub async fn estimate_gas(
        &self,
        transaction: Value,
        block: Option<BlockId>,
    ) -> Result<u64, ClientError> {
        let v = self
            .manager
            .execute(&methods::ESTIMATE_GAS, call_munger(transaction, block)?)
            .await?;
        formatters::to_u64(&v)
    }

    /// Broadcasts a signed raw transaction, returning its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ClientError> {
        let param = Value::String(format!("0x{}", hex::encode(raw)));
        let v = self
            .manager
            .execute(&methods::SEND_RAW_TRANSACTION, default_root_munger(vec![param]))
            .await?;
        formatters::to_b256(&v)
    }

    /// Logs matching `filter`.
    pub async fn get_logs(&self, filter: &FilterParams) -> Result<Vec<Value>, ClientError> {
        let v = self.manager.execute(&methods::GET_LOGS, filter_munger(filter)?).await?;
        formatters::to_array(v)
    }

    /// Installs a log filter, returning its id.
    pub async fn new_filter(&self, filter: &FilterParams) -> Result<String, ClientError> {
        let v = self.manager.execute(&methods::NEW_FILTER, filter_munger(filter)?).await?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode(format!("filter id is not a string: {v}")))
    }

    /// Installs a block filter, returning its id.
    pub async fn new_block_filter(&self) -> Result<String, ClientError> {
        let v = self
            .manager
            .execute(&methods::NEW_BLOCK_FILTER, default_root_munger(vec![]))
            .await?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode(format!("filter id is not a string: {v}")))
    }

    /// New entries for a filter since the last poll.
    pub async fn get_filter_changes(&self, filter_id: &str) -> Result<Vec<Value>, ClientError> {
        let v = self
            .manager
            .execute(&methods::GET_FILTER_CHANGES, default_root_munger(vec![json!(filter_id)]))
            .await?;
        formatters::to_array(v)
    }

    /// All entries a log filter has matched since creation.
    pub async fn get_filter_logs(&self, filter_id: &str) -> Result<Vec<Value>, ClientError> {
        let v = self
            .manager
            .execute(&methods::GET_FILTER_LOGS, default_root_munger(vec![json!(filter_id)]))
            .await?;
        formatters::to_array(v)
    }

    /// Uninstalls a node-side filter.
    pub async fn uninstall_filter(&self, filter_id: &str) -> Result<bool, ClientError> {
        let v = self
            .manager
            .execute(&methods::UNINSTALL_FILTER, default_root_munger(vec![json!(filter_id)]))
            .await?;
        v.as_bool().ok_or_else(|| ClientError::Decode(format!("expected a boolean: {v}")))
    }
}
