//! Typed bindings for the `bub` namespace, blocking mode.
//!
//! Each operation is an immutable method descriptor plus a munger; the
//! typed functions here parse raw results into `alloy` primitives and leave
//! composite payloads (blocks, logs, receipts) as JSON values.

use crate::error::ClientError;
use crate::formatters;
use crate::manager::RequestManager;
use crate::method::{
    block_id_munger, block_selector_munger, call_munger, default_root_munger, filter_munger,
    Endpoint, Method, NullBehavior, PreparedCall,
};
use crate::rpc;
use alloy_primitives::{hex, Address, B256, U256};
use bubble_common::{BlockId, FilterParams, RpcError};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

fn revert_error_formatter(err: &RpcError) -> Option<ClientError> {
    err.message
        .contains("revert")
        .then(|| ClientError::ContractLogic(err.message.clone()))
}

/// The descriptor table for the `bub` namespace.
pub(crate) mod methods {
    use super::*;

    pub(crate) static BLOCK_NUMBER: Method = Method::plain(rpc::BUB_BLOCK_NUMBER);
    pub(crate) static CHAIN_ID: Method = Method::plain(rpc::BUB_CHAIN_ID);
    pub(crate) static GAS_PRICE: Method = Method::plain(rpc::BUB_GAS_PRICE);
    pub(crate) static ACCOUNTS: Method = Method::plain(rpc::BUB_ACCOUNTS);
    pub(crate) static SYNCING: Method = Method::plain(rpc::BUB_SYNCING);
    pub(crate) static GET_BALANCE: Method = Method::plain(rpc::BUB_GET_BALANCE);
    pub(crate) static GET_TRANSACTION_COUNT: Method =
        Method::plain(rpc::BUB_GET_TRANSACTION_COUNT);
    pub(crate) static GET_CODE: Method = Method::plain(rpc::BUB_GET_CODE);
    pub(crate) static GET_STORAGE_AT: Method = Method::plain(rpc::BUB_GET_STORAGE_AT);
    pub(crate) static SEND_RAW_TRANSACTION: Method =
        Method::plain(rpc::BUB_SEND_RAW_TRANSACTION);
    pub(crate) static GET_LOGS: Method = Method::plain(rpc::BUB_GET_LOGS);
    pub(crate) static NEW_FILTER: Method = Method::plain(rpc::BUB_NEW_FILTER);
    pub(crate) static NEW_BLOCK_FILTER: Method = Method::plain(rpc::BUB_NEW_BLOCK_FILTER);
    pub(crate) static GET_FILTER_CHANGES: Method = Method::plain(rpc::BUB_GET_FILTER_CHANGES);
    pub(crate) static GET_FILTER_LOGS: Method = Method::plain(rpc::BUB_GET_FILTER_LOGS);
    pub(crate) static UNINSTALL_FILTER: Method = Method::plain(rpc::BUB_UNINSTALL_FILTER);

    pub(crate) static GET_BLOCK: Method = Method {
        endpoint: Endpoint::ByBlockId {
            if_hash: rpc::BUB_GET_BLOCK_BY_HASH,
            if_number: rpc::BUB_GET_BLOCK_BY_NUMBER,
        },
        null_result: NullBehavior::NotFound("block"),
        error_formatter: None,
        result_formatter: None,
    };

    pub(crate) static GET_BLOCK_TRANSACTION_COUNT: Method = Method {
        endpoint: Endpoint::ByBlockId {
            if_hash: rpc::BUB_GET_BLOCK_TRANSACTION_COUNT_BY_HASH,
            if_number: rpc::BUB_GET_BLOCK_TRANSACTION_COUNT_BY_NUMBER,
        },
        null_result: NullBehavior::Allow,
        error_formatter: None,
        result_formatter: None,
    };

    pub(crate) static GET_TRANSACTION: Method = Method {
        endpoint: Endpoint::Static(rpc::BUB_GET_TRANSACTION_BY_HASH),
        null_result: NullBehavior::NotFound("transaction"),
        error_formatter: None,
        result_formatter: None,
    };

    pub(crate) static GET_TRANSACTION_RECEIPT: Method = Method {
        endpoint: Endpoint::Static(rpc::BUB_GET_TRANSACTION_RECEIPT),
        null_result: NullBehavior::NotFound("transaction receipt"),
        error_formatter: None,
        result_formatter: None,
    };

    pub(crate) static CALL: Method = Method {
        endpoint: Endpoint::Static(rpc::BUB_CALL),
        null_result: NullBehavior::Allow,
        error_formatter: Some(revert_error_formatter),
        result_formatter: None,
    };

    pub(crate) static ESTIMATE_GAS: Method = Method {
        endpoint: Endpoint::Static(rpc::BUB_ESTIMATE_GAS),
        null_result: NullBehavior::Allow,
        error_formatter: Some(revert_error_formatter),
        result_formatter: None,
    };
}

pub(crate) fn address_param(address: Address) -> Value {
    Value::String(format!("{address}"))
}

pub(crate) fn hash_param(hash: B256) -> Value {
    Value::String(format!("{hash}"))
}

pub(crate) fn storage_at_munger(
    address: Address,
    slot: U256,
    block: Option<BlockId>,
) -> PreparedCall {
    let block = block.unwrap_or(BlockId::Tag(bubble_common::BlockTag::Latest));
    PreparedCall {
        block_id: Some(block),
        params: vec![address_param(address), json!(format!("0x{slot:x}")), block.to_param()],
    }
}

/// Blocking `bub` namespace bound to a request manager.
pub struct Bub<'a> {
    manager: &'a RequestManager,
}

impl<'a> Bub<'a> {
    pub(crate) fn new(manager: &'a RequestManager) -> Self {
        Self { manager }
    }

    /// Current chain head height.
    pub fn block_number(&self) -> Result<u64, ClientError> {
        let v = self.manager.execute(&methods::BLOCK_NUMBER, default_root_munger(vec![]))?;
        formatters::to_u64(&v)
    }

    /// The chain id.
    pub fn chain_id(&self) -> Result<u64, ClientError> {
        let v = self.manager.execute(&methods::CHAIN_ID, default_root_munger(vec![]))?;
        formatters::to_u64(&v)
    }

    /// Current gas price.
    pub fn gas_price(&self) -> Result<U256, ClientError> {
        let v = self.manager.execute(&methods::GAS_PRICE, default_root_munger(vec![]))?;
        formatters::to_u256(&v)
    }

    /// Accounts managed by the node.
    pub fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        let v = self.manager.execute(&methods::ACCOUNTS, default_root_munger(vec![]))?;
        formatters::to_array(v)?.iter().map(formatters::to_address).collect()
    }

    /// Sync status: `false` or a progress object.
    pub fn syncing(&self) -> Result<Value, ClientError> {
        self.manager.execute(&methods::SYNCING, default_root_munger(vec![]))
    }

    /// Balance of `address` at `block` (default `latest`).
    pub fn get_balance(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<U256, ClientError> {
        let call = block_id_munger(address_param(address), block);
        let v = self.manager.execute(&methods::GET_BALANCE, call)?;
        formatters::to_u256(&v)
    }

    /// Nonce of `address` at `block` (default `latest`).
    pub fn get_transaction_count(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<u64, ClientError> {
        let call = block_id_munger(address_param(address), block);
        let v = self.manager.execute(&methods::GET_TRANSACTION_COUNT, call)?;
        formatters::to_u64(&v)
    }

    /// Code deployed at `address`.
    pub fn get_code(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<Vec<u8>, ClientError> {
        let call = block_id_munger(address_param(address), block);
        let v = self.manager.execute(&methods::GET_CODE, call)?;
        formatters::to_bytes(&v)
    }

    /// One storage slot of `address`.
    pub fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: Option<BlockId>,
    ) -> Result<B256, ClientError> {
        let call = storage_at_munger(address, slot, block);
        let v = self.manager.execute(&methods::GET_STORAGE_AT, call)?;
        formatters::to_b256(&v)
    }

    /// A block by hash, number or tag; the endpoint is selected from the
    /// identifier's shape.
    pub fn get_block(
        &self,
        block: impl Into<BlockId>,
        full_transactions: bool,
    ) -> Result<Value, ClientError> {
        let call = block_selector_munger(block.into(), vec![Value::Bool(full_transactions)]);
        self.manager.execute(&methods::GET_BLOCK, call)
    }

    /// Number of transactions in a block.
    pub fn get_block_transaction_count(
        &self,
        block: impl Into<BlockId>,
    ) -> Result<u64, ClientError> {
        let call = block_selector_munger(block.into(), vec![]);
        let v = self.manager.execute(&methods::GET_BLOCK_TRANSACTION_COUNT, call)?;
        formatters::to_u64(&v)
    }

    /// A transaction by hash; unknown hashes are a typed failure.
    pub fn get_transaction(&self, hash: B256) -> Result<Value, ClientError> {
        self.manager
            .execute(&methods::GET_TRANSACTION, default_root_munger(vec![hash_param(hash)]))
    }

    /// A transaction receipt by hash; pending transactions are a typed
    /// failure.
    pub fn get_transaction_receipt(&self, hash: B256) -> Result<Value, ClientError> {
        self.manager.execute(
            &methods::GET_TRANSACTION_RECEIPT,
            default_root_munger(vec![hash_param(hash)]),
        )
    }

    /// Polls for a receipt until `timeout` elapses.
    ///
    /// Expiry raises [`ClientError::TimeoutExhausted`] so callers can tell a
    /// still-pending transaction from a broken transport.
    pub fn wait_for_transaction_receipt(
        &self,
        hash: B256,
        timeout: Duration,
        poll_latency: Duration,
    ) -> Result<Value, ClientError> {
        let started = Instant::now();
        loop {
            match self.get_transaction_receipt(hash) {
                Ok(receipt) => return Ok(receipt),
                Err(ClientError::NotFound(_)) => {}
                Err(other) => return Err(other),
            }
            if started.elapsed() >= timeout {
                return Err(ClientError::TimeoutExhausted { waited_secs: timeout.as_secs() });
            }
            std::thread::sleep(poll_latency);
        }
    }

    /// Executes a read-only call; reverts surface as
    /// [`ClientError::ContractLogic`].
    pub fn call(&self, transaction: Value, block: Option<BlockId>) -> Result<Value, ClientError> {
        self.manager.execute(&methods::CALL, call_munger(transaction, block)?)
    }

    /// Estimates the gas a transaction would use.
    pub fn estimate_gas(
        &self,
        transaction: Value,
        block: Option<BlockId>,
    ) -> Result<u64, ClientError> {
        let v = self.manager.execute(&methods::ESTIMATE_GAS, call_munger(transaction, block)?)?;
        formatters::to_u64(&v)
    }

    /// Broadcasts a signed raw transaction, returning its hash.
    pub fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ClientError> {
        let param = Value::String(format!("0x{}", hex::encode(raw)));
        let v = self
            .manager
            .execute(&methods::SEND_RAW_TRANSACTION, default_root_munger(vec![param]))?;
        formatters::to_b256(&v)
    }

    /// Logs matching `filter`.
    pub fn get_logs(&self, filter: &FilterParams) -> Result<Vec<Value>, ClientError> {
        let v = self.manager.execute(&methods::GET_LOGS, filter_munger(filter)?)?;
        formatters::to_array(v)
    }

    /// Installs a log filter, returning its id.
    pub fn new_filter(&self, filter: &FilterParams) -> Result<String, ClientError> {
        let v = self.manager.execute(&methods::NEW_FILTER, filter_munger(filter)?)?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode(format!("filter id is not a string: {v}")))
    }

    /// Installs a block filter, returning its id.
    pub fn new_block_filter(&self) -> Result<String, ClientError> {
        let v = self.manager.execute(&methods::NEW_BLOCK_FILTER, default_root_munger(vec![]))?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode(format!("filter id is not a string: {v}")))
    }

    /// New entries for a filter since the last poll.
    pub fn get_filter_changes(&self, filter_id: &str) -> Result<Vec<Value>, ClientError> {
        let v = self.manager.execute(
            &methods::GET_FILTER_CHANGES,
            default_root_munger(vec![json!(filter_id)]),
        )?;
        formatters::to_array(v)
    }

    /// All entries a log filter has matched since creation.
    pub fn get_filter_logs(&self, filter_id: &str) -> Result<Vec<Value>, ClientError> {
        let v = self
            .manager
            .execute(&methods::GET_FILTER_LOGS, default_root_munger(vec![json!(filter_id)]))?;
        formatters::to_array(v)
    }

    /// Uninstalls a node-side filter. Local filters have no uninstall;
    /// dropping their id is the caller's bookkeeping.
    pub fn uninstall_filter(&self, filter_id: &str) -> Result<bool, ClientError> {
        let v = self.manager.execute(
            &methods::UNINSTALL_FILTER,
            default_root_munger(vec![json!(filter_id)]),
        )?;
        v.as_bool().ok_or_else(|| ClientError::Decode(format!("expected a boolean: {v}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::provider::MockProvider;
    use alloy_primitives::{address, b256};
    use std::sync::Arc;

    fn client(provider: MockProvider) -> (Client, Arc<MockProvider>) {
        let shared = Arc::new(provider);
        let boxed = SharedMock(shared.clone());
        (Client::with_onion(Box::new(boxed), crate::middleware::Onion::new()), shared)
    }

    struct SharedMock(Arc<MockProvider>);
    impl crate::provider::Provider for SharedMock {
        fn request(
            &self,
            method: &str,
            params: Value,
        ) -> Result<bubble_common::RpcResponse, ClientError> {
            crate::provider::Provider::request(&*self.0, method, params)
        }
    }

    const ADDR: Address = address!("00000000000000000000000000000000000000aa");

    #[test]
    fn get_balance_injects_the_default_block_tag() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GET_BALANCE, json!("0xde0b6b3a7640000"));
        let (client, shared) = client(provider);

        let balance = client.bub().get_balance(ADDR, None).unwrap();
        assert_eq!(balance, U256::from(10u64.pow(18)));

        let requests = shared.requests_for(rpc::BUB_GET_BALANCE);
        assert_eq!(requests[0][1], json!("latest"));
    }

    #[test]
    fn get_block_selects_the_endpoint_from_the_identifier() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GET_BLOCK_BY_NUMBER, json!({ "number": "0x10" }));
        provider.set_result(rpc::BUB_GET_BLOCK_BY_HASH, json!({ "number": "0x11" }));
        let (client, shared) = client(provider);

        client.bub().get_block(16u64, false).unwrap();
        let hash = b256!("2222222222222222222222222222222222222222222222222222222222222222");
        client.bub().get_block(hash, true).unwrap();

        assert_eq!(shared.requests_for(rpc::BUB_GET_BLOCK_BY_NUMBER).len(), 1);
        let by_hash = shared.requests_for(rpc::BUB_GET_BLOCK_BY_HASH);
        assert_eq!(by_hash.len(), 1);
        assert_eq!(by_hash[0][1], json!(true));
    }

    #[test]
    fn missing_blocks_are_typed_not_found_errors() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GET_BLOCK_BY_NUMBER, Value::Null);
        let (client, _) = client(provider);
        let err = client.bub().get_block(99u64, false).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn revert_surfaces_as_contract_logic() {
        let provider = MockProvider::new();
        provider.push_outcome(
            rpc::BUB_CALL,
            crate::provider::MockOutcome::RpcError(RpcError {
                code: 3,
                message: "execution reverted: bad input".into(),
                data: None,
            }),
        );
        let (client, _) = client(provider);
        let err = client.bub().call(json!({ "to": "0xabc" }), None).unwrap_err();
        assert!(matches!(err, ClientError::ContractLogic(_)));
    }

    #[test]
    fn wait_for_receipt_times_out_with_a_distinct_error() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GET_TRANSACTION_RECEIPT, Value::Null);
        let (client, _) = client(provider);

        let hash = b256!("3333333333333333333333333333333333333333333333333333333333333333");
        let err = client
            .bub()
            .wait_for_transaction_receipt(hash, Duration::ZERO, Duration::from_millis(1))
            .unwrap_err();
        assert!(matches!(err, ClientError::TimeoutExhausted { .. }));
    }

    #[test]
    fn wait_for_receipt_returns_once_mined() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_GET_TRANSACTION_RECEIPT, Value::Null);
        provider.push_result(rpc::BUB_GET_TRANSACTION_RECEIPT, json!({ "status": "0x1" }));
        let (client, _) = client(provider);

        let hash = b256!("3333333333333333333333333333333333333333333333333333333333333333");
        let receipt = client
            .bub()
            .wait_for_transaction_receipt(hash, Duration::from_secs(5), Duration::from_millis(1))
            .unwrap();
        assert_eq!(receipt["status"], json!("0x1"));
    }
}
