//! Retry middleware for transient transport failures.
//!
//! Only methods on a fixed allow-list are retried: read-only or otherwise
//! idempotent endpoints where a duplicate send cannot change chain state.
//! Methods match either by exact name or by the namespace prefix before the
//! first underscore. Anything else fails fast on the first transport error.

use super::{AsyncMiddleware, AsyncNext, Middleware, Next};
use crate::error::ClientError;
use bubble_common::RpcResponse;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

/// Default number of attempts per allow-listed request.
pub const DEFAULT_RETRIES: usize = 5;

/// Methods and namespaces that are safe to retry after a transient transport
/// failure.
///
/// Entries without an underscore are whole namespaces.
pub const RETRY_ALLOW_LIST: &[&str] = &[
    "admin",
    "miner",
    "net",
    "txpool",
    "testing",
    "evm",
    "bub_protocolVersion",
    "bub_syncing",
    "bub_coinbase",
    "bub_mining",
    "bub_hashrate",
    "bub_chainId",
    "bub_gasPrice",
    "bub_accounts",
    "bub_blockNumber",
    "bub_getBalance",
    "bub_getStorageAt",
    "bub_getProof",
    "bub_getCode",
    "bub_getBlockByNumber",
    "bub_getBlockByHash",
    "bub_getBlockTransactionCountByNumber",
    "bub_getBlockTransactionCountByHash",
    "bub_getUncleCountByBlockNumber",
    "bub_getUncleCountByBlockHash",
    "bub_getTransactionByHash",
    "bub_getTransactionByBlockHashAndIndex",
    "bub_getTransactionByBlockNumberAndIndex",
    "bub_getTransactionReceipt",
    "bub_getTransactionCount",
    "bub_getRawTransactionByHash",
    "bub_call",
    "bub_estimateGas",
    "bub_newBlockFilter",
    "bub_newPendingTransactionFilter",
    "bub_newFilter",
    "bub_getFilterChanges",
    "bub_getFilterLogs",
    "bub_getLogs",
    "bub_uninstallFilter",
    "bub_getCompilers",
    "bub_getWork",
    "bub_sign",
    "bub_signTypedData",
    "bub_sendRawTransaction",
    "personal_importRawKey",
    "personal_newAccount",
    "personal_listAccounts",
    "personal_listWallets",
    "personal_lockAccount",
    "personal_unlockAccount",
    "personal_ecRecover",
    "personal_sign",
    "personal_signTypedData",
];

/// Whether a transient failure of `method` may be retried.
pub fn check_if_retry_on_failure(method: &str) -> bool {
    let namespace = method.split('_').next().unwrap_or(method);
    RETRY_ALLOW_LIST.contains(&namespace) || RETRY_ALLOW_LIST.contains(&method)
}

/// Middleware retrying allow-listed requests on transient transport errors.
///
/// No backoff between attempts; the last error is re-raised on exhaustion.
/// RPC-level error envelopes are responses, not transport failures, and are
/// never retried.
pub struct RetryMiddleware {
    retries: usize,
}

impl RetryMiddleware {
    /// Creates the middleware with an explicit attempt bound.
    pub fn new(retries: usize) -> Self {
        Self { retries: retries.max(1) }
    }
}

impl Default for RetryMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

impl Middleware for RetryMiddleware {
    fn handle(
        &self,
        method: &str,
        params: Value,
        next: Next<'_>,
    ) -> Result<RpcResponse, ClientError> {
        if !check_if_retry_on_failure(method) {
            return next.run(method, params);
        }
        let mut attempt = 0;
        loop {
            match next.run(method, params.clone()) {
                Err(err) if err.is_transient() && attempt + 1 < self.retries => {
                    attempt += 1;
                    warn!("Transient failure for {} (attempt {}/{}): {}", method, attempt, self.retries, err);
                }
                other => return other,
            }
        }
    }
}

impl AsyncMiddleware for RetryMiddleware {
    fn handle<'a>(
        &'a self,
        method: &'a str,
        params: Value,
        next: AsyncNext<'a>,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        Box::pin(async move {
            if !check_if_retry_on_failure(method) {
                return next.run(method, params).await;
            }
            let mut attempt = 0;
            loop {
                match next.run(method, params.clone()).await {
                    Err(err) if err.is_transient() && attempt + 1 < self.retries => {
                        attempt += 1;
                        warn!(
                            "Transient failure for {} (attempt {}/{}): {}",
                            method, attempt, self.retries, err
                        );
                    }
                    other => return other,
                }
            }
        })
    }
}
