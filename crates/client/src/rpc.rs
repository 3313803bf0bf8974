//! Endpoint names of the bubble JSON-RPC surface.
//!
//! Method names follow the `<namespace>_<action>` convention; the retry
//! allow-list matches on the namespace prefix before the first underscore as
//! well as on selected full names.

/// `bub_accounts`
pub const BUB_ACCOUNTS: &str = "bub_accounts";
/// `bub_blockNumber`
pub const BUB_BLOCK_NUMBER: &str = "bub_blockNumber";
/// `bub_call`
pub const BUB_CALL: &str = "bub_call";
/// `bub_chainId`
pub const BUB_CHAIN_ID: &str = "bub_chainId";
/// `bub_estimateGas`
pub const BUB_ESTIMATE_GAS: &str = "bub_estimateGas";
/// `bub_gasPrice`
pub const BUB_GAS_PRICE: &str = "bub_gasPrice";
/// `bub_getBalance`
pub const BUB_GET_BALANCE: &str = "bub_getBalance";
/// `bub_getBlockByHash`
pub const BUB_GET_BLOCK_BY_HASH: &str = "bub_getBlockByHash";
/// `bub_getBlockByNumber`
pub const BUB_GET_BLOCK_BY_NUMBER: &str = "bub_getBlockByNumber";
/// `bub_getBlockTransactionCountByHash`
pub const BUB_GET_BLOCK_TRANSACTION_COUNT_BY_HASH: &str = "bub_getBlockTransactionCountByHash";
/// `bub_getBlockTransactionCountByNumber`
pub const BUB_GET_BLOCK_TRANSACTION_COUNT_BY_NUMBER: &str = "bub_getBlockTransactionCountByNumber";
/// `bub_getCode`
pub const BUB_GET_CODE: &str = "bub_getCode";
/// `bub_getFilterChanges`
pub const BUB_GET_FILTER_CHANGES: &str = "bub_getFilterChanges";
/// `bub_getFilterLogs`
pub const BUB_GET_FILTER_LOGS: &str = "bub_getFilterLogs";
/// `bub_getLogs`
pub const BUB_GET_LOGS: &str = "bub_getLogs";
/// `bub_getStorageAt`
pub const BUB_GET_STORAGE_AT: &str = "bub_getStorageAt";
/// `bub_getTransactionByHash`
pub const BUB_GET_TRANSACTION_BY_HASH: &str = "bub_getTransactionByHash";
/// `bub_getTransactionCount`
pub const BUB_GET_TRANSACTION_COUNT: &str = "bub_getTransactionCount";
/// `bub_getTransactionReceipt`
pub const BUB_GET_TRANSACTION_RECEIPT: &str = "bub_getTransactionReceipt";
/// `bub_newBlockFilter`
pub const BUB_NEW_BLOCK_FILTER: &str = "bub_newBlockFilter";
/// `bub_newFilter`
pub const BUB_NEW_FILTER: &str = "bub_newFilter";
/// `bub_sendRawTransaction`
pub const BUB_SEND_RAW_TRANSACTION: &str = "bub_sendRawTransaction";
/// `bub_syncing`
pub const BUB_SYNCING: &str = "bub_syncing";
/// `bub_uninstallFilter`
pub const BUB_UNINSTALL_FILTER: &str = "bub_uninstallFilter";
