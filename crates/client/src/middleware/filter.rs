//! Local emulation of node-side log and block filters.
//!
//! Filter creation and polling endpoints are intercepted and served from
//! in-memory state: each filter keeps a block-range cursor and polls the node
//! for whatever appeared since the last poll, chunking large ranges into
//! bounded `bub_getLogs` windows. Filter IDs the emulator does not know fall
//! through to the provider, so node-side filters keep working next to
//! emulated ones.

use super::{AsyncMiddleware, AsyncNext, Middleware, Next};
use crate::error::ClientError;
use crate::rpc;
use bubble_common::{env, quantity_to_u64, u64_to_quantity, FilterParams, RpcResponse};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Splits `[start, stop]` (inclusive bounds) into consecutive inclusive
/// sub-ranges of at most `step` blocks.
///
/// Ranges do not overlap and leave no gap; the final range absorbs the
/// remainder. `start > stop` and a zero step are rejected.
pub fn block_ranges(start: u64, stop: u64, step: u64) -> Result<Vec<(u64, u64)>, ClientError> {
    if start > stop {
        return Err(ClientError::Validation(
            "incompatible range: start must be less than or equal to stop".into(),
        ));
    }
    if step == 0 {
        return Err(ClientError::Validation("range step must be positive".into()));
    }
    let mut ranges = Vec::new();
    let mut from = start;
    loop {
        let to = from.saturating_add(step - 1).min(stop);
        ranges.push((from, to));
        if to == stop {
            return Ok(ranges);
        }
        from = to + 1;
    }
}

/// Upper bound of a log filter's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToBlock {
    /// Re-resolved to the chain head on every poll.
    Latest,
    /// Fixed; the filter goes quiet once the head passes it.
    Number(u64),
}

#[derive(Debug)]
struct LogFilterState {
    /// First block of interest, fixed at creation.
    origin: u64,
    /// Next block a poll will deliver from.
    cursor: u64,
    to_block: ToBlock,
    address: Option<Value>,
    topics: Option<Value>,
    last_head: Option<u64>,
}

impl LogFilterState {
    /// The window a poll at `head` should fetch, advancing the cursor.
    ///
    /// `None` means the poll delivers nothing: unchanged head, nothing new
    /// yet, or a bounded filter whose range the chain has moved past.
    fn poll_window(&mut self, head: u64) -> Option<(u64, u64)> {
        if let ToBlock::Number(to) = self.to_block {
            if head > to {
                self.last_head = Some(head);
                return None;
            }
        }
        if self.last_head == Some(head) {
            return None;
        }
        self.last_head = Some(head);
        if self.cursor > head {
            return None;
        }
        let window = (self.cursor, head);
        self.cursor = head + 1;
        Some(window)
    }

    /// The full window since creation, independent of the poll cursor.
    fn full_window(&self, head: u64) -> Option<(u64, u64)> {
        let to = match self.to_block {
            ToBlock::Latest => head,
            ToBlock::Number(n) => n,
        };
        (self.origin <= to).then_some((self.origin, to))
    }
}

#[derive(Debug)]
struct BlockFilterState {
    cursor: u64,
    last_head: Option<u64>,
}

impl BlockFilterState {
    fn poll_window(&mut self, head: u64) -> Option<(u64, u64)> {
        if self.last_head == Some(head) {
            return None;
        }
        self.last_head = Some(head);
        if self.cursor > head {
            return None;
        }
        let window = (self.cursor, head);
        self.cursor = head + 1;
        Some(window)
    }
}

#[derive(Debug)]
enum LocalFilter {
    Logs(LogFilterState),
    Blocks(BlockFilterState),
}

/// Lower bound of a new log filter before head resolution.
enum FromSpec {
    Latest,
    Number(u64),
}

struct NewFilterSpec {
    from: FromSpec,
    to: ToBlock,
    address: Option<Value>,
    topics: Option<Value>,
}

fn parse_bound(field: Option<&Value>, name: &str) -> Result<Option<u64>, ClientError> {
    match field {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == "latest" => Ok(None),
        Some(v) => quantity_to_u64(v).map(Some).ok_or_else(|| {
            ClientError::Validation(format!("unsupported {name} in filter params: {v}"))
        }),
    }
}

fn parse_new_filter(params: &Value) -> Result<NewFilterSpec, ClientError> {
    let spec = match params.get(0) {
        None | Some(Value::Null) => &Value::Null,
        Some(v) if v.is_object() => v,
        Some(v) => {
            return Err(ClientError::Validation(format!("filter params must be an object: {v}")))
        }
    };
    let from = parse_bound(spec.get("fromBlock"), "fromBlock")?;
    let to = parse_bound(spec.get("toBlock"), "toBlock")?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ClientError::Validation(format!(
                "filter fromBlock {from} is greater than toBlock {to}"
            )));
        }
    }
    Ok(NewFilterSpec {
        from: from.map_or(FromSpec::Latest, FromSpec::Number),
        to: to.map_or(ToBlock::Latest, ToBlock::Number),
        address: spec.get("address").cloned(),
        topics: spec.get("topics").cloned(),
    })
}

fn response_value(response: RpcResponse, what: &str) -> Result<Value, ClientError> {
    if let Some(err) = response.error {
        return Err(ClientError::from_rpc(&err));
    }
    response.result.ok_or_else(|| ClientError::Decode(format!("missing result for {what}")))
}

fn head_from_response(response: RpcResponse) -> Result<u64, ClientError> {
    let value = response_value(response, rpc::BUB_BLOCK_NUMBER)?;
    quantity_to_u64(&value)
        .ok_or_else(|| ClientError::Decode(format!("bad block number quantity: {value}")))
}

fn logs_params(window: (u64, u64), address: &Option<Value>, topics: &Option<Value>) -> Value {
    let params = FilterParams {
        from_block: Some(u64_to_quantity(window.0)),
        to_block: Some(u64_to_quantity(window.1)),
        address: address.clone(),
        topics: topics.clone(),
    };
    json!([params])
}

fn logs_from_response(response: RpcResponse) -> Result<Vec<Value>, ClientError> {
    match response_value(response, rpc::BUB_GET_LOGS)? {
        Value::Array(items) => Ok(items),
        other => Err(ClientError::Decode(format!("bub_getLogs returned a non-array: {other}"))),
    }
}

/// Hash of a fetched block, or a null placeholder when the block or its hash
/// is not retrievable.
fn hash_from_response(response: RpcResponse) -> Value {
    match response.result {
        Some(Value::Object(mut fields)) => fields.remove("hash").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// What a poll has to fetch, decided under the state lock.
enum PollPlan {
    Empty,
    Logs { window: (u64, u64), address: Option<Value>, topics: Option<Value> },
    Blocks { window: (u64, u64) },
}

/// Middleware serving filter endpoints from local, polled state.
pub struct LocalFilterMiddleware {
    filters: Mutex<HashMap<String, LocalFilter>>,
    next_id: AtomicU64,
    max_blocks: u64,
}

impl LocalFilterMiddleware {
    /// Creates the middleware with the process-wide chunk width.
    pub fn new() -> Self {
        Self::with_max_blocks(env::max_block_request())
    }

    /// Creates the middleware with an explicit chunk width.
    pub fn with_max_blocks(max_blocks: u64) -> Self {
        Self {
            filters: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            max_blocks: max_blocks.max(1),
        }
    }

    fn insert(&self, filter: LocalFilter) -> String {
        let id = format!("0x{:x}", self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!("Created local filter {}: {:?}", id, filter);
        self.filters.lock().insert(id.clone(), filter);
        id
    }

    fn knows(&self, id: &str) -> bool {
        self.filters.lock().contains_key(id)
    }

    /// Computes the poll plan for `id` at `head`, advancing the cursor.
    fn plan_poll(&self, id: &str, head: u64) -> PollPlan {
        let mut filters = self.filters.lock();
        match filters.get_mut(id) {
            Some(LocalFilter::Logs(state)) => match state.poll_window(head) {
                Some(window) => PollPlan::Logs {
                    window,
                    address: state.address.clone(),
                    topics: state.topics.clone(),
                },
                None => PollPlan::Empty,
            },
            Some(LocalFilter::Blocks(state)) => match state.poll_window(head) {
                Some(window) => PollPlan::Blocks { window },
                None => PollPlan::Empty,
            },
            None => PollPlan::Empty,
        }
    }

    /// Snapshot of a log filter's full range for `bub_getFilterLogs`.
    fn plan_all(&self, id: &str, head: Option<u64>) -> Result<PollPlan, ClientError> {
        let filters = self.filters.lock();
        match filters.get(id) {
            Some(LocalFilter::Logs(state)) => {
                let head = match state.to_block {
                    ToBlock::Latest => head.expect("head resolved for unbounded filter"),
                    ToBlock::Number(n) => n,
                };
                Ok(match state.full_window(head) {
                    Some(window) => PollPlan::Logs {
                        window,
                        address: state.address.clone(),
                        topics: state.topics.clone(),
                    },
                    None => PollPlan::Empty,
                })
            }
            Some(LocalFilter::Blocks(_)) => Err(ClientError::Validation(
                "block filters do not support bub_getFilterLogs".into(),
            )),
            None => Ok(PollPlan::Empty),
        }
    }

    /// Whether resolving this filter's full range needs the current head.
    fn all_needs_head(&self, id: &str) -> bool {
        matches!(
            self.filters.lock().get(id),
            Some(LocalFilter::Logs(LogFilterState { to_block: ToBlock::Latest, .. }))
        )
    }
}

impl Default for LocalFilterMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LocalFilterMiddleware {
    fn handle(
        &self,
        method: &str,
        params: Value,
        next: Next<'_>,
    ) -> Result<RpcResponse, ClientError> {
        match method {
            rpc::BUB_NEW_FILTER => {
                let spec = parse_new_filter(&params)?;
                let origin = match spec.from {
                    FromSpec::Number(n) => n,
                    FromSpec::Latest => {
                        head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([]))?)? + 1
                    }
                };
                let id = self.insert(LocalFilter::Logs(LogFilterState {
                    origin,
                    cursor: origin,
                    to_block: spec.to,
                    address: spec.address,
                    topics: spec.topics,
                    last_head: None,
                }));
                Ok(RpcResponse::from_result(Value::String(id)))
            }
            rpc::BUB_NEW_BLOCK_FILTER => {
                let head = head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([]))?)?;
                let id = self.insert(LocalFilter::Blocks(BlockFilterState {
                    cursor: head + 1,
                    last_head: None,
                }));
                Ok(RpcResponse::from_result(Value::String(id)))
            }
            rpc::BUB_GET_FILTER_CHANGES => {
                let id = match params.get(0).and_then(Value::as_str) {
                    Some(id) if self.knows(id) => id.to_string(),
                    // Not one of ours: let the node answer.
                    _ => return next.run(method, params),
                };
                let head = head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([]))?)?;
                match self.plan_poll(&id, head) {
                    PollPlan::Empty => Ok(RpcResponse::from_result(json!([]))),
                    PollPlan::Logs { window, address, topics } => {
                        let mut all = Vec::new();
                        for range in block_ranges(window.0, window.1, self.max_blocks)? {
                            let response =
                                next.run(rpc::BUB_GET_LOGS, logs_params(range, &address, &topics))?;
                            all.extend(logs_from_response(response)?);
                        }
                        Ok(RpcResponse::from_result(Value::Array(all)))
                    }
                    PollPlan::Blocks { window } => {
                        let mut hashes = Vec::new();
                        for number in window.0..=window.1 {
                            let response = next.run(
                                rpc::BUB_GET_BLOCK_BY_NUMBER,
                                json!([u64_to_quantity(number), false]),
                            )?;
                            hashes.push(hash_from_response(response));
                        }
                        Ok(RpcResponse::from_result(Value::Array(hashes)))
                    }
                }
            }
            rpc::BUB_GET_FILTER_LOGS => {
                let id = match params.get(0).and_then(Value::as_str) {
                    Some(id) if self.knows(id) => id.to_string(),
                    _ => return next.run(method, params),
                };
                let head = if self.all_needs_head(&id) {
                    Some(head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([]))?)?)
                } else {
                    None
                };
                match self.plan_all(&id, head)? {
                    PollPlan::Empty => Ok(RpcResponse::from_result(json!([]))),
                    PollPlan::Logs { window, address, topics } => {
                        let mut all = Vec::new();
                        for range in block_ranges(window.0, window.1, self.max_blocks)? {
                            let response =
                                next.run(rpc::BUB_GET_LOGS, logs_params(range, &address, &topics))?;
                            all.extend(logs_from_response(response)?);
                        }
                        Ok(RpcResponse::from_result(Value::Array(all)))
                    }
                    PollPlan::Blocks { .. } => unreachable!("rejected by plan_all"),
                }
            }
            _ => next.run(method, params),
        }
    }
}

impl AsyncMiddleware for LocalFilterMiddleware {
    fn handle<'a>(
        &'a self,
        method: &'a str,
        params: Value,
        next: AsyncNext<'a>,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        Box::pin(async move {
            match method {
                rpc::BUB_NEW_FILTER => {
                    let spec = parse_new_filter(&params)?;
                    let origin = match spec.from {
                        FromSpec::Number(n) => n,
                        FromSpec::Latest => {
                            head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([])).await?)?
                                + 1
                        }
                    };
                    let id = self.insert(LocalFilter::Logs(LogFilterState {
                        origin,
                        cursor: origin,
                        to_block: spec.to,
                        address: spec.address,
                        topics: spec.topics,
                        last_head: None,
                    }));
                    Ok(RpcResponse::from_result(Value::String(id)))
                }
                rpc::BUB_NEW_BLOCK_FILTER => {
                    let head =
                        head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([])).await?)?;
                    let id = self.insert(LocalFilter::Blocks(BlockFilterState {
                        cursor: head + 1,
                        last_head: None,
                    }));
                    Ok(RpcResponse::from_result(Value::String(id)))
                }
                rpc::BUB_GET_FILTER_CHANGES => {
                    let id = match params.get(0).and_then(Value::as_str) {
                        Some(id) if self.knows(id) => id.to_string(),
                        _ => return next.run(method, params).await,
                    };
                    let head =
                        head_from_response(next.run(rpc::BUB_BLOCK_NUMBER, json!([])).await?)?;
                    match self.plan_poll(&id, head) {
                        PollPlan::Empty => Ok(RpcResponse::from_result(json!([]))),
                        PollPlan::Logs { window, address, topics } => {
                            let mut all = Vec::new();
                            for range in block_ranges(window.0, window.1, self.max_blocks)? {
                                let response = next
                                    .run(rpc::BUB_GET_LOGS, logs_params(range, &address, &topics))
                                    .await?;
                                all.extend(logs_from_response(response)?);
                            }
                            Ok(RpcResponse::from_result(Value::Array(all)))
                        }
                        PollPlan::Blocks { window } => {
                            let mut hashes = Vec::new();
                            for number in window.0..=window.1 {
                                let response = next
                                    .run(
                                        rpc::BUB_GET_BLOCK_BY_NUMBER,
                                        json!([u64_to_quantity(number), false]),
                                    )
                                    .await?;
                                hashes.push(hash_from_response(response));
                            }
                            Ok(RpcResponse::from_result(Value::Array(hashes)))
                        }
                    }
                }
                rpc::BUB_GET_FILTER_LOGS => {
                    let id = match params.get(0).and_then(Value::as_str) {
                        Some(id) if self.knows(id) => id.to_string(),
                        _ => return next.run(method, params).await,
                    };
                    let head = if self.all_needs_head(&id) {
                        Some(head_from_response(
                            next.run(rpc::BUB_BLOCK_NUMBER, json!([])).await?,
                        )?)
                    } else {
                        None
                    };
                    match self.plan_all(&id, head)? {
                        PollPlan::Empty => Ok(RpcResponse::from_result(json!([]))),
                        PollPlan::Logs { window, address, topics } => {
                            let mut all = Vec::new();
                            for range in block_ranges(window.0, window.1, self.max_blocks)? {
                                let response = next
                                    .run(rpc::BUB_GET_LOGS, logs_params(range, &address, &topics))
                                    .await?;
                                all.extend(logs_from_response(response)?);
                            }
                            Ok(RpcResponse::from_result(Value::Array(all)))
                        }
                        PollPlan::Blocks { .. } => unreachable!("rejected by plan_all"),
                    }
                }
                _ => next.run(method, params).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Onion, Position};
    use crate::provider::MockProvider;
    use std::sync::Arc;

    #[test]
    fn block_ranges_cover_without_overlap() {
        assert_eq!(block_ranges(0, 10, 3).unwrap(), vec![(0, 2), (3, 5), (6, 8), (9, 10)]);
        assert_eq!(block_ranges(5, 5, 50).unwrap(), vec![(5, 5)]);
        assert_eq!(block_ranges(0, 2, 10).unwrap(), vec![(0, 2)]);
    }

    #[test]
    fn block_ranges_reconstruct_the_full_range() {
        for (start, stop, step) in [(0u64, 100, 7), (3, 17, 1), (10, 11, 3), (0, 49, 50)] {
            let ranges = block_ranges(start, stop, step).unwrap();
            let mut expected = start;
            for (from, to) in ranges {
                assert_eq!(from, expected, "gap or overlap at {from}");
                assert!(to >= from);
                assert!(to - from + 1 <= step);
                expected = to + 1;
            }
            assert_eq!(expected, stop + 1, "range not fully covered");
        }
    }

    #[test]
    fn inverted_or_degenerate_ranges_are_rejected() {
        assert!(matches!(block_ranges(10, 0, 3), Err(ClientError::Validation(_))));
        assert!(matches!(block_ranges(0, 10, 0), Err(ClientError::Validation(_))));
    }

    fn onion(mw: LocalFilterMiddleware) -> Onion<Arc<dyn Middleware>> {
        let mut onion: Onion<Arc<dyn Middleware>> = Onion::new();
        onion.inject("local_filter", Arc::new(mw), Position::Outermost).unwrap();
        onion
    }

    fn create_filter(
        onion: &Onion<Arc<dyn Middleware>>,
        provider: &MockProvider,
        params: Value,
    ) -> String {
        let response = onion.dispatch(provider, rpc::BUB_NEW_FILTER, params).unwrap();
        response.result.unwrap().as_str().unwrap().to_string()
    }

    fn poll(
        onion: &Onion<Arc<dyn Middleware>>,
        provider: &MockProvider,
        id: &str,
    ) -> Vec<Value> {
        let response =
            onion.dispatch(provider, rpc::BUB_GET_FILTER_CHANGES, json!([id])).unwrap();
        response.result.unwrap().as_array().unwrap().clone()
    }

    fn requested_ranges(provider: &MockProvider) -> Vec<(u64, u64)> {
        provider
            .requests_for(rpc::BUB_GET_LOGS)
            .iter()
            .map(|params| {
                let spec = &params[0];
                (
                    quantity_to_u64(&spec["fromBlock"]).unwrap(),
                    quantity_to_u64(&spec["toBlock"]).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn polls_advance_monotonically_and_never_redeliver() {
        let provider = MockProvider::new();
        // Creation sees head 10, then polls see heads 15, 15 and 20.
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0xa"));
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0xf"));
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0xf"));
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x14"));
        provider.set_result(rpc::BUB_GET_LOGS, json!([{ "logIndex": "0x0" }]));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let id = create_filter(&onion, &provider, json!([{}]));

        assert_eq!(poll(&onion, &provider, &id).len(), 1);
        assert_eq!(poll(&onion, &provider, &id).len(), 0); // unchanged head
        assert_eq!(poll(&onion, &provider, &id).len(), 1);

        assert_eq!(requested_ranges(&provider), vec![(11, 15), (16, 20)]);
    }

    #[test]
    fn large_windows_are_chunked() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0xa")); // poll head 10
        provider.set_result(rpc::BUB_GET_LOGS, json!([]));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(3));
        let id = create_filter(&onion, &provider, json!([{ "fromBlock": "0x0" }]));
        poll(&onion, &provider, &id);

        assert_eq!(requested_ranges(&provider), vec![(0, 2), (3, 5), (6, 8), (9, 10)]);
    }

    #[test]
    fn explicit_from_block_skips_head_resolution() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x5")); // poll only
        provider.set_result(rpc::BUB_GET_LOGS, json!([]));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let id = create_filter(&onion, &provider, json!([{ "fromBlock": "0x2" }]));
        poll(&onion, &provider, &id);

        assert_eq!(requested_ranges(&provider), vec![(2, 5)]);
        // Only the poll consulted the head.
        assert_eq!(provider.requests_for(rpc::BUB_BLOCK_NUMBER).len(), 1);
    }

    #[test]
    fn from_block_ahead_of_head_is_empty_not_an_error() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x5"));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let id = create_filter(&onion, &provider, json!([{ "fromBlock": "0x64" }]));
        assert!(poll(&onion, &provider, &id).is_empty());
        assert!(provider.requests_for(rpc::BUB_GET_LOGS).is_empty());
    }

    #[test]
    fn bounded_filter_goes_quiet_past_its_to_block() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x8")); // head 8 <= to 10
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x14")); // head 20 > to 10
        provider.set_result(rpc::BUB_GET_LOGS, json!([]));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let id =
            create_filter(&onion, &provider, json!([{ "fromBlock": "0x5", "toBlock": "0xa" }]));
        poll(&onion, &provider, &id);
        assert_eq!(requested_ranges(&provider), vec![(5, 8)]);

        poll(&onion, &provider, &id);
        assert_eq!(requested_ranges(&provider), vec![(5, 8)]);
    }

    #[test]
    fn inverted_creation_range_is_rejected_up_front() {
        let provider = MockProvider::new();
        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let err = onion
            .dispatch(
                &provider,
                rpc::BUB_NEW_FILTER,
                json!([{ "fromBlock": "0xa", "toBlock": "0x5" }]),
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn unknown_filter_ids_fall_through_to_the_provider() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GET_FILTER_CHANGES, json!(["node-side"]));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let response =
            onion.dispatch(&provider, rpc::BUB_GET_FILTER_CHANGES, json!(["0x99"])).unwrap();
        assert_eq!(response.result, Some(json!(["node-side"])));
        assert_eq!(provider.requests_for(rpc::BUB_GET_FILTER_CHANGES), vec![json!(["0x99"])]);
    }

    #[test]
    fn filter_ids_are_unique_hex_strings() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_BLOCK_NUMBER, json!("0x1"));
        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let first = create_filter(&onion, &provider, json!([{}]));
        let second = create_filter(&onion, &provider, json!([{}]));
        assert_eq!(first, "0x0");
        assert_eq!(second, "0x1");
    }

    #[test]
    fn block_filter_returns_hashes_with_null_placeholders() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x5")); // creation head 5
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x8")); // poll head 8
        provider.push_result(rpc::BUB_GET_BLOCK_BY_NUMBER, json!({ "hash": "0x66" }));
        provider.push_result(rpc::BUB_GET_BLOCK_BY_NUMBER, json!(null)); // unretrievable
        provider.push_result(rpc::BUB_GET_BLOCK_BY_NUMBER, json!({ "hash": "0x88" }));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let response = onion.dispatch(&provider, rpc::BUB_NEW_BLOCK_FILTER, json!([])).unwrap();
        let id = response.result.unwrap().as_str().unwrap().to_string();

        let hashes = poll(&onion, &provider, &id);
        assert_eq!(hashes, vec![json!("0x66"), Value::Null, json!("0x88")]);
        assert_eq!(provider.requests_for(rpc::BUB_GET_BLOCK_BY_NUMBER).len(), 3);
    }

    #[test]
    fn get_filter_logs_does_not_move_the_poll_cursor() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x5")); // poll head 5
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x5")); // getFilterLogs head 5
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x6")); // poll head 6
        provider.set_result(rpc::BUB_GET_LOGS, json!([]));

        let onion = onion(LocalFilterMiddleware::with_max_blocks(50));
        let id = create_filter(&onion, &provider, json!([{ "fromBlock": "0x1" }]));

        poll(&onion, &provider, &id);
        onion.dispatch(&provider, rpc::BUB_GET_FILTER_LOGS, json!([id.clone()])).unwrap();
        poll(&onion, &provider, &id);

        // Poll windows stay monotonic; the full refetch covers from creation.
        assert_eq!(requested_ranges(&provider), vec![(1, 5), (1, 5), (6, 6)]);
    }

    #[tokio::test]
    async fn async_polls_match_blocking_semantics() {
        let provider = MockProvider::new();
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0xa"));
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0xf"));
        provider.push_result(rpc::BUB_BLOCK_NUMBER, json!("0x14"));
        provider.set_result(rpc::BUB_GET_LOGS, json!([]));

        let mut onion: Onion<Arc<dyn AsyncMiddleware>> = Onion::new();
        onion
            .inject(
                "local_filter",
                Arc::new(LocalFilterMiddleware::with_max_blocks(50)),
                Position::Outermost,
            )
            .unwrap();

        let created =
            onion.dispatch(&provider, rpc::BUB_NEW_FILTER, json!([{}])).await.unwrap();
        let id = created.result.unwrap().as_str().unwrap().to_string();

        onion.dispatch(&provider, rpc::BUB_GET_FILTER_CHANGES, json!([id.clone()])).await.unwrap();
        onion.dispatch(&provider, rpc::BUB_GET_FILTER_CHANGES, json!([id])).await.unwrap();

        assert_eq!(requested_ranges(&provider), vec![(11, 15), (16, 20)]);
    }
}
