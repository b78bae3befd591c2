// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-contract ingestion pipeline.
//!
//! Three long-lived workers connected by bounded channels:
//!
//! ```text
//! HEAD → BlockFetcher ──ranges──▶ LogsFetcher ──batches──▶ LogsProcessor
//!                                     │                         │
//!                                 Logs.ensure              event handlers
//!                                 last_fetched             last_processed
//! ```
//!
//! The cursor advances only after the corresponding stage fully succeeded, so
//! any crash leaves the pipeline in a state the startup catch-up can resume
//! from: logs may be persisted twice (upsert), handlers may replay (idempotent
//! row writes), but a block is never skipped.

pub mod batches;

pub use batches::{split_block_range, split_logs_in_batches, BlocksRange, LogsBatch};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ethers::abi::Abi;
use ethers::providers::JsonRpcClient;
use ethers::types::{Address, Filter, H256};
use monitor_schema::models::{Log, NewBlockTimestamp, NewLog, NewLogsCursor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::abi::{contract_abi, parse_log};
use crate::config::{BridgeMode, ChainConfig, Side, SideConfig};
use crate::error::{MonitorError, MonitorResult};
use crate::eth_client::EthClient;
use crate::handlers::EventHandlers;
use crate::metrics::{ContractMetrics, MonitorMetrics};
use crate::repositories::{LogsFilter, Repositories};
use crate::retry_with_max_elapsed_time;
use crate::utils::context_sleep;

/// Capacity of the ranges channel; creates backpressure on the head poller.
const BLOCKS_RANGE_CHAN_CAPACITY: usize = 10;
/// Capacity of the per-block batch channel.
const LOGS_CHAN_CAPACITY: usize = 200;

/// How close (in blocks) `last_processed_block` must be to the safe head for
/// the monitor to count as synced.
const SYNCED_THRESHOLD_BLOCKS: u64 = 10;

const FETCHER_RETRY_DELAY: Duration = Duration::from_secs(10);
const PROCESSOR_RETRY_DELAY: Duration = Duration::from_secs(1);
const HEAD_POLL_MAX_RETRY: Duration = Duration::from_secs(30);

/// Shared, atomically updated view of one monitor's progress.
#[derive(Debug)]
pub struct MonitorState {
    synced: AtomicBool,
    last_fetched_block: AtomicU64,
    last_processed_block: AtomicU64,
}

impl MonitorState {
    fn new(last_fetched_block: u64, last_processed_block: u64) -> Self {
        Self {
            synced: AtomicBool::new(false),
            last_fetched_block: AtomicU64::new(last_fetched_block),
            last_processed_block: AtomicU64::new(last_processed_block),
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Relaxed)
    }

    pub fn last_fetched_block(&self) -> u64 {
        self.last_fetched_block.load(Ordering::Relaxed)
    }

    pub fn last_processed_block(&self) -> u64 {
        self.last_processed_block.load(Ordering::Relaxed)
    }
}

/// Monitors a single bridge contract on one chain.
pub struct ContractMonitor<P> {
    label: String,
    chain_id: String,
    side_config: SideConfig,
    chain_config: ChainConfig,
    bridge_address: Address,
    validator_contract_address: Address,
    abi: &'static Abi,
    client: Arc<EthClient<P>>,
    repos: Repositories,
    handlers: EventHandlers<P>,
    metrics: ContractMetrics,
    state: Arc<MonitorState>,
}

impl<P> ContractMonitor<P>
where
    P: JsonRpcClient + 'static,
{
    /// Builds a ready-to-start monitor: resolves the validator contract if the
    /// config does not pin it, loads or initializes the cursor, and checks the
    /// handler registry against the ABI. Spawns nothing.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        bridge_id: &str,
        mode: BridgeMode,
        side: Side,
        side_config: SideConfig,
        remote_side_config: &SideConfig,
        chain_config: ChainConfig,
        client: Arc<EthClient<P>>,
        repos: Repositories,
        metrics: &MonitorMetrics,
    ) -> MonitorResult<Self> {
        let chain_id = chain_config.chain_id.clone();
        let bridge_address = side_config.address;
        let label = format!("{}/{}", bridge_id, side);

        let validator_contract_address = match side_config.validator_contract_address {
            Some(address) => address,
            None => resolve_validator_contract(&client, bridge_address).await?,
        };
        info!(
            "[{}] validator contract at {:?}",
            label, validator_contract_address
        );

        let cursor = match repos
            .logs_cursors
            .get_by_chain_id_and_address(&chain_id, bridge_address.as_bytes())
            .await
        {
            Ok(cursor) => cursor,
            Err(MonitorError::NotFound) => {
                let fresh = NewLogsCursor {
                    chain_id: chain_id.clone(),
                    address: bridge_address.as_bytes().to_vec(),
                    last_fetched_block: side_config.start_block as i64 - 1,
                    last_processed_block: side_config.start_block as i64 - 1,
                };
                repos.logs_cursors.ensure(fresh).await?;
                repos
                    .logs_cursors
                    .get_by_chain_id_and_address(&chain_id, bridge_address.as_bytes())
                    .await?
            }
            Err(e) => return Err(e),
        };

        let handlers = EventHandlers::new(
            bridge_id.to_string(),
            chain_id.clone(),
            mode,
            side,
            bridge_address,
            remote_side_config.address,
            side_config.erc_to_native_tokens.clone(),
            client.clone(),
            repos.clone(),
        );
        let abi = contract_abi(mode, side);
        handlers.verify_abi(abi)?;

        let metrics = metrics.contract(bridge_id, &chain_id, &format!("{:?}", bridge_address));
        let state = Arc::new(MonitorState::new(
            cursor.last_fetched_block.max(0) as u64,
            cursor.last_processed_block.max(0) as u64,
        ));

        Ok(Self {
            label,
            chain_id,
            side_config,
            chain_config,
            bridge_address,
            validator_contract_address,
            abi,
            client,
            repos,
            handlers,
            metrics,
            state,
        })
    }

    pub fn state(&self) -> Arc<MonitorState> {
        self.state.clone()
    }

    /// Startup choreography: publish gauges, launch the head poller and the
    /// processor, re-feed already-persisted but unprocessed logs, then start
    /// fetching new ranges.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        self.metrics
            .fetched_block
            .set(self.state.last_fetched_block() as i64);
        self.metrics
            .processed_block
            .set(self.state.last_processed_block() as i64);

        let (ranges_tx, ranges_rx) = mpsc::channel(BLOCKS_RANGE_CHAN_CAPACITY);
        let (logs_tx, logs_rx) = mpsc::channel(LOGS_CHAN_CAPACITY);

        let mut handles = Vec::new();

        let monitor = self.clone();
        let cancel_clone = cancel.clone();
        handles.push(tokio::spawn(async move {
            monitor.run_block_fetcher(ranges_tx, cancel_clone).await;
        }));

        let monitor = self.clone();
        let cancel_clone = cancel.clone();
        handles.push(tokio::spawn(async move {
            monitor.run_logs_processor(logs_rx, cancel_clone).await;
        }));

        let monitor = self;
        handles.push(tokio::spawn(async move {
            // Re-feed logs persisted by a previous run that died between
            // Logs.ensure and the processed-cursor advance.
            if !monitor.feed_unprocessed_logs(&logs_tx, &cancel).await {
                return;
            }
            monitor.run_logs_fetcher(ranges_rx, logs_tx, cancel).await;
        }));

        handles
    }

    /// Manual reprocessing entry point used by the `reprocess-block-range`
    /// subcommand. Refuses ranges beyond the processed watermark and drains
    /// the work inline instead of going through the background queues.
    pub async fn process_block_range(&self, from: u64, to: u64) -> MonitorResult<()> {
        if from > to {
            return Err(MonitorError::Configuration(format!(
                "invalid range {}..{}",
                from, to
            )));
        }
        let last_processed = self.state.last_processed_block();
        if to > last_processed {
            return Err(MonitorError::Configuration(format!(
                "range end {} is beyond the last processed block {}",
                to, last_processed
            )));
        }

        let cancel = CancellationToken::new();
        for range in split_block_range(from, to, self.side_config.max_block_range_size) {
            info!("[{}] reprocessing blocks {}..{}", self.label, range.from, range.to);
            let new_logs = self.fetch_range_logs(range).await?;
            let batches = self.store_and_batch(new_logs).await?;
            for batch in batches {
                if !self.process_batch(&batch, &cancel).await {
                    return Err(MonitorError::Rpc("reprocessing interrupted".into()));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // BlockFetcher
    // ------------------------------------------------------------------

    async fn run_block_fetcher(
        self: Arc<Self>,
        ranges_tx: mpsc::Sender<BlocksRange>,
        cancel: CancellationToken,
    ) {
        info!("[{}] starting block fetcher", self.label);

        let mut next_start = self.state.last_fetched_block() + 1;
        let mut interval = time::interval(self.chain_config.block_index_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[{}] block fetcher cancelled", self.label);
                    return;
                }
                _ = interval.tick() => {}
            }

            let head = match retry_with_max_elapsed_time!(
                self.client.block_number(),
                HEAD_POLL_MAX_RETRY
            ) {
                Ok(Ok(head)) => head,
                _ => {
                    warn!("[{}] failed to fetch chain head after retry", self.label);
                    continue;
                }
            };

            let safe_head = head.saturating_sub(self.side_config.required_block_confirmations);
            self.metrics.head_block.set(safe_head as i64);

            let synced =
                self.state.last_processed_block() + SYNCED_THRESHOLD_BLOCKS > safe_head;
            self.state.synced.store(synced, Ordering::Relaxed);
            self.metrics.synced.set(synced as i64);

            if safe_head < next_start {
                continue;
            }

            for range in split_block_range(
                next_start,
                safe_head,
                self.side_config.max_block_range_size,
            ) {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("[{}] block fetcher cancelled", self.label);
                        return;
                    }
                    res = ranges_tx.send(range) => {
                        if res.is_err() {
                            return;
                        }
                    }
                }
            }
            next_start = safe_head + 1;
        }
    }

    // ------------------------------------------------------------------
    // LogsFetcher
    // ------------------------------------------------------------------

    async fn run_logs_fetcher(
        self: Arc<Self>,
        mut ranges_rx: mpsc::Receiver<BlocksRange>,
        logs_tx: mpsc::Sender<LogsBatch>,
        cancel: CancellationToken,
    ) {
        info!("[{}] starting logs fetcher", self.label);

        loop {
            let range = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[{}] logs fetcher cancelled", self.label);
                    return;
                }
                range = ranges_rx.recv() => match range {
                    Some(range) => range,
                    None => return,
                },
            };

            // Fetch and persist, retrying until success or shutdown.
            let batches = loop {
                let result = async {
                    let new_logs = self.fetch_range_logs(range).await?;
                    self.store_and_batch(new_logs).await
                }
                .await;
                match result {
                    Ok(batches) => break batches,
                    Err(e) => {
                        warn!(
                            "[{}] failed to fetch logs for blocks {}..{}: {}",
                            self.label, range.from, range.to, e
                        );
                        if !context_sleep(&cancel, FETCHER_RETRY_DELAY).await {
                            return;
                        }
                    }
                }
            };

            // An empty range still produces a sentinel batch so the processor
            // can advance its watermark over it.
            let batches = if batches.is_empty() {
                vec![LogsBatch {
                    block_number: range.to,
                    logs: vec![],
                }]
            } else {
                batches
            };

            for batch in batches {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("[{}] logs fetcher cancelled", self.label);
                        return;
                    }
                    res = logs_tx.send(batch) => {
                        if res.is_err() {
                            return;
                        }
                    }
                }
            }

            self.state
                .last_fetched_block
                .store(range.to, Ordering::Relaxed);
            self.metrics.fetched_block.set(range.to as i64);
            if !self.flush_cursor(&cancel).await {
                return;
            }
        }
    }

    /// Builds the filter queries for one range: the bridge and validator
    /// contracts, plus one query per watched token whose window intersects the
    /// range (ERC-to-Native only), restricted to transfers into the bridge.
    async fn fetch_range_logs(&self, range: BlocksRange) -> MonitorResult<Vec<NewLog>> {
        let base_filter = Filter::new()
            .address(vec![self.bridge_address, self.validator_contract_address])
            .from_block(range.from)
            .to_block(range.to);

        let mut raw_logs = self.run_filter(&base_filter).await?;

        for token in &self.side_config.erc_to_native_tokens {
            if !token.active_in_range(range.from, range.to) {
                continue;
            }
            let from = range.from.max(token.start_block.unwrap_or(0));
            let to = range.to.min(token.end_block.unwrap_or(u64::MAX));
            let token_filter = Filter::new()
                .address(token.address)
                .from_block(from)
                .to_block(to)
                .topic2(H256::from(self.bridge_address));
            raw_logs.extend(self.run_filter(&token_filter).await?);
        }

        let mut new_logs: Vec<NewLog> = raw_logs
            .into_iter()
            .filter_map(|log| self.to_new_log(log))
            .collect();
        new_logs.sort_by_key(|l| (l.block_number, l.log_index));
        Ok(new_logs)
    }

    async fn run_filter(&self, filter: &Filter) -> MonitorResult<Vec<ethers::types::Log>> {
        if self.chain_config.safe_logs_request {
            self.client.filter_logs_safe(filter).await
        } else {
            self.client.filter_logs(filter).await
        }
    }

    fn to_new_log(&self, log: ethers::types::Log) -> Option<NewLog> {
        let block_number = log.block_number?.as_u64() as i64;
        let log_index = log.log_index?.as_u64() as i64;
        let transaction_hash = log.transaction_hash?;
        let mut topics = log.topics.iter().map(|t| t.as_bytes().to_vec());
        Some(NewLog {
            chain_id: self.chain_id.clone(),
            address: log.address.as_bytes().to_vec(),
            topic0: topics.next(),
            topic1: topics.next(),
            topic2: topics.next(),
            topic3: topics.next(),
            data: log.data.to_vec(),
            block_number,
            log_index,
            transaction_hash: transaction_hash.as_bytes().to_vec(),
        })
    }

    /// Persists the fetched logs and regroups them, with their new surrogate
    /// ids, into per-block batches.
    async fn store_and_batch(&self, new_logs: Vec<NewLog>) -> MonitorResult<Vec<LogsBatch>> {
        let ids = self.repos.logs.ensure_many(&new_logs).await?;
        let now = Utc::now().naive_utc();
        let stored: Vec<Log> = new_logs
            .into_iter()
            .zip(ids)
            .map(|(l, id)| Log {
                id,
                chain_id: l.chain_id,
                address: l.address,
                topic0: l.topic0,
                topic1: l.topic1,
                topic2: l.topic2,
                topic3: l.topic3,
                data: l.data,
                block_number: l.block_number,
                log_index: l.log_index,
                transaction_hash: l.transaction_hash,
                created_at: now,
                updated_at: now,
            })
            .collect();
        Ok(split_logs_in_batches(stored))
    }

    /// Re-feeds persisted logs in `(last_processed, last_fetched]` to the
    /// processor. Returns `false` on shutdown.
    async fn feed_unprocessed_logs(
        &self,
        logs_tx: &mpsc::Sender<LogsBatch>,
        cancel: &CancellationToken,
    ) -> bool {
        let from = self.state.last_processed_block() as i64 + 1;
        let to = self.state.last_fetched_block() as i64;
        if from > to {
            return true;
        }

        let logs = loop {
            match self
                .repos
                .logs
                .find(LogsFilter {
                    chain_id: Some(self.chain_id.clone()),
                    addresses: self.monitored_addresses(),
                    from_block: Some(from),
                    to_block: Some(to),
                    ..LogsFilter::default()
                })
                .await
            {
                Ok(logs) => break logs,
                Err(e) => {
                    warn!("[{}] failed to load unprocessed logs: {}", self.label, e);
                    if !context_sleep(cancel, FETCHER_RETRY_DELAY).await {
                        return false;
                    }
                }
            }
        };

        if logs.is_empty() {
            return true;
        }
        info!(
            "[{}] re-feeding {} unprocessed logs from blocks {}..{}",
            self.label,
            logs.len(),
            from,
            to
        );
        for batch in split_logs_in_batches(logs) {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                res = logs_tx.send(batch) => {
                    if res.is_err() {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn monitored_addresses(&self) -> Vec<Vec<u8>> {
        let mut addresses = vec![
            self.bridge_address.as_bytes().to_vec(),
            self.validator_contract_address.as_bytes().to_vec(),
        ];
        for token in &self.side_config.erc_to_native_tokens {
            addresses.push(token.address.as_bytes().to_vec());
        }
        addresses
    }

    // ------------------------------------------------------------------
    // LogsProcessor
    // ------------------------------------------------------------------

    async fn run_logs_processor(
        self: Arc<Self>,
        mut logs_rx: mpsc::Receiver<LogsBatch>,
        cancel: CancellationToken,
    ) {
        info!("[{}] starting logs processor", self.label);

        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[{}] logs processor cancelled", self.label);
                    return;
                }
                batch = logs_rx.recv() => match batch {
                    Some(batch) => batch,
                    None => return,
                },
            };

            if !self.process_batch(&batch, &cancel).await {
                return;
            }

            self.state
                .last_processed_block
                .store(batch.block_number, Ordering::Relaxed);
            self.metrics.processed_block.set(batch.block_number as i64);
            if !self.flush_cursor(&cancel).await {
                return;
            }
        }
    }

    /// Runs the two per-batch subtasks (timestamp hydration, event handling)
    /// concurrently; both retry internally, so the batch either completes or
    /// the shutdown token fired. Returns `false` on shutdown.
    async fn process_batch(&self, batch: &LogsBatch, cancel: &CancellationToken) -> bool {
        let (ts_ok, handled_ok) = tokio::join!(
            self.hydrate_block_timestamp(batch, cancel),
            self.handle_batch_logs(batch, cancel),
        );
        ts_ok && handled_ok
    }

    async fn hydrate_block_timestamp(&self, batch: &LogsBatch, cancel: &CancellationToken) -> bool {
        // Sentinel batches carry no logs; their blocks are never timestamped.
        if batch.logs.is_empty() {
            return true;
        }

        loop {
            let result = async {
                let existing = self
                    .repos
                    .block_timestamps
                    .get(&self.chain_id, batch.block_number as i64)
                    .await?;
                if existing.is_some() {
                    return Ok(());
                }
                let header = self.client.header_by_number(batch.block_number).await?;
                let timestamp = DateTime::<Utc>::from_timestamp(header.timestamp as i64, 0)
                    .unwrap_or_default()
                    .naive_utc();
                self.repos
                    .block_timestamps
                    .ensure(NewBlockTimestamp {
                        chain_id: self.chain_id.clone(),
                        block_number: batch.block_number as i64,
                        timestamp,
                    })
                    .await
            }
            .await;

            match result {
                Ok(()) => return true,
                Err(e) => {
                    warn!(
                        "[{}] failed to hydrate timestamp for block {}: {}",
                        self.label, batch.block_number, e
                    );
                    if !context_sleep(cancel, PROCESSOR_RETRY_DELAY).await {
                        return false;
                    }
                }
            }
        }
    }

    /// Handles the batch's logs strictly in `(block, log_index)` order. Decode
    /// failures and unknown events are logged and skipped; retryable errors
    /// block the batch until they resolve.
    async fn handle_batch_logs(&self, batch: &LogsBatch, cancel: &CancellationToken) -> bool {
        for log in &batch.logs {
            let topics: Vec<H256> = log
                .topics()
                .iter()
                .filter(|t| t.len() == 32)
                .map(|t| H256::from_slice(t))
                .collect();

            let decoded = match parse_log(self.abi, &topics, &log.data) {
                Ok(Some(decoded)) => decoded,
                Ok(None) => {
                    warn!(
                        "[{}] unknown event in tx {} at block {}",
                        self.label,
                        hex::encode(&log.transaction_hash),
                        log.block_number
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        "[{}] cannot match log {} to an event: {}",
                        self.label, log.id, e
                    );
                    continue;
                }
            };

            loop {
                match self.handlers.handle(log, &decoded).await {
                    Ok(()) => break,
                    Err(e) if e.is_retryable() => {
                        warn!(
                            "[{}] handler for {} failed: {}; retrying",
                            self.label, decoded.signature, e
                        );
                        if !context_sleep(cancel, PROCESSOR_RETRY_DELAY).await {
                            return false;
                        }
                    }
                    Err(e) => {
                        error!(
                            "[{}] handler for {} failed on log {}: {}; skipping",
                            self.label, decoded.signature, log.id, e
                        );
                        break;
                    }
                }
            }
        }
        true
    }

    /// Writes the in-memory cursor back to the store, retrying until success
    /// or shutdown. Returns `false` on shutdown.
    async fn flush_cursor(&self, cancel: &CancellationToken) -> bool {
        let row = NewLogsCursor {
            chain_id: self.chain_id.clone(),
            address: self.bridge_address.as_bytes().to_vec(),
            last_fetched_block: self.state.last_fetched_block() as i64,
            last_processed_block: self.state.last_processed_block() as i64,
        };
        loop {
            match self.repos.logs_cursors.ensure(row.clone()).await {
                Ok(()) => return true,
                Err(e) => {
                    warn!("[{}] failed to persist cursor: {}", self.label, e);
                    if !context_sleep(cancel, FETCHER_RETRY_DELAY).await {
                        return false;
                    }
                }
            }
        }
    }
}

/// Reads the bridge's `validatorContract()` accessor.
async fn resolve_validator_contract<P>(
    client: &EthClient<P>,
    bridge_address: Address,
) -> MonitorResult<Address>
where
    P: JsonRpcClient + 'static,
{
    let selector = ethers::utils::id("validatorContract()").to_vec();
    let output = client
        .call_contract(bridge_address, selector)
        .await
        .map_err(|e| {
            MonitorError::Configuration(format!(
                "cannot resolve validator contract for {:?}: {}",
                bridge_address, e
            ))
        })?;
    if output.len() < 32 {
        return Err(MonitorError::Configuration(format!(
            "validatorContract() returned {} bytes",
            output.len()
        )));
    }
    Ok(Address::from_slice(&output[12..32]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_state_transitions() {
        let state = MonitorState::new(100, 90);
        assert!(!state.is_synced());
        assert_eq!(state.last_fetched_block(), 100);
        assert_eq!(state.last_processed_block(), 90);

        state.synced.store(true, Ordering::Relaxed);
        state.last_processed_block.store(100, Ordering::Relaxed);
        assert!(state.is_synced());
        assert_eq!(state.last_processed_block(), 100);
    }

    #[test]
    fn test_synced_threshold_semantics() {
        // synced ⇔ last_processed + threshold > safe_head
        let last_processed = 95u64;
        assert!(last_processed + SYNCED_THRESHOLD_BLOCKS > 100);
        assert!(!(last_processed + SYNCED_THRESHOLD_BLOCKS > 110));
    }

    #[tokio::test]
    async fn test_resolve_validator_contract_parses_accessor_output() {
        use ethers::providers::Provider;

        let (provider, mock) = Provider::mocked();
        let client = EthClient::new(provider, Duration::from_secs(1));

        let mut ret = [0u8; 32];
        ret[12..].copy_from_slice(&[0x11; 20]);
        mock.push(ethers::types::Bytes::from(ret.to_vec())).unwrap();

        let resolved = resolve_validator_contract(&client, Address::zero())
            .await
            .unwrap();
        assert_eq!(resolved, Address::from([0x11; 20]));

        // Empty mock queue: the RPC fails and surfaces as a configuration
        // error at construction time.
        let err = resolve_validator_contract(&client, Address::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Configuration(_)));
    }
}
