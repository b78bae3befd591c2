// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only HTTP presenter over the reconstructed state.
//!
//! Serves bridge/validator/log/message lookups straight from the shared
//! repositories. Requests are throttled to a small global concurrency budget;
//! `?pretty=1` switches to indented JSON.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::task::JoinHandle;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::MonitorError;
use crate::repositories::{LogsFilter, Repositories};

const MAX_CONCURRENT_REQUESTS: usize = 5;

#[derive(Clone)]
pub struct PresenterState {
    repos: Repositories,
    config: Arc<Config>,
}

pub struct Presenter;

impl Presenter {
    pub async fn start(
        addr: SocketAddr,
        repos: Repositories,
        config: Arc<Config>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let state = PresenterState { repos, config };
        let app = Router::new()
            .route("/bridge/:id", get(get_bridge))
            .route("/bridge/:id/config", get(get_bridge_config))
            .route("/bridge/:id/validators", get(get_bridge_validators))
            .route("/chain/:chain_id/block/:number/logs", get(get_block_logs))
            .route(
                "/chain/:chain_id/block/:number/messages",
                get(get_block_messages),
            )
            .route("/chain/:chain_id/tx/:hash/logs", get(get_chain_tx_logs))
            .route(
                "/chain/:chain_id/tx/:hash/messages",
                get(get_chain_tx_messages),
            )
            .route("/tx/:hash/logs", get(get_tx_logs))
            .route("/tx/:hash/messages", get(get_tx_messages))
            .layer(GlobalConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Presenter listening on {}", addr);

        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Presenter server error: {:?}", e);
            }
        }))
    }
}

type PresenterResult = Result<Response, (StatusCode, String)>;

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn json_response<T: Serialize>(params: &HashMap<String, String>, body: &T) -> PresenterResult {
    let pretty = params.get("pretty").is_some_and(|v| v.as_str() == "1");
    let encoded = if pretty {
        serde_json::to_string_pretty(body)
    } else {
        serde_json::to_string(body)
    }
    .map_err(internal)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        encoded,
    )
        .into_response())
}

fn parse_hash(raw: &str) -> Result<Vec<u8>, (StatusCode, String)> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid hash: {}", e)))?;
    if bytes.len() != 32 {
        return Err((StatusCode::BAD_REQUEST, "hash must be 32 bytes".to_string()));
    }
    Ok(bytes)
}

#[derive(Serialize)]
struct LogDto {
    id: i64,
    chain_id: String,
    address: String,
    topics: Vec<String>,
    data: String,
    block_number: i64,
    log_index: i64,
    transaction_hash: String,
}

impl From<monitor_schema::models::Log> for LogDto {
    fn from(log: monitor_schema::models::Log) -> Self {
        Self {
            id: log.id,
            chain_id: log.chain_id.clone(),
            address: format!("0x{}", hex::encode(&log.address)),
            topics: log
                .topics()
                .iter()
                .map(|t| format!("0x{}", hex::encode(t)))
                .collect(),
            data: format!("0x{}", hex::encode(&log.data)),
            block_number: log.block_number,
            log_index: log.log_index,
            transaction_hash: format!("0x{}", hex::encode(&log.transaction_hash)),
        }
    }
}

#[derive(Serialize)]
struct MessageDto {
    bridge_id: String,
    msg_hash: String,
    message_id: String,
    direction: String,
    sender: String,
    executor: String,
    gas_limit: i64,
    data_type: i16,
}

#[derive(Serialize)]
struct ErcToNativeMessageDto {
    bridge_id: String,
    msg_hash: String,
    direction: String,
    sender: String,
    receiver: String,
    value: String,
}

#[derive(Serialize)]
struct MessagesDto {
    messages: Vec<MessageDto>,
    erc_to_native_messages: Vec<ErcToNativeMessageDto>,
}

#[derive(Serialize)]
struct ValidatorDto {
    chain_id: String,
    address: String,
    active: bool,
}

#[derive(Serialize)]
struct BridgeSideDto {
    chain: String,
    chain_id: String,
    address: String,
    last_fetched_block: i64,
    last_processed_block: i64,
}

#[derive(Serialize)]
struct BridgeDto {
    bridge_id: String,
    mode: String,
    home: BridgeSideDto,
    foreign: BridgeSideDto,
}

async fn get_bridge(
    State(state): State<PresenterState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let bridge = state
        .config
        .bridges
        .get(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("unknown bridge {}", id)))?;

    let mut sides = Vec::new();
    for side in [&bridge.home, &bridge.foreign] {
        let chain = state.config.chain(&side.chain).map_err(internal)?;
        let cursor = state
            .repos
            .logs_cursors
            .get_by_chain_id_and_address(&chain.chain_id, side.address.as_bytes())
            .await;
        let (fetched, processed) = match cursor {
            Ok(c) => (c.last_fetched_block, c.last_processed_block),
            Err(MonitorError::NotFound) => (0, 0),
            Err(e) => return Err(internal(e)),
        };
        sides.push(BridgeSideDto {
            chain: side.chain.clone(),
            chain_id: chain.chain_id.clone(),
            address: format!("{:?}", side.address),
            last_fetched_block: fetched,
            last_processed_block: processed,
        });
    }
    let foreign = sides.pop().expect("two sides were pushed");
    let home = sides.pop().expect("two sides were pushed");

    json_response(
        &params,
        &BridgeDto {
            bridge_id: id,
            mode: match bridge.bridge_mode {
                crate::config::BridgeMode::Amb => "AMB".to_string(),
                crate::config::BridgeMode::ErcToNative => "ERC_TO_NATIVE".to_string(),
            },
            home,
            foreign,
        },
    )
}

async fn get_bridge_config(
    State(state): State<PresenterState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let bridge = state
        .config
        .bridges
        .get(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("unknown bridge {}", id)))?;
    json_response(&params, bridge)
}

async fn get_bridge_validators(
    State(state): State<PresenterState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let validators = state
        .repos
        .bridge_validators
        .find_by_bridge(&id)
        .await
        .map_err(internal)?;

    let dtos: Vec<ValidatorDto> = validators
        .into_iter()
        .map(|v| ValidatorDto {
            chain_id: v.chain_id,
            address: format!("0x{}", hex::encode(&v.address)),
            active: v.removed_log_id.is_none(),
        })
        .collect();
    json_response(&params, &dtos)
}

async fn find_logs(
    state: &PresenterState,
    filter: LogsFilter,
) -> Result<Vec<monitor_schema::models::Log>, (StatusCode, String)> {
    state.repos.logs.find(filter).await.map_err(internal)
}

async fn collect_messages(
    state: &PresenterState,
    logs: &[monitor_schema::models::Log],
) -> Result<MessagesDto, (StatusCode, String)> {
    let log_ids: Vec<i64> = logs.iter().map(|l| l.id).collect();
    let sent = state
        .repos
        .sent_messages
        .find_by_log_ids(&log_ids)
        .await
        .map_err(internal)?;

    let mut by_bridge: HashMap<String, Vec<Vec<u8>>> = HashMap::new();
    for s in &sent {
        by_bridge
            .entry(s.bridge_id.clone())
            .or_default()
            .push(s.msg_hash.clone());
    }

    let mut out = MessagesDto {
        messages: vec![],
        erc_to_native_messages: vec![],
    };
    for (bridge_id, hashes) in by_bridge {
        let messages = state
            .repos
            .messages
            .find_by_msg_hashes(&bridge_id, &hashes)
            .await
            .map_err(internal)?;
        out.messages.extend(messages.into_iter().map(|m| MessageDto {
            bridge_id: m.bridge_id,
            msg_hash: format!("0x{}", hex::encode(&m.msg_hash)),
            message_id: format!("0x{}", hex::encode(&m.message_id)),
            direction: m.direction,
            sender: format!("0x{}", hex::encode(&m.sender)),
            executor: format!("0x{}", hex::encode(&m.executor)),
            gas_limit: m.gas_limit,
            data_type: m.data_type,
        }));

        let erc_to_native = state
            .repos
            .erc_to_native_messages
            .find_by_msg_hashes(&bridge_id, &hashes)
            .await
            .map_err(internal)?;
        out.erc_to_native_messages
            .extend(erc_to_native.into_iter().map(|m| ErcToNativeMessageDto {
                bridge_id: m.bridge_id,
                msg_hash: format!("0x{}", hex::encode(&m.msg_hash)),
                direction: m.direction,
                sender: format!("0x{}", hex::encode(&m.sender)),
                receiver: format!("0x{}", hex::encode(&m.receiver)),
                value: m.value,
            }));
    }
    Ok(out)
}

async fn get_block_logs(
    State(state): State<PresenterState>,
    Path((chain_id, number)): Path<(String, i64)>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let logs = find_logs(
        &state,
        LogsFilter {
            chain_id: Some(chain_id),
            from_block: Some(number),
            to_block: Some(number),
            ..LogsFilter::default()
        },
    )
    .await?;
    let dtos: Vec<LogDto> = logs.into_iter().map(LogDto::from).collect();
    json_response(&params, &dtos)
}

async fn get_block_messages(
    State(state): State<PresenterState>,
    Path((chain_id, number)): Path<(String, i64)>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let logs = find_logs(
        &state,
        LogsFilter {
            chain_id: Some(chain_id),
            from_block: Some(number),
            to_block: Some(number),
            ..LogsFilter::default()
        },
    )
    .await?;
    let messages = collect_messages(&state, &logs).await?;
    json_response(&params, &messages)
}

async fn get_chain_tx_logs(
    State(state): State<PresenterState>,
    Path((chain_id, hash)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let logs = find_logs(
        &state,
        LogsFilter {
            chain_id: Some(chain_id),
            transaction_hash: Some(parse_hash(&hash)?),
            ..LogsFilter::default()
        },
    )
    .await?;
    let dtos: Vec<LogDto> = logs.into_iter().map(LogDto::from).collect();
    json_response(&params, &dtos)
}

async fn get_chain_tx_messages(
    State(state): State<PresenterState>,
    Path((chain_id, hash)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let logs = find_logs(
        &state,
        LogsFilter {
            chain_id: Some(chain_id),
            transaction_hash: Some(parse_hash(&hash)?),
            ..LogsFilter::default()
        },
    )
    .await?;
    let messages = collect_messages(&state, &logs).await?;
    json_response(&params, &messages)
}

async fn get_tx_logs(
    State(state): State<PresenterState>,
    Path(hash): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let logs = find_logs(
        &state,
        LogsFilter {
            transaction_hash: Some(parse_hash(&hash)?),
            ..LogsFilter::default()
        },
    )
    .await?;
    let dtos: Vec<LogDto> = logs.into_iter().map(LogDto::from).collect();
    json_response(&params, &dtos)
}

async fn get_tx_messages(
    State(state): State<PresenterState>,
    Path(hash): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> PresenterResult {
    let logs = find_logs(
        &state,
        LogsFilter {
            transaction_hash: Some(parse_hash(&hash)?),
            ..LogsFilter::default()
        },
    )
    .await?;
    let messages = collect_messages(&state, &logs).await?;
    json_response(&params, &messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash() {
        let h = "0x".to_string() + &"ab".repeat(32);
        assert_eq!(parse_hash(&h).unwrap().len(), 32);
        assert_eq!(parse_hash(&"cd".repeat(32)).unwrap().len(), 32);
        assert!(parse_hash("0x1234").is_err());
        assert!(parse_hash("zz").is_err());
    }
}
