// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event handlers: one closed set of variants per bridge mode, installed at
//! monitor construction and checked against the contract ABI before any worker
//! starts. Handlers only issue repository upserts keyed on business keys, so
//! replaying a log is a row-level no-op.

mod amb;
mod erc_to_native;
mod information;
mod validators;

use std::sync::Arc;

use ethers::abi::Abi;
use ethers::providers::JsonRpcClient;
use ethers::types::{Address, H256};
use monitor_schema::models::Log;
use tracing::debug;

use crate::abi::DecodedEvent;
use crate::config::{BridgeMode, Side, TokenConfig};
use crate::error::MonitorResult;
use crate::eth_client::EthClient;
use crate::repositories::Repositories;

/// Message direction, stored as text on the message rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HomeToForeign,
    ForeignToHome,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::HomeToForeign => "home_to_foreign",
            Direction::ForeignToHome => "foreign_to_home",
        }
    }
}

/// The closed handler set. Which variants are live depends on the bridge mode
/// and side; see [`registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    AmbRequest { direction: Direction, legacy: bool },
    AmbExecution,
    SignedMessage,
    CollectedSignatures,
    ErcToNativeHomeRequest,
    ErcToNativeForeignRequest,
    ErcToNativeTransfer,
    ErcToNativeSignedAffirmation,
    ErcToNativeExecution { with_bridge: bool },
    InformationRequest,
    SignedInformation,
    InformationExecution,
    ValidatorAdded,
    ValidatorRemoved,
}

fn registry(mode: BridgeMode, side: Side) -> Vec<(&'static str, HandlerKind)> {
    use HandlerKind::*;

    let validator_events = [
        ("event ValidatorAdded(address indexed validator)", ValidatorAdded),
        ("event ValidatorAdded(address validator)", ValidatorAdded),
        ("event ValidatorRemoved(address indexed validator)", ValidatorRemoved),
        ("event ValidatorRemoved(address validator)", ValidatorRemoved),
    ];

    let mut entries: Vec<(&'static str, HandlerKind)> = match (mode, side) {
        (BridgeMode::Amb, Side::Home) => vec![
            (
                "event UserRequestForSignature(bytes32 indexed messageId, bytes encodedData)",
                AmbRequest { direction: Direction::HomeToForeign, legacy: false },
            ),
            (
                "event UserRequestForSignature(bytes encodedData)",
                AmbRequest { direction: Direction::HomeToForeign, legacy: true },
            ),
            (
                "event SignedForUserRequest(address indexed signer, bytes32 messageHash)",
                SignedMessage,
            ),
            (
                "event SignedForAffirmation(address indexed signer, bytes32 messageHash)",
                SignedMessage,
            ),
            (
                "event CollectedSignatures(address authorityResponsibleForRelay, bytes32 messageHash, uint256 NumberOfCollectedSignatures)",
                CollectedSignatures,
            ),
            (
                "event AffirmationCompleted(address indexed sender, address indexed executor, bytes32 indexed messageId, bool status)",
                AmbExecution,
            ),
            (
                "event AffirmationCompleted(address sender, address executor, bytes32 messageId, bool status)",
                AmbExecution,
            ),
            (
                "event UserRequestForInformation(bytes32 indexed messageId, bytes32 indexed requestSelector, address indexed sender, bytes data)",
                InformationRequest,
            ),
            (
                "event SignedForInformation(address indexed signer, bytes32 indexed messageId)",
                SignedInformation,
            ),
            (
                "event InformationRetrieved(bytes32 indexed messageId, bool status, bool callbackStatus)",
                InformationExecution,
            ),
        ],
        (BridgeMode::Amb, Side::Foreign) => vec![
            (
                "event UserRequestForAffirmation(bytes32 indexed messageId, bytes encodedData)",
                AmbRequest { direction: Direction::ForeignToHome, legacy: false },
            ),
            (
                "event UserRequestForAffirmation(bytes encodedData)",
                AmbRequest { direction: Direction::ForeignToHome, legacy: true },
            ),
            (
                "event RelayedMessage(address indexed sender, address indexed executor, bytes32 indexed messageId, bool status)",
                AmbExecution,
            ),
            (
                "event RelayedMessage(address sender, address executor, bytes32 messageId, bool status)",
                AmbExecution,
            ),
        ],
        (BridgeMode::ErcToNative, Side::Home) => vec![
            (
                "event UserRequestForSignature(address recipient, uint256 value)",
                ErcToNativeHomeRequest,
            ),
            (
                "event SignedForUserRequest(address indexed signer, bytes32 messageHash)",
                SignedMessage,
            ),
            (
                "event SignedForAffirmation(address indexed signer, bytes32 transactionHash)",
                ErcToNativeSignedAffirmation,
            ),
            (
                "event CollectedSignatures(address authorityResponsibleForRelay, bytes32 messageHash, uint256 NumberOfCollectedSignatures)",
                CollectedSignatures,
            ),
            (
                "event AffirmationCompleted(address recipient, uint256 value, bytes32 transactionHash)",
                ErcToNativeExecution { with_bridge: false },
            ),
        ],
        (BridgeMode::ErcToNative, Side::Foreign) => vec![
            (
                "event UserRequestForAffirmation(address recipient, uint256 value)",
                ErcToNativeForeignRequest,
            ),
            (
                "event RelayedMessage(address recipient, uint256 value, bytes32 transactionHash)",
                ErcToNativeExecution { with_bridge: true },
            ),
            (
                "event Transfer(address indexed from, address indexed to, uint256 value)",
                ErcToNativeTransfer,
            ),
        ],
    };

    entries.extend(validator_events);
    entries
}

/// Handler set for one monitored contract.
pub struct EventHandlers<P> {
    pub(crate) bridge_id: String,
    pub(crate) chain_id: String,
    pub(crate) bridge_address: Address,
    /// The other side's bridge address; part of the home→foreign
    /// ERC-to-Native hash preimage.
    pub(crate) remote_bridge_address: Address,
    pub(crate) tokens: Vec<TokenConfig>,
    pub(crate) client: Arc<EthClient<P>>,
    pub(crate) repos: Repositories,
    registry: Vec<(&'static str, HandlerKind)>,
}

impl<P> EventHandlers<P>
where
    P: JsonRpcClient + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bridge_id: String,
        chain_id: String,
        mode: BridgeMode,
        side: Side,
        bridge_address: Address,
        remote_bridge_address: Address,
        tokens: Vec<TokenConfig>,
        client: Arc<EthClient<P>>,
        repos: Repositories,
    ) -> Self {
        Self {
            bridge_id,
            chain_id,
            bridge_address,
            remote_bridge_address,
            tokens,
            client,
            repos,
            registry: registry(mode, side),
        }
    }

    /// Registered canonical event signatures, for the startup ABI check.
    pub fn signatures(&self) -> Vec<String> {
        self.registry.iter().map(|(s, _)| s.to_string()).collect()
    }

    pub fn verify_abi(&self, abi: &Abi) -> MonitorResult<()> {
        crate::abi::verify_event_handlers_abi(abi, &self.signatures())
    }

    /// Dispatches one decoded log to its handler. Events decoded from the ABI
    /// but not registered are skipped.
    pub async fn handle(&self, log: &Log, decoded: &DecodedEvent) -> MonitorResult<()> {
        let Some(kind) = self
            .registry
            .iter()
            .find(|(sig, _)| *sig == decoded.signature)
            .map(|(_, kind)| *kind)
        else {
            debug!("no handler registered for {}", decoded.signature);
            return Ok(());
        };

        match kind {
            HandlerKind::AmbRequest { direction, legacy } => {
                self.handle_amb_request(log, decoded, direction, legacy).await
            }
            HandlerKind::AmbExecution => self.handle_amb_execution(log, decoded).await,
            HandlerKind::SignedMessage => self.handle_signed_message(log, decoded).await,
            HandlerKind::CollectedSignatures => {
                self.handle_collected_signatures(log, decoded).await
            }
            HandlerKind::ErcToNativeHomeRequest => {
                self.handle_erc_to_native_home_request(log, decoded).await
            }
            HandlerKind::ErcToNativeForeignRequest => {
                self.handle_erc_to_native_foreign_request(log, decoded).await
            }
            HandlerKind::ErcToNativeTransfer => {
                self.handle_erc_to_native_transfer(log, decoded).await
            }
            HandlerKind::ErcToNativeSignedAffirmation => {
                self.handle_erc_to_native_signed_affirmation(log, decoded).await
            }
            HandlerKind::ErcToNativeExecution { with_bridge } => {
                self.handle_erc_to_native_execution(log, decoded, with_bridge).await
            }
            HandlerKind::InformationRequest => {
                self.handle_information_request(log, decoded).await
            }
            HandlerKind::SignedInformation => {
                self.handle_signed_information(log, decoded).await
            }
            HandlerKind::InformationExecution => {
                self.handle_information_execution(log, decoded).await
            }
            HandlerKind::ValidatorAdded => self.handle_validator_added(log, decoded).await,
            HandlerKind::ValidatorRemoved => self.handle_validator_removed(log, decoded).await,
        }
    }
}

pub(crate) fn log_tx_hash(log: &Log) -> H256 {
    H256::from_slice(&log.transaction_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::contract_abi;

    #[test]
    fn test_registry_signatures_match_abis() {
        for (mode, side) in [
            (BridgeMode::Amb, Side::Home),
            (BridgeMode::Amb, Side::Foreign),
            (BridgeMode::ErcToNative, Side::Home),
            (BridgeMode::ErcToNative, Side::Foreign),
        ] {
            let abi = contract_abi(mode, side);
            let signatures: Vec<String> = registry(mode, side)
                .iter()
                .map(|(s, _)| s.to_string())
                .collect();
            crate::abi::verify_event_handlers_abi(abi, &signatures)
                .unwrap_or_else(|e| panic!("{:?}/{:?}: {}", mode, side, e));
        }
    }

    #[test]
    fn test_registry_covers_every_abi_event() {
        // The inverse of the ABI check: every event the fetcher can decode has
        // a handler, so nothing silently falls through.
        for (mode, side) in [
            (BridgeMode::Amb, Side::Home),
            (BridgeMode::Amb, Side::Foreign),
            (BridgeMode::ErcToNative, Side::Home),
            (BridgeMode::ErcToNative, Side::Foreign),
        ] {
            let abi = contract_abi(mode, side);
            let signatures: Vec<String> = registry(mode, side)
                .iter()
                .map(|(s, _)| s.to_string())
                .collect();
            for event in abi.events() {
                let sig = crate::abi::canonical_signature(event);
                assert!(
                    signatures.contains(&sig),
                    "{:?}/{:?}: no handler for {}",
                    mode,
                    side,
                    sig
                );
            }
        }
    }

    #[test]
    fn test_direction_strings() {
        assert_eq!(Direction::HomeToForeign.as_str(), "home_to_foreign");
        assert_eq!(Direction::ForeignToHome.as_str(), "foreign_to_home");
    }
}
