// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Contract ABIs and event decoding.
//!
//! Each monitored contract gets one combined ABI (bridge + validator contract
//! events, plus ERC20 `Transfer` where tokens are watched). Events are matched
//! by `topic0` *and* indexed-parameter arity, so same-signature variants that
//! differ only in `indexed` placement (the old and new bridge generations) are
//! told apart by their topic count.

use std::collections::HashMap;

use ethers::abi::{Abi, Event, RawLog, Token};
use ethers::types::H256;
use once_cell::sync::Lazy;

use crate::config::{BridgeMode, Side};
use crate::error::{MonitorError, MonitorResult};

static AMB_HOME_ABI: Lazy<Abi> = Lazy::new(|| {
    ethers::abi::parse_abi(&[
        "event UserRequestForSignature(bytes32 indexed messageId, bytes encodedData)",
        "event UserRequestForSignature(bytes encodedData)",
        "event SignedForUserRequest(address indexed signer, bytes32 messageHash)",
        "event SignedForAffirmation(address indexed signer, bytes32 messageHash)",
        "event CollectedSignatures(address authorityResponsibleForRelay, bytes32 messageHash, uint256 NumberOfCollectedSignatures)",
        "event AffirmationCompleted(address indexed sender, address indexed executor, bytes32 indexed messageId, bool status)",
        "event AffirmationCompleted(address sender, address executor, bytes32 messageId, bool status)",
        "event UserRequestForInformation(bytes32 indexed messageId, bytes32 indexed requestSelector, address indexed sender, bytes data)",
        "event SignedForInformation(address indexed signer, bytes32 indexed messageId)",
        "event InformationRetrieved(bytes32 indexed messageId, bool status, bool callbackStatus)",
        "event ValidatorAdded(address indexed validator)",
        "event ValidatorAdded(address validator)",
        "event ValidatorRemoved(address indexed validator)",
        "event ValidatorRemoved(address validator)",
    ])
    .expect("static AMB home ABI must parse")
});

static AMB_FOREIGN_ABI: Lazy<Abi> = Lazy::new(|| {
    ethers::abi::parse_abi(&[
        "event UserRequestForAffirmation(bytes32 indexed messageId, bytes encodedData)",
        "event UserRequestForAffirmation(bytes encodedData)",
        "event RelayedMessage(address indexed sender, address indexed executor, bytes32 indexed messageId, bool status)",
        "event RelayedMessage(address sender, address executor, bytes32 messageId, bool status)",
        "event ValidatorAdded(address indexed validator)",
        "event ValidatorAdded(address validator)",
        "event ValidatorRemoved(address indexed validator)",
        "event ValidatorRemoved(address validator)",
    ])
    .expect("static AMB foreign ABI must parse")
});

static ERC_TO_NATIVE_HOME_ABI: Lazy<Abi> = Lazy::new(|| {
    ethers::abi::parse_abi(&[
        "event UserRequestForSignature(address recipient, uint256 value)",
        "event SignedForUserRequest(address indexed signer, bytes32 messageHash)",
        "event SignedForAffirmation(address indexed signer, bytes32 transactionHash)",
        "event CollectedSignatures(address authorityResponsibleForRelay, bytes32 messageHash, uint256 NumberOfCollectedSignatures)",
        "event AffirmationCompleted(address recipient, uint256 value, bytes32 transactionHash)",
        "event ValidatorAdded(address indexed validator)",
        "event ValidatorAdded(address validator)",
        "event ValidatorRemoved(address indexed validator)",
        "event ValidatorRemoved(address validator)",
    ])
    .expect("static ERC-to-Native home ABI must parse")
});

static ERC_TO_NATIVE_FOREIGN_ABI: Lazy<Abi> = Lazy::new(|| {
    ethers::abi::parse_abi(&[
        "event UserRequestForAffirmation(address recipient, uint256 value)",
        "event RelayedMessage(address recipient, uint256 value, bytes32 transactionHash)",
        "event Transfer(address indexed from, address indexed to, uint256 value)",
        "event ValidatorAdded(address indexed validator)",
        "event ValidatorAdded(address validator)",
        "event ValidatorRemoved(address indexed validator)",
        "event ValidatorRemoved(address validator)",
    ])
    .expect("static ERC-to-Native foreign ABI must parse")
});

/// The ABI for one monitored contract, selected by bridge mode and side.
pub fn contract_abi(mode: BridgeMode, side: Side) -> &'static Abi {
    match (mode, side) {
        (BridgeMode::Amb, Side::Home) => &AMB_HOME_ABI,
        (BridgeMode::Amb, Side::Foreign) => &AMB_FOREIGN_ABI,
        (BridgeMode::ErcToNative, Side::Home) => &ERC_TO_NATIVE_HOME_ABI,
        (BridgeMode::ErcToNative, Side::Foreign) => &ERC_TO_NATIVE_FOREIGN_ABI,
    }
}

/// A decoded event: its canonical signature and the parameter values by name.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    pub signature: String,
    pub params: HashMap<String, Token>,
}

/// Canonical textual form used as the handler-registry key, e.g.
/// `event Transfer(address indexed from, address indexed to, uint256 value)`.
pub fn canonical_signature(event: &Event) -> String {
    let params = event
        .inputs
        .iter()
        .map(|p| {
            if p.indexed {
                format!("{} indexed {}", p.kind, p.name)
            } else {
                format!("{} {}", p.kind, p.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("event {}({})", event.name, params)
}

fn indexed_inputs(event: &Event) -> usize {
    event.inputs.iter().filter(|p| p.indexed).count()
}

/// Finds the event matching `topic0` and the indexed arity of `topics`.
pub fn find_event<'a>(abi: &'a Abi, topics: &[H256]) -> MonitorResult<Option<&'a Event>> {
    let topic0 = *topics.first().ok_or(MonitorError::InvalidEvent)?;
    Ok(abi.events().find(|e| {
        e.signature() == topic0 && indexed_inputs(e) == topics.len() - 1
    }))
}

/// Decodes a raw log against the ABI.
///
/// Returns `Ok(None)` for unknown events (no topic0/arity match); fails with
/// [`MonitorError::InvalidEvent`] for logs without topics.
pub fn parse_log(abi: &Abi, topics: &[H256], data: &[u8]) -> MonitorResult<Option<DecodedEvent>> {
    let Some(event) = find_event(abi, topics)? else {
        return Ok(None);
    };

    let raw = RawLog {
        topics: topics.to_vec(),
        data: data.to_vec(),
    };
    let parsed = event.parse_log(raw).map_err(|e| MonitorError::AbiDecode {
        event: event.name.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(DecodedEvent {
        signature: canonical_signature(event),
        params: parsed
            .params
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect(),
    }))
}

/// Checks that every registered handler signature exists in the ABI; the
/// startup guard behind the `incompatible-ABI` failure mode.
pub fn verify_event_handlers_abi(abi: &Abi, signatures: &[String]) -> MonitorResult<()> {
    let known: Vec<String> = abi.events().map(canonical_signature).collect();
    for sig in signatures {
        if !known.iter().any(|k| k == sig) {
            return Err(MonitorError::IncompatibleAbi(sig.clone()));
        }
    }
    Ok(())
}

impl DecodedEvent {
    pub fn address(&self, name: &'static str) -> MonitorResult<ethers::types::Address> {
        match self.params.get(name) {
            Some(Token::Address(a)) => Ok(*a),
            _ => Err(MonitorError::WrongArgumentType {
                name,
                expected: "address",
            }),
        }
    }

    pub fn uint(&self, name: &'static str) -> MonitorResult<ethers::types::U256> {
        match self.params.get(name) {
            Some(Token::Uint(v)) => Ok(*v),
            _ => Err(MonitorError::WrongArgumentType {
                name,
                expected: "uint256",
            }),
        }
    }

    pub fn hash(&self, name: &'static str) -> MonitorResult<H256> {
        match self.params.get(name) {
            Some(Token::FixedBytes(b)) if b.len() == 32 => Ok(H256::from_slice(b)),
            _ => Err(MonitorError::WrongArgumentType {
                name,
                expected: "bytes32",
            }),
        }
    }

    pub fn bytes(&self, name: &'static str) -> MonitorResult<Vec<u8>> {
        match self.params.get(name) {
            Some(Token::Bytes(b)) => Ok(b.clone()),
            _ => Err(MonitorError::WrongArgumentType {
                name,
                expected: "bytes",
            }),
        }
    }

    pub fn bool(&self, name: &'static str) -> MonitorResult<bool> {
        match self.params.get(name) {
            Some(Token::Bool(b)) => Ok(*b),
            _ => Err(MonitorError::WrongArgumentType {
                name,
                expected: "bool",
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use ethers::types::{Address, U256};

    /// Encodes `tokens` as a raw log for `event`: indexed parameters become
    /// topics, the rest is ABI-encoded into the data section.
    pub fn encode_log(event: &Event, tokens: &[Token]) -> (Vec<H256>, Vec<u8>) {
        assert_eq!(event.inputs.len(), tokens.len());
        let mut topics = vec![event.signature()];
        let mut data_tokens = Vec::new();

        for (param, token) in event.inputs.iter().zip(tokens) {
            if !param.indexed {
                data_tokens.push(token.clone());
                continue;
            }
            let topic = match token {
                Token::Address(a) => H256::from(*a),
                Token::Uint(v) => {
                    let mut buf = [0u8; 32];
                    v.to_big_endian(&mut buf);
                    H256::from(buf)
                }
                Token::FixedBytes(b) => H256::from_slice(b),
                other => panic!("unsupported indexed token in test fixture: {:?}", other),
            };
            topics.push(topic);
        }

        (topics, ethers::abi::encode(&data_tokens))
    }

    pub fn addr(n: u8) -> Address {
        Address::from([n; 20])
    }

    pub fn uint(n: u64) -> Token {
        Token::Uint(U256::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use ethers::abi::ParamType;
    use ethers::types::Address;

    fn event<'a>(abi: &'a Abi, name: &str, indexed: usize) -> &'a Event {
        abi.events()
            .find(|e| e.name == name && indexed_inputs(e) == indexed)
            .unwrap()
    }

    #[test]
    fn test_all_abis_parse() {
        for (mode, side) in [
            (BridgeMode::Amb, Side::Home),
            (BridgeMode::Amb, Side::Foreign),
            (BridgeMode::ErcToNative, Side::Home),
            (BridgeMode::ErcToNative, Side::Foreign),
        ] {
            assert!(contract_abi(mode, side).events().count() > 0);
        }
    }

    #[test]
    fn test_canonical_signature_format() {
        let abi = contract_abi(BridgeMode::ErcToNative, Side::Foreign);
        let transfer = event(abi, "Transfer", 2);
        assert_eq!(
            canonical_signature(transfer),
            "event Transfer(address indexed from, address indexed to, uint256 value)"
        );
    }

    #[test]
    fn test_parse_log_round_trip() {
        let abi = contract_abi(BridgeMode::ErcToNative, Side::Foreign);
        let transfer = event(abi, "Transfer", 2);
        let tokens = vec![
            Token::Address(addr(1)),
            Token::Address(addr(2)),
            uint(1_000_000),
        ];
        let (topics, data) = encode_log(transfer, &tokens);

        let decoded = parse_log(abi, &topics, &data).unwrap().unwrap();
        assert_eq!(decoded.signature, canonical_signature(transfer));
        assert_eq!(decoded.address("from").unwrap(), addr(1));
        assert_eq!(decoded.address("to").unwrap(), addr(2));
        assert_eq!(decoded.uint("value").unwrap().as_u64(), 1_000_000);
    }

    #[test]
    fn test_parse_log_round_trip_every_event() {
        for (mode, side) in [
            (BridgeMode::Amb, Side::Home),
            (BridgeMode::Amb, Side::Foreign),
            (BridgeMode::ErcToNative, Side::Home),
            (BridgeMode::ErcToNative, Side::Foreign),
        ] {
            let abi = contract_abi(mode, side);
            for ev in abi.events() {
                let tokens: Vec<Token> = ev
                    .inputs
                    .iter()
                    .map(|p| match &p.kind {
                        ParamType::Address => Token::Address(addr(9)),
                        ParamType::Uint(_) => uint(42),
                        ParamType::FixedBytes(32) => Token::FixedBytes(vec![7u8; 32]),
                        ParamType::Bytes => Token::Bytes(vec![1, 2, 3]),
                        ParamType::Bool => Token::Bool(true),
                        other => panic!("unexpected param type {:?}", other),
                    })
                    .collect();
                let (topics, data) = encode_log(ev, &tokens);
                let decoded = parse_log(abi, &topics, &data)
                    .unwrap()
                    .unwrap_or_else(|| panic!("no match for {}", ev.name));
                assert_eq!(decoded.signature, canonical_signature(ev));
                assert_eq!(decoded.params.len(), ev.inputs.len());
            }
        }
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        let abi = contract_abi(BridgeMode::Amb, Side::Home);
        let topics = vec![H256::from([0xee; 32])];
        assert!(parse_log(abi, &topics, &[]).unwrap().is_none());
    }

    #[test]
    fn test_arity_mismatch_is_unknown() {
        let abi = contract_abi(BridgeMode::ErcToNative, Side::Foreign);
        let transfer = event(abi, "Transfer", 2);
        // Known topic0 but only one indexed topic supplied: treated as unknown.
        let topics = vec![transfer.signature(), H256::from(Address::from([1u8; 20]))];
        assert!(parse_log(abi, &topics, &[]).unwrap().is_none());
    }

    #[test]
    fn test_arity_distinguishes_validator_event_generations() {
        let abi = contract_abi(BridgeMode::Amb, Side::Home);
        let indexed = event(abi, "ValidatorAdded", 1);
        let plain = event(abi, "ValidatorAdded", 0);
        assert_eq!(indexed.signature(), plain.signature());

        let (topics, data) = encode_log(plain, &[Token::Address(addr(3))]);
        let decoded = parse_log(abi, &topics, &data).unwrap().unwrap();
        assert_eq!(decoded.signature, canonical_signature(plain));
        assert_eq!(decoded.address("validator").unwrap(), addr(3));
    }

    #[test]
    fn test_empty_topics_is_invalid_event() {
        let abi = contract_abi(BridgeMode::Amb, Side::Home);
        assert!(matches!(
            parse_log(abi, &[], &[]),
            Err(MonitorError::InvalidEvent)
        ));
    }

    #[test]
    fn test_verify_event_handlers_abi() {
        let abi = contract_abi(BridgeMode::Amb, Side::Home);
        let ok = vec![
            "event SignedForUserRequest(address indexed signer, bytes32 messageHash)".to_string(),
        ];
        assert!(verify_event_handlers_abi(abi, &ok).is_ok());

        let bad = vec!["event NoSuchEvent(uint256 x)".to_string()];
        assert!(matches!(
            verify_event_handlers_abi(abi, &bad),
            Err(MonitorError::IncompatibleAbi(_))
        ));
    }

    #[test]
    fn test_wrong_argument_type() {
        let abi = contract_abi(BridgeMode::ErcToNative, Side::Foreign);
        let transfer = event(abi, "Transfer", 2);
        let tokens = vec![Token::Address(addr(1)), Token::Address(addr(2)), uint(5)];
        let (topics, data) = encode_log(transfer, &tokens);
        let decoded = parse_log(abi, &topics, &data).unwrap().unwrap();

        assert!(matches!(
            decoded.hash("value"),
            Err(MonitorError::WrongArgumentType { .. })
        ));
    }
}
