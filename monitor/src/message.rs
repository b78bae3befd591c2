// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Canonical cross-chain message decoding.
//!
//! AMB messages are self-describing: the first four bytes of the 32-byte
//! message id select the payload layout. The pre-AMB generation ("legacy")
//! did not embed an id; its payload is re-materialized by prepending the
//! emitting transaction hash. In every dialect the cross-chain join key is
//! `msg_hash = keccak256(payload)`.

use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;

use crate::error::MessageDecodeError;

const V4_PREFIX: u32 = 0x0004_0000;
const V5_PREFIX: u32 = 0x0005_0000;

/// One decoded AMB message, tagged with its payload layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    V4(AmbMessage),
    V5(AmbMessage),
    Legacy(AmbMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbMessage {
    pub message_id: H256,
    pub sender: Address,
    pub executor: Address,
    pub gas_limit: u32,
    pub data_type: u8,
    pub data: Vec<u8>,
    pub msg_hash: H256,
}

impl DecodedMessage {
    pub fn fields(&self) -> &AmbMessage {
        match self {
            DecodedMessage::V4(m) | DecodedMessage::V5(m) | DecodedMessage::Legacy(m) => m,
        }
    }
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn check_len(payload: &[u8], need: usize) -> Result<(), MessageDecodeError> {
    if payload.len() < need {
        return Err(MessageDecodeError::TooShort(payload.len()));
    }
    Ok(())
}

/// Decodes a self-describing (v4/v5) AMB payload as emitted in
/// `UserRequestForSignature` / `UserRequestForAffirmation`.
pub fn decode_amb_message(payload: &[u8]) -> Result<DecodedMessage, MessageDecodeError> {
    check_len(payload, 32)?;
    let message_id = H256::from_slice(&payload[..32]);
    let msg_hash = H256::from(keccak256(payload));

    match be_u32(&payload[..4]) {
        V4_PREFIX => {
            check_len(payload, 109)?;
            Ok(DecodedMessage::V4(AmbMessage {
                message_id,
                sender: Address::from_slice(&payload[64..84]),
                executor: Address::from_slice(&payload[84..104]),
                gas_limit: be_u32(&payload[104..108]),
                data_type: payload[108],
                data: payload[108..].to_vec(),
                msg_hash,
            }))
        }
        V5_PREFIX => {
            check_len(payload, 79)?;
            let data_offset = 79 + payload[76] as usize + payload[77] as usize;
            check_len(payload, data_offset)?;
            Ok(DecodedMessage::V5(AmbMessage {
                message_id,
                sender: Address::from_slice(&payload[32..52]),
                executor: Address::from_slice(&payload[52..72]),
                gas_limit: be_u32(&payload[72..76]),
                data_type: payload[78],
                data: payload[data_offset..].to_vec(),
                msg_hash,
            }))
        }
        other => Err(MessageDecodeError::UnexpectedVersion(other)),
    }
}

/// Decodes a legacy (v1) payload. The emitted `encodedData` lacks the leading
/// message id; the fixed layout is restored by prepending the transaction
/// hash, which doubles as the message id.
pub fn decode_legacy_amb_message(
    tx_hash: H256,
    encoded_data: &[u8],
) -> Result<DecodedMessage, MessageDecodeError> {
    let mut payload = Vec::with_capacity(32 + encoded_data.len());
    payload.extend_from_slice(tx_hash.as_bytes());
    payload.extend_from_slice(encoded_data);

    check_len(&payload, 105)?;
    let data_type = payload[104];
    if data_type > 0 {
        return Err(MessageDecodeError::UnsupportedDataType(data_type));
    }

    Ok(DecodedMessage::Legacy(AmbMessage {
        message_id: tx_hash,
        sender: Address::from_slice(&payload[32..52]),
        executor: Address::from_slice(&payload[52..72]),
        gas_limit: be_u32(&payload[100..104]),
        data_type: 0,
        data: payload[105..].to_vec(),
        msg_hash: H256::from(keccak256(&payload)),
    }))
}

fn pad32(value: U256) -> [u8; 32] {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf
}

/// ERC-to-Native foreign→home join key:
/// `keccak256(recipient ∥ pad32(value) ∥ tx_hash)`.
pub fn erc_to_native_message_hash(recipient: Address, value: U256, tx_hash: H256) -> H256 {
    let mut payload = Vec::with_capacity(84);
    payload.extend_from_slice(recipient.as_bytes());
    payload.extend_from_slice(&pad32(value));
    payload.extend_from_slice(tx_hash.as_bytes());
    H256::from(keccak256(&payload))
}

/// ERC-to-Native home→foreign join key:
/// `keccak256(recipient ∥ pad32(value) ∥ tx_hash ∥ bridge)`, where `bridge` is
/// the foreign bridge address (the executing contract).
pub fn erc_to_native_message_hash_with_bridge(
    recipient: Address,
    value: U256,
    tx_hash: H256,
    bridge: Address,
) -> H256 {
    let mut payload = Vec::with_capacity(104);
    payload.extend_from_slice(recipient.as_bytes());
    payload.extend_from_slice(&pad32(value));
    payload.extend_from_slice(tx_hash.as_bytes());
    payload.extend_from_slice(bridge.as_bytes());
    H256::from(keccak256(&payload))
}

/// The message hash a validator signed, recovered from the confirming
/// transaction input: the 4-byte selector and 12 bytes of ABI padding are
/// stripped, the rest is the submitted payload.
pub fn signed_affirmation_hash(tx_input: &[u8]) -> Result<H256, MessageDecodeError> {
    if tx_input.len() <= 16 {
        return Err(MessageDecodeError::MalformedCallData);
    }
    Ok(H256::from(keccak256(&tx_input[16..])))
}

/// Recovers the `bytes` result argument from an information-confirmation call
/// payload. The dynamic offset lives in the last four bytes of the third
/// argument word; the length in the last four bytes of the word it points at.
pub fn recover_information_result(tx_input: &[u8]) -> Result<Vec<u8>, MessageDecodeError> {
    if tx_input.len() < 100 {
        return Err(MessageDecodeError::MalformedCallData);
    }
    let ptr = 4 + be_u32(&tx_input[96..100]) as usize;
    if tx_input.len() < ptr + 32 {
        return Err(MessageDecodeError::MalformedCallData);
    }
    let len = be_u32(&tx_input[ptr + 28..ptr + 32]) as usize;
    if tx_input.len() < ptr + 32 + len {
        return Err(MessageDecodeError::MalformedCallData);
    }
    Ok(tx_input[ptr + 32..ptr + 32 + len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from([n; 20])
    }

    fn v4_payload() -> Vec<u8> {
        // message id || 32 reserved bytes || sender || executor || gas || data
        let mut p = vec![0u8; 64];
        p[0] = 0x00;
        p[1] = 0x04;
        // remaining message id bytes
        for b in p.iter_mut().take(32).skip(4) {
            *b = 0xaa;
        }
        p.extend_from_slice(addr(0x11).as_bytes()); // sender [64..84]
        p.extend_from_slice(addr(0x22).as_bytes()); // executor [84..104]
        p.extend_from_slice(&[0x00, 0x0f, 0x42, 0x40]); // gas limit 1_000_000
        p.push(0x00); // data type at [108]
        p.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        p
    }

    #[test]
    fn test_decode_v4() {
        let payload = v4_payload();
        let decoded = decode_amb_message(&payload).unwrap();
        let DecodedMessage::V4(m) = &decoded else {
            panic!("expected v4, got {:?}", decoded);
        };

        assert_eq!(m.message_id.as_bytes(), &payload[..32]);
        assert_eq!(m.sender, addr(0x11));
        assert_eq!(m.executor, addr(0x22));
        assert_eq!(m.gas_limit, 1_000_000);
        assert_eq!(m.data_type, 0);
        // data starts at the data-type byte
        assert_eq!(m.data, &payload[108..]);
        assert_eq!(m.msg_hash, H256::from(keccak256(&payload)));
    }

    fn v5_payload(ext1: u8, ext2: u8) -> Vec<u8> {
        let mut p = vec![0u8; 32];
        p[1] = 0x05;
        for b in p.iter_mut().take(32).skip(4) {
            *b = 0xbb;
        }
        p.extend_from_slice(addr(0x33).as_bytes()); // sender [32..52]
        p.extend_from_slice(addr(0x44).as_bytes()); // executor [52..72]
        p.extend_from_slice(&[0x00, 0x01, 0x86, 0xa0]); // gas limit 100_000
        p.push(ext1); // [76] chain id length component
        p.push(ext2); // [77]
        p.push(0x80); // data type at [78]
        // variable-length chain id section, then the user data
        p.extend(std::iter::repeat(0xcc).take(ext1 as usize + ext2 as usize));
        p.extend_from_slice(&[0x01, 0x02, 0x03]);
        p
    }

    #[test]
    fn test_decode_v5() {
        let payload = v5_payload(2, 3);
        let decoded = decode_amb_message(&payload).unwrap();
        let DecodedMessage::V5(m) = &decoded else {
            panic!("expected v5, got {:?}", decoded);
        };

        assert_eq!(m.sender, addr(0x33));
        assert_eq!(m.executor, addr(0x44));
        assert_eq!(m.gas_limit, 100_000);
        assert_eq!(m.data_type, 0x80);
        assert_eq!(m.data, vec![0x01, 0x02, 0x03]);
        assert_eq!(m.msg_hash, H256::from(keccak256(&payload)));
    }

    #[test]
    fn test_decode_unknown_version() {
        let mut payload = vec![0u8; 120];
        payload[0] = 0x00;
        payload[1] = 0x06;
        assert_eq!(
            decode_amb_message(&payload),
            Err(MessageDecodeError::UnexpectedVersion(0x0006_0000))
        );
    }

    #[test]
    fn test_decode_too_short() {
        assert!(matches!(
            decode_amb_message(&[0u8; 8]),
            Err(MessageDecodeError::TooShort(8))
        ));
        let mut payload = vec![0u8; 40];
        payload[1] = 0x04;
        assert!(matches!(
            decode_amb_message(&payload),
            Err(MessageDecodeError::TooShort(40))
        ));
    }

    #[test]
    fn test_decode_legacy() {
        let tx_hash = H256::from([0x77; 32]);
        // encodedData: sender || executor || 28 reserved bytes || gas || type || data
        let mut encoded = Vec::new();
        encoded.extend_from_slice(addr(0x55).as_bytes()); // payload [32..52]
        encoded.extend_from_slice(addr(0x66).as_bytes()); // payload [52..72]
        encoded.extend_from_slice(&[0u8; 28]); // payload [72..100]
        encoded.extend_from_slice(&[0x00, 0x03, 0x0d, 0x40]); // gas 200_000, payload [100..104]
        encoded.push(0x00); // data type, payload [104]
        encoded.extend_from_slice(&[0x99, 0x98]);

        let decoded = decode_legacy_amb_message(tx_hash, &encoded).unwrap();
        let DecodedMessage::Legacy(m) = &decoded else {
            panic!("expected legacy, got {:?}", decoded);
        };

        assert_eq!(m.message_id, tx_hash);
        assert_eq!(m.sender, addr(0x55));
        assert_eq!(m.executor, addr(0x66));
        assert_eq!(m.gas_limit, 200_000);
        assert_eq!(m.data, vec![0x99, 0x98]);

        let mut full = tx_hash.as_bytes().to_vec();
        full.extend_from_slice(&encoded);
        assert_eq!(m.msg_hash, H256::from(keccak256(&full)));
    }

    #[test]
    fn test_decode_legacy_rejects_nonzero_data_type() {
        let mut encoded = vec![0u8; 73];
        encoded[72] = 0x80; // payload [104]
        assert_eq!(
            decode_legacy_amb_message(H256::zero(), &encoded),
            Err(MessageDecodeError::UnsupportedDataType(0x80))
        );
    }

    #[test]
    fn test_erc_to_native_hashes() {
        let recipient = addr(0x01);
        let value = U256::exp10(18);
        let tx_hash = H256::from([0x42; 32]);
        let bridge = addr(0x02);

        let mut expected = Vec::new();
        expected.extend_from_slice(recipient.as_bytes());
        expected.extend_from_slice(&pad32(value));
        expected.extend_from_slice(tx_hash.as_bytes());
        assert_eq!(
            erc_to_native_message_hash(recipient, value, tx_hash),
            H256::from(keccak256(&expected))
        );

        expected.extend_from_slice(bridge.as_bytes());
        assert_eq!(
            erc_to_native_message_hash_with_bridge(recipient, value, tx_hash, bridge),
            H256::from(keccak256(&expected))
        );
    }

    #[test]
    fn test_signed_affirmation_hash_strips_selector_and_padding() {
        let mut input = vec![0xff; 16];
        let payload = [0x01u8, 0x02, 0x03, 0x04];
        input.extend_from_slice(&payload);
        assert_eq!(
            signed_affirmation_hash(&input).unwrap(),
            H256::from(keccak256(payload))
        );

        assert_eq!(
            signed_affirmation_hash(&[0u8; 16]),
            Err(MessageDecodeError::MalformedCallData)
        );
    }

    #[test]
    fn test_recover_information_result() {
        // selector + 3 argument words; the third word holds the offset of the
        // dynamic bytes section relative to the argument start (96).
        let result = [0xab, 0xcd, 0xef];
        let mut input = vec![0u8; 4];
        input.extend_from_slice(&[0u8; 32]); // arg 0
        input.extend_from_slice(&[0u8; 32]); // arg 1
        let mut offset_word = [0u8; 32];
        offset_word[28..32].copy_from_slice(&96u32.to_be_bytes());
        input.extend_from_slice(&offset_word);
        let mut len_word = [0u8; 32];
        len_word[28..32].copy_from_slice(&(result.len() as u32).to_be_bytes());
        input.extend_from_slice(&len_word);
        input.extend_from_slice(&result);
        input.extend_from_slice(&[0u8; 29]); // tail padding

        assert_eq!(recover_information_result(&input).unwrap(), result.to_vec());
    }

    #[test]
    fn test_recover_information_result_bounds() {
        assert_eq!(
            recover_information_result(&[0u8; 10]),
            Err(MessageDecodeError::MalformedCallData)
        );

        // Offset pointing past the end of the input
        let mut input = vec![0u8; 100];
        input[96..100].copy_from_slice(&5000u32.to_be_bytes());
        assert_eq!(
            recover_information_result(&input),
            Err(MessageDecodeError::MalformedCallData)
        );
    }
}
