// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handlers for the ERC-to-Native dialect.
//!
//! The dialect has no self-describing message payload; the join key is
//! derived from `(recipient, value, tx_hash)` plus, for home→foreign flow,
//! the executing bridge address.

use ethers::providers::JsonRpcClient;
use ethers::types::{Address, H256, U256};
use monitor_schema::models::{
    Log, NewErcToNativeMessage, NewExecutedMessage, NewSentMessage, NewSignedMessage,
};
use tracing::debug;

use super::{log_tx_hash, Direction, EventHandlers};
use crate::abi::{contract_abi, DecodedEvent};
use crate::config::{BridgeMode, Side};
use crate::error::MonitorResult;
use crate::message::{
    erc_to_native_message_hash, erc_to_native_message_hash_with_bridge, signed_affirmation_hash,
};
use crate::repositories::LogsFilter;

fn pad32(value: U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf.to_vec()
}

fn transfer_topic0() -> H256 {
    contract_abi(BridgeMode::ErcToNative, Side::Foreign)
        .event("Transfer")
        .expect("Transfer is part of the static ABI")
        .signature()
}

fn affirmation_topic0() -> H256 {
    contract_abi(BridgeMode::ErcToNative, Side::Foreign)
        .event("UserRequestForAffirmation")
        .expect("UserRequestForAffirmation is part of the static ABI")
        .signature()
}

enum TransferSender {
    Found(Address),
    Blacklisted(Address),
    NotFound,
}

impl<P> EventHandlers<P>
where
    P: JsonRpcClient + 'static,
{
    /// Home `UserRequestForSignature(recipient, value)`. The original sender
    /// is only recoverable from the transaction itself: when the transaction
    /// carried exactly `value`, its signer is the sender; otherwise the
    /// recipient initiated the withdrawal for themselves.
    pub(super) async fn handle_erc_to_native_home_request(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let recipient = decoded.address("recipient")?;
        let value = decoded.uint("value")?;
        let tx_hash = log_tx_hash(log);

        let tx = self.client.transaction_by_hash(tx_hash).await?;
        let sender = if tx.value == value { tx.from } else { recipient };

        let msg_hash =
            erc_to_native_message_hash_with_bridge(recipient, value, tx_hash, self.remote_bridge_address);

        self.ensure_erc_to_native_message(
            log,
            msg_hash,
            Direction::HomeToForeign,
            sender,
            recipient,
            value,
        )
        .await
    }

    /// Foreign `UserRequestForAffirmation(recipient, value)`. The sender is
    /// resolved from the token Transfer that funded the request; dust from
    /// blacklisted senders is dropped entirely.
    pub(super) async fn handle_erc_to_native_foreign_request(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let recipient = decoded.address("recipient")?;
        let value = decoded.uint("value")?;
        let tx_hash = log_tx_hash(log);

        let sender = match self.find_transfer_sender(log, value).await? {
            TransferSender::Found(sender) => sender,
            TransferSender::Blacklisted(sender) => {
                debug!("skipping affirmation funded by blacklisted sender {:?}", sender);
                return Ok(());
            }
            TransferSender::NotFound => recipient,
        };

        let msg_hash = erc_to_native_message_hash(recipient, value, tx_hash);
        self.ensure_erc_to_native_message(
            log,
            msg_hash,
            Direction::ForeignToHome,
            sender,
            recipient,
            value,
        )
        .await
    }

    /// Bare `Transfer` into the bridge without a `UserRequestForAffirmation`
    /// in the same transaction: the transfer itself is the deposit, with the
    /// token sender acting as both sender and recipient.
    pub(super) async fn handle_erc_to_native_transfer(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let from = decoded.address("from")?;
        let to = decoded.address("to")?;
        let value = decoded.uint("value")?;

        if to != self.bridge_address {
            return Ok(());
        }
        if let Some(token) = self
            .tokens
            .iter()
            .find(|t| t.address.as_bytes() == log.address.as_slice())
        {
            if token.is_blacklisted(&from) {
                debug!("skipping transfer from blacklisted sender {:?}", from);
                return Ok(());
            }
        }

        // A UserRequestForAffirmation in the same tx supersedes the transfer.
        let affirmations = self
            .repos
            .logs
            .find(LogsFilter {
                chain_id: Some(self.chain_id.clone()),
                addresses: vec![self.bridge_address.as_bytes().to_vec()],
                transaction_hash: Some(log.transaction_hash.clone()),
                topic0: vec![affirmation_topic0().as_bytes().to_vec()],
                ..LogsFilter::default()
            })
            .await?;
        if !affirmations.is_empty() {
            return Ok(());
        }

        let tx_hash = log_tx_hash(log);
        let msg_hash = erc_to_native_message_hash(from, value, tx_hash);
        self.ensure_erc_to_native_message(
            log,
            msg_hash,
            Direction::ForeignToHome,
            from,
            from,
            value,
        )
        .await
    }

    /// Home `SignedForAffirmation(signer, transactionHash)`: the signed hash
    /// is not in the event; it is recomputed from the validator's submitted
    /// call payload.
    pub(super) async fn handle_erc_to_native_signed_affirmation(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let signer = decoded.address("signer")?;
        let tx = self.client.transaction_by_hash(log_tx_hash(log)).await?;
        let msg_hash = signed_affirmation_hash(tx.input.as_ref())?;

        self.repos
            .signed_messages
            .ensure(NewSignedMessage {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                msg_hash: msg_hash.as_bytes().to_vec(),
                signer: signer.as_bytes().to_vec(),
            })
            .await
    }

    /// Foreign `RelayedMessage` / home `AffirmationCompleted`: terminal event,
    /// keyed by the recomputed message hash (the executing contract address is
    /// part of the preimage only on the foreign side).
    pub(super) async fn handle_erc_to_native_execution(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
        with_bridge: bool,
    ) -> MonitorResult<()> {
        let recipient = decoded.address("recipient")?;
        let value = decoded.uint("value")?;
        let tx_hash = decoded.hash("transactionHash")?;

        let message_id = if with_bridge {
            erc_to_native_message_hash_with_bridge(
                recipient,
                value,
                tx_hash,
                Address::from_slice(&log.address),
            )
        } else {
            erc_to_native_message_hash(recipient, value, tx_hash)
        };

        self.repos
            .executed_messages
            .ensure(NewExecutedMessage {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                message_id: message_id.as_bytes().to_vec(),
                status: true,
            })
            .await
    }

    async fn ensure_erc_to_native_message(
        &self,
        log: &Log,
        msg_hash: H256,
        direction: Direction,
        sender: Address,
        receiver: Address,
        value: U256,
    ) -> MonitorResult<()> {
        self.repos
            .erc_to_native_messages
            .ensure(NewErcToNativeMessage {
                bridge_id: self.bridge_id.clone(),
                msg_hash: msg_hash.as_bytes().to_vec(),
                direction: direction.as_str().to_string(),
                sender: sender.as_bytes().to_vec(),
                receiver: receiver.as_bytes().to_vec(),
                value: value.to_string(),
            })
            .await?;

        self.repos
            .sent_messages
            .ensure(NewSentMessage {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                msg_hash: msg_hash.as_bytes().to_vec(),
            })
            .await
    }

    /// Searches prior Transfer logs of the watched tokens in the same
    /// transaction whose receiver is the bridge and whose amount matches
    /// `value` exactly; the transfer's `from` is the resolved sender.
    async fn find_transfer_sender(
        &self,
        log: &Log,
        value: U256,
    ) -> MonitorResult<TransferSender> {
        if self.tokens.is_empty() {
            return Ok(TransferSender::NotFound);
        }

        let transfers = self
            .repos
            .logs
            .find(LogsFilter {
                chain_id: Some(self.chain_id.clone()),
                addresses: self
                    .tokens
                    .iter()
                    .map(|t| t.address.as_bytes().to_vec())
                    .collect(),
                transaction_hash: Some(log.transaction_hash.clone()),
                topic0: vec![transfer_topic0().as_bytes().to_vec()],
                topic2: Some(H256::from(self.bridge_address).as_bytes().to_vec()),
                data_length: Some(32),
                ..LogsFilter::default()
            })
            .await?;

        let expected = pad32(value);
        for transfer in transfers {
            if transfer.log_index >= log.log_index || transfer.data != expected {
                continue;
            }
            let Some(topic1) = &transfer.topic1 else {
                continue;
            };
            if topic1.len() != 32 {
                continue;
            }
            let from = Address::from_slice(&topic1[12..]);
            if let Some(token) = self
                .tokens
                .iter()
                .find(|t| t.address.as_bytes() == transfer.address.as_slice())
            {
                if token.is_blacklisted(&from) {
                    return Ok(TransferSender::Blacklisted(from));
                }
            }
            return Ok(TransferSender::Found(from));
        }
        Ok(TransferSender::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::keccak256;

    #[test]
    fn test_transfer_topic0_is_the_canonical_erc20_signature() {
        assert_eq!(
            transfer_topic0(),
            H256::from(keccak256("Transfer(address,address,uint256)"))
        );
    }

    #[test]
    fn test_affirmation_topic0() {
        assert_eq!(
            affirmation_topic0(),
            H256::from(keccak256("UserRequestForAffirmation(address,uint256)"))
        );
    }

    #[test]
    fn test_pad32() {
        let padded = pad32(U256::from(1u64));
        assert_eq!(padded.len(), 32);
        assert_eq!(padded[31], 1);
        assert!(padded[..31].iter().all(|b| *b == 0));
    }
}
