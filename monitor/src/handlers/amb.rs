// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handlers for the AMB message lifecycle.

use ethers::providers::JsonRpcClient;
use monitor_schema::models::{
    Log, NewCollectedMessage, NewExecutedMessage, NewMessage, NewSentMessage, NewSignedMessage,
};

use super::{log_tx_hash, Direction, EventHandlers};
use crate::abi::DecodedEvent;
use crate::error::MonitorResult;
use crate::message::{decode_amb_message, decode_legacy_amb_message};

impl<P> EventHandlers<P>
where
    P: JsonRpcClient + 'static,
{
    /// `UserRequestForSignature` / `UserRequestForAffirmation`: decodes the
    /// canonical payload and records the Message plus its SentMessage link.
    pub(super) async fn handle_amb_request(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
        direction: Direction,
        legacy: bool,
    ) -> MonitorResult<()> {
        let encoded_data = decoded.bytes("encodedData")?;
        let message = if legacy {
            decode_legacy_amb_message(log_tx_hash(log), &encoded_data)?
        } else {
            decode_amb_message(&encoded_data)?
        };
        let fields = message.fields();

        self.repos
            .messages
            .ensure(NewMessage {
                bridge_id: self.bridge_id.clone(),
                msg_hash: fields.msg_hash.as_bytes().to_vec(),
                message_id: fields.message_id.as_bytes().to_vec(),
                direction: direction.as_str().to_string(),
                sender: fields.sender.as_bytes().to_vec(),
                executor: fields.executor.as_bytes().to_vec(),
                gas_limit: fields.gas_limit as i64,
                data_type: fields.data_type as i16,
                data: fields.data.clone(),
            })
            .await?;

        self.repos
            .sent_messages
            .ensure(NewSentMessage {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                msg_hash: fields.msg_hash.as_bytes().to_vec(),
            })
            .await
    }

    /// `SignedForUserRequest` / AMB `SignedForAffirmation`: one row per
    /// validator signature over the given message hash.
    pub(super) async fn handle_signed_message(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let msg_hash = decoded.hash("messageHash")?;
        let signer = decoded.address("signer")?;

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

    /// `CollectedSignatures`: the home-side threshold marker.
    pub(super) async fn handle_collected_signatures(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let msg_hash = decoded.hash("messageHash")?;
        let responsible = decoded.address("authorityResponsibleForRelay")?;
        let num_signatures = decoded.uint("NumberOfCollectedSignatures")?;

        self.repos
            .collected_messages
            .ensure(NewCollectedMessage {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                msg_hash: msg_hash.as_bytes().to_vec(),
                responsible_signer: responsible.as_bytes().to_vec(),
                num_signatures: num_signatures.as_u32() as i32,
            })
            .await
    }

    /// `RelayedMessage` / `AffirmationCompleted`: terminal event on the
    /// receiving side, keyed by the protocol-supplied message id.
    pub(super) async fn handle_amb_execution(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let message_id = decoded.hash("messageId")?;
        let status = decoded.bool("status")?;

        self.repos
            .executed_messages
            .ensure(NewExecutedMessage {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                message_id: message_id.as_bytes().to_vec(),
                status,
            })
            .await
    }
}
