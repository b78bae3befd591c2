// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handlers for the information-request sub-protocol (home side only).

use ethers::providers::JsonRpcClient;
use monitor_schema::models::{
    Log, NewExecutedInformationRequest, NewInformationRequest, NewSentInformationRequest,
    NewSignedInformationRequest,
};

use super::{log_tx_hash, EventHandlers};
use crate::abi::DecodedEvent;
use crate::error::MonitorResult;
use crate::message::recover_information_result;

impl<P> EventHandlers<P>
where
    P: JsonRpcClient + 'static,
{
    pub(super) async fn handle_information_request(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let message_id = decoded.hash("messageId")?;
        let request_selector = decoded.hash("requestSelector")?;
        let sender = decoded.address("sender")?;
        let data = decoded.bytes("data")?;

        self.repos
            .information_requests
            .ensure(NewInformationRequest {
                bridge_id: self.bridge_id.clone(),
                message_id: message_id.as_bytes().to_vec(),
                sender: sender.as_bytes().to_vec(),
                request_selector: request_selector.as_bytes().to_vec(),
                data,
            })
            .await?;

        self.repos
            .information_requests
            .ensure_sent(NewSentInformationRequest {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                message_id: message_id.as_bytes().to_vec(),
            })
            .await
    }

    /// `SignedForInformation`: the signed result payload is not part of the
    /// event; it is recovered from the confirming transaction input.
    pub(super) async fn handle_signed_information(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let message_id = decoded.hash("messageId")?;
        let signer = decoded.address("signer")?;

        let tx = self.client.transaction_by_hash(log_tx_hash(log)).await?;
        let data = recover_information_result(tx.input.as_ref())?;

        self.repos
            .information_requests
            .ensure_signed(NewSignedInformationRequest {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                message_id: message_id.as_bytes().to_vec(),
                signer: signer.as_bytes().to_vec(),
                data,
            })
            .await
    }

    pub(super) async fn handle_information_execution(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let message_id = decoded.hash("messageId")?;
        let status = decoded.bool("status")?;
        let callback_status = decoded.bool("callbackStatus")?;

        let tx = self.client.transaction_by_hash(log_tx_hash(log)).await?;
        let data = recover_information_result(tx.input.as_ref())?;

        self.repos
            .information_requests
            .ensure_executed(NewExecutedInformationRequest {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                message_id: message_id.as_bytes().to_vec(),
                status,
                callback_status,
                data,
            })
            .await
    }
}
