// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Validator-set handlers. State is append-only: additions insert a row keyed
//! by the emitting log, removals only set `removed_log_id` on the active row.

use ethers::providers::JsonRpcClient;
use monitor_schema::models::{Log, NewBridgeValidator};
use tracing::debug;

use super::EventHandlers;
use crate::abi::DecodedEvent;
use crate::error::{ignore_not_found, MonitorResult};

impl<P> EventHandlers<P>
where
    P: JsonRpcClient + 'static,
{
    pub(super) async fn handle_validator_added(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let validator = decoded.address("validator")?;

        self.repos
            .bridge_validators
            .ensure(NewBridgeValidator {
                log_id: log.id,
                bridge_id: self.bridge_id.clone(),
                chain_id: self.chain_id.clone(),
                address: validator.as_bytes().to_vec(),
                removed_log_id: None,
            })
            .await
    }

    pub(super) async fn handle_validator_removed(
        &self,
        log: &Log,
        decoded: &DecodedEvent,
    ) -> MonitorResult<()> {
        let validator = decoded.address("validator")?;

        let active = ignore_not_found(
            self.repos
                .bridge_validators
                .find_active(&self.bridge_id, &self.chain_id, validator.as_bytes())
                .await,
        )?;

        match active {
            Some(row) => {
                self.repos
                    .bridge_validators
                    .mark_removed(row.log_id, log.id)
                    .await
            }
            None => {
                // Benign on replay: the removal may already be recorded.
                debug!(
                    "no active validator {:?} for bridge {} on removal",
                    validator, self.bridge_id
                );
                Ok(())
            }
        }
    }
}
