// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use monitor_schema::models::{BridgeValidator, NewBridgeValidator};
use monitor_schema::schema::bridge_validators;

use super::RepoCore;
use crate::error::{MonitorError, MonitorResult};

#[derive(Clone)]
pub struct BridgeValidatorsRepo {
    core: RepoCore,
}

impl BridgeValidatorsRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewBridgeValidator) -> MonitorResult<()> {
        let _t = self.core.timer("bridge_validators_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(bridge_validators::table)
            .values(&row)
            .on_conflict(bridge_validators::log_id)
            .do_update()
            .set(bridge_validators::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// The currently active validator row, i.e. the one without a removal log.
    /// Missing rows surface as [`MonitorError::NotFound`]; removal replay
    /// treats that as benign.
    pub async fn find_active(
        &self,
        bridge_id: &str,
        chain_id: &str,
        address: &[u8],
    ) -> MonitorResult<BridgeValidator> {
        let _t = self.core.timer("bridge_validators_find_active");
        let mut conn = self.core.conn().await?;
        bridge_validators::table
            .filter(bridge_validators::bridge_id.eq(bridge_id))
            .filter(bridge_validators::chain_id.eq(chain_id))
            .filter(bridge_validators::address.eq(address))
            .filter(bridge_validators::removed_log_id.is_null())
            .order(bridge_validators::log_id.desc())
            .first(&mut conn)
            .await
            .map_err(MonitorError::from)
    }

    /// Validator state is append-only: removal sets `removed_log_id`, rows are
    /// never deleted.
    pub async fn mark_removed(&self, log_id: i64, removed_log_id: i64) -> MonitorResult<()> {
        let _t = self.core.timer("bridge_validators_mark_removed");
        let mut conn = self.core.conn().await?;
        diesel::update(bridge_validators::table.find(log_id))
            .set((
                bridge_validators::removed_log_id.eq(Some(removed_log_id)),
                bridge_validators::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn find_by_bridge(&self, bridge_id: &str) -> MonitorResult<Vec<BridgeValidator>> {
        let _t = self.core.timer("bridge_validators_find_by_bridge");
        let mut conn = self.core.conn().await?;
        Ok(bridge_validators::table
            .filter(bridge_validators::bridge_id.eq(bridge_id))
            .order(bridge_validators::log_id)
            .load(&mut conn)
            .await?)
    }
}
