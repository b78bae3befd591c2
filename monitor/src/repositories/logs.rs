// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use monitor_schema::models::{BlockTimestamp, Log, LogsCursor, NewBlockTimestamp, NewLog, NewLogsCursor};
use monitor_schema::schema::{block_timestamps, logs, logs_cursors};

use super::RepoCore;
use crate::error::{MonitorError, MonitorResult};

/// Optional predicates for [`LogsRepo::find`]. Unset fields do not constrain
/// the result; ordering is always `(chain_id, block_number, log_index)`.
#[derive(Debug, Clone, Default)]
pub struct LogsFilter {
    pub chain_id: Option<String>,
    pub addresses: Vec<Vec<u8>>,
    pub from_block: Option<i64>,
    pub to_block: Option<i64>,
    pub transaction_hash: Option<Vec<u8>>,
    pub topic0: Vec<Vec<u8>>,
    pub topic2: Option<Vec<u8>>,
    pub data_length: Option<i32>,
}

#[derive(Clone)]
pub struct LogsRepo {
    core: RepoCore,
}

impl LogsRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    /// Multi-row upsert keyed on `(chain_id, block_number, log_index)`.
    /// Returns the surrogate ids in input order; a row-count mismatch means
    /// the database did not behave like Postgres and is reported as such.
    pub async fn ensure_many(&self, rows: &[NewLog]) -> MonitorResult<Vec<i64>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let _t = self.core.timer("logs_ensure");
        let mut conn = self.core.conn().await?;

        let ids: Vec<i64> = diesel::insert_into(logs::table)
            .values(rows)
            .on_conflict((logs::chain_id, logs::block_number, logs::log_index))
            .do_update()
            .set(logs::updated_at.eq(diesel::dsl::now))
            .returning(logs::id)
            .get_results(&mut conn)
            .await?;

        if ids.len() != rows.len() {
            return Err(MonitorError::InvalidPostgresResult(format!(
                "logs upsert returned {} ids for {} rows",
                ids.len(),
                rows.len()
            )));
        }
        Ok(ids)
    }

    pub async fn find(&self, filter: LogsFilter) -> MonitorResult<Vec<Log>> {
        let _t = self.core.timer("logs_find");
        let mut conn = self.core.conn().await?;

        let mut query = logs::table.into_boxed();
        if let Some(chain_id) = filter.chain_id {
            query = query.filter(logs::chain_id.eq(chain_id));
        }
        if !filter.addresses.is_empty() {
            query = query.filter(logs::address.eq_any(filter.addresses));
        }
        if let Some(from) = filter.from_block {
            query = query.filter(logs::block_number.ge(from));
        }
        if let Some(to) = filter.to_block {
            query = query.filter(logs::block_number.le(to));
        }
        if let Some(tx_hash) = filter.transaction_hash {
            query = query.filter(logs::transaction_hash.eq(tx_hash));
        }
        if !filter.topic0.is_empty() {
            query = query.filter(logs::topic0.eq_any(filter.topic0.into_iter().map(Some)));
        }
        if let Some(topic2) = filter.topic2 {
            query = query.filter(logs::topic2.eq(Some(topic2)));
        }
        if let Some(len) = filter.data_length {
            query = query.filter(diesel::dsl::sql::<diesel::sql_types::Bool>(&format!(
                "octet_length(data) = {}",
                len
            )));
        }

        Ok(query
            .order((logs::chain_id, logs::block_number, logs::log_index))
            .load(&mut conn)
            .await?)
    }

    pub async fn get_by_id(&self, id: i64) -> MonitorResult<Log> {
        let _t = self.core.timer("logs_get_by_id");
        let mut conn = self.core.conn().await?;
        Ok(logs::table.find(id).first(&mut conn).await?)
    }
}

#[derive(Clone)]
pub struct BlockTimestampsRepo {
    core: RepoCore,
}

impl BlockTimestampsRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn get(
        &self,
        chain_id: &str,
        block_number: i64,
    ) -> MonitorResult<Option<NaiveDateTime>> {
        let _t = self.core.timer("block_timestamps_get");
        let mut conn = self.core.conn().await?;
        Ok(block_timestamps::table
            .find((chain_id, block_number))
            .select(block_timestamps::timestamp)
            .first(&mut conn)
            .await
            .optional()?)
    }

    /// Upsert that also overwrites the timestamp on conflict, so later header
    /// corrections (`fix_block_timestamps`) take effect.
    pub async fn ensure(&self, row: NewBlockTimestamp) -> MonitorResult<()> {
        let _t = self.core.timer("block_timestamps_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(block_timestamps::table)
            .values(&row)
            .on_conflict((block_timestamps::chain_id, block_timestamps::block_number))
            .do_update()
            .set((
                block_timestamps::timestamp.eq(excluded(block_timestamps::timestamp)),
                block_timestamps::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn find_by_chain(&self, chain_id: &str) -> MonitorResult<Vec<BlockTimestamp>> {
        let _t = self.core.timer("block_timestamps_find_by_chain");
        let mut conn = self.core.conn().await?;
        Ok(block_timestamps::table
            .filter(block_timestamps::chain_id.eq(chain_id))
            .order(block_timestamps::block_number)
            .load(&mut conn)
            .await?)
    }
}

#[derive(Clone)]
pub struct LogsCursorsRepo {
    core: RepoCore,
}

impl LogsCursorsRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    /// Translates "no rows" into [`MonitorError::NotFound`]; callers branch on
    /// it to initialize fresh cursors.
    pub async fn get_by_chain_id_and_address(
        &self,
        chain_id: &str,
        address: &[u8],
    ) -> MonitorResult<LogsCursor> {
        let _t = self.core.timer("logs_cursors_get");
        let mut conn = self.core.conn().await?;
        logs_cursors::table
            .find((chain_id, address))
            .first(&mut conn)
            .await
            .map_err(MonitorError::from)
    }

    pub async fn ensure(&self, row: NewLogsCursor) -> MonitorResult<()> {
        let _t = self.core.timer("logs_cursors_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(logs_cursors::table)
            .values(&row)
            .on_conflict((logs_cursors::chain_id, logs_cursors::address))
            .do_update()
            .set((
                logs_cursors::last_fetched_block.eq(excluded(logs_cursors::last_fetched_block)),
                logs_cursors::last_processed_block
                    .eq(excluded(logs_cursors::last_processed_block)),
                logs_cursors::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
