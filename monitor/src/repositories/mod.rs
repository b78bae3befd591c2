// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Table-per-entity facade over the SQL store.
//!
//! Every repository exposes `ensure`-style upserts keyed on the entity's
//! business key. Child tables hang off `logs.id` and bump `updated_at` on
//! conflict, which is what makes handler replay idempotent at the row level.

mod information;
mod logs;
mod messages;
mod validators;

use std::sync::Arc;

use monitor_pg_db::{Connection, Db};

use crate::error::{MonitorError, MonitorResult};
use crate::metrics::MonitorMetrics;

pub use information::InformationRequestsRepo;
pub use logs::{BlockTimestampsRepo, LogsCursorsRepo, LogsFilter, LogsRepo};
pub use messages::{
    CollectedMessagesRepo, ErcToNativeMessagesRepo, ExecutedMessagesRepo, MessagesRepo,
    SentMessagesRepo, SignedMessagesRepo,
};
pub use validators::BridgeValidatorsRepo;

/// Shared plumbing for one repository: the pool handle plus the query-duration
/// histogram.
#[derive(Clone)]
pub(crate) struct RepoCore {
    db: Db,
    metrics: Arc<MonitorMetrics>,
}

impl RepoCore {
    pub(crate) async fn conn(&self) -> MonitorResult<Connection<'_>> {
        self.db
            .connect()
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))
    }

    pub(crate) fn timer(&self, query: &str) -> prometheus::HistogramTimer {
        self.metrics
            .db_query_duration
            .with_label_values(&[query])
            .start_timer()
    }
}

/// The full repository set shared by monitors, alert jobs and the presenter.
#[derive(Clone)]
pub struct Repositories {
    pub logs: LogsRepo,
    pub block_timestamps: BlockTimestampsRepo,
    pub logs_cursors: LogsCursorsRepo,
    pub messages: MessagesRepo,
    pub erc_to_native_messages: ErcToNativeMessagesRepo,
    pub sent_messages: SentMessagesRepo,
    pub signed_messages: SignedMessagesRepo,
    pub collected_messages: CollectedMessagesRepo,
    pub executed_messages: ExecutedMessagesRepo,
    pub information_requests: InformationRequestsRepo,
    pub bridge_validators: BridgeValidatorsRepo,
    db: Db,
}

impl Repositories {
    pub fn new(db: Db, metrics: Arc<MonitorMetrics>) -> Self {
        let core = RepoCore {
            db: db.clone(),
            metrics,
        };
        Self {
            logs: LogsRepo::new(core.clone()),
            block_timestamps: BlockTimestampsRepo::new(core.clone()),
            logs_cursors: LogsCursorsRepo::new(core.clone()),
            messages: MessagesRepo::new(core.clone()),
            erc_to_native_messages: ErcToNativeMessagesRepo::new(core.clone()),
            sent_messages: SentMessagesRepo::new(core.clone()),
            signed_messages: SignedMessagesRepo::new(core.clone()),
            collected_messages: CollectedMessagesRepo::new(core.clone()),
            executed_messages: ExecutedMessagesRepo::new(core.clone()),
            information_requests: InformationRequestsRepo::new(core.clone()),
            bridge_validators: BridgeValidatorsRepo::new(core),
            db,
        }
    }

    /// The underlying pool, for raw-SQL consumers (alert queries).
    pub fn db(&self) -> &Db {
        &self.db
    }
}
