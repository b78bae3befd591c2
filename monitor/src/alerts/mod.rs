// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Periodic anomaly probes published as labeled gauges.
//!
//! The manager waits until both sides of the bridge are synced, then runs one
//! task per configured alert kind. Result rows flow through a JSON round-trip
//! so every row shape maps onto the same `(labels, value)` projection without
//! per-kind glue.

pub mod jobs;
pub mod queries;

pub use jobs::{AlertKind, ALL_ALERT_KINDS};
pub use queries::{AlertQueries, AlertQueryParams};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use prometheus::GaugeVec;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::contract_monitor::MonitorState;
use crate::error::{MonitorError, MonitorResult};
use crate::metrics::MonitorMetrics;
use crate::utils::context_sleep;

const SYNC_POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct AlertManager {
    bridge_id: String,
    queries: Arc<AlertQueries>,
    gauges: HashMap<AlertKind, GaugeVec>,
}

impl AlertManager {
    /// Builds the manager from the configured alert-kind names. Unknown names
    /// and gauge registration failures are configuration errors.
    pub fn new(
        bridge_id: &str,
        configured_kinds: impl IntoIterator<Item = String>,
        queries: AlertQueries,
        metrics: &MonitorMetrics,
    ) -> MonitorResult<Self> {
        let mut gauges = HashMap::new();
        for name in configured_kinds {
            let kind = AlertKind::parse(&name)?;
            let gauge = metrics
                .alert_gauge(bridge_id, kind.as_str(), kind.label_names())
                .map_err(|e| {
                    MonitorError::Configuration(format!(
                        "cannot register alert gauge {}: {}",
                        kind.as_str(),
                        e
                    ))
                })?;
            gauges.insert(kind, gauge);
        }

        Ok(Self {
            bridge_id: bridge_id.to_string(),
            queries: Arc::new(queries),
            gauges,
        })
    }

    pub fn job_kinds(&self) -> Vec<AlertKind> {
        let mut kinds: Vec<AlertKind> = self.gauges.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    /// Waits for both monitors to sync, then runs every configured job on its
    /// own cadence until cancellation.
    pub fn start(
        self: Arc<Self>,
        home_state: Arc<MonitorState>,
        foreign_state: Arc<MonitorState>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while !(home_state.is_synced() && foreign_state.is_synced()) {
                if !context_sleep(&cancel, SYNC_POLL_INTERVAL).await {
                    return;
                }
            }
            info!("[{}] both sides synced, starting alert jobs", self.bridge_id);

            let mut handles = Vec::new();
            for (kind, gauge) in &self.gauges {
                let job = AlertJob {
                    bridge_id: self.bridge_id.clone(),
                    kind: *kind,
                    gauge: gauge.clone(),
                    queries: self.queries.clone(),
                    home_state: home_state.clone(),
                    foreign_state: foreign_state.clone(),
                };
                let cancel = cancel.clone();
                handles.push(tokio::spawn(async move { job.run(cancel).await }));
            }
            for handle in handles {
                let _ = handle.await;
            }
        })
    }
}

struct AlertJob {
    bridge_id: String,
    kind: AlertKind,
    gauge: GaugeVec,
    queries: Arc<AlertQueries>,
    home_state: Arc<MonitorState>,
    foreign_state: Arc<MonitorState>,
}

impl AlertJob {
    async fn run(&self, cancel: CancellationToken) {
        let mut interval = time::interval(self.kind.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = interval.tick() => {}
            }
            self.execute().await;
        }
    }

    /// One probe execution: skipped while out of sync, bounded by the kind's
    /// timeout, and only resetting the gauge after a successful query.
    async fn execute(&self) {
        if !(self.home_state.is_synced() && self.foreign_state.is_synced()) {
            return;
        }

        let rows = match time::timeout(self.kind.timeout(), self.queries.execute(self.kind)).await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                warn!(
                    "[{}] alert query {} failed: {}",
                    self.bridge_id,
                    self.kind.as_str(),
                    e
                );
                return;
            }
            Err(_) => {
                warn!(
                    "[{}] alert query {} timed out after {:?}",
                    self.bridge_id,
                    self.kind.as_str(),
                    self.kind.timeout()
                );
                return;
            }
        };

        self.gauge.reset();
        for row in &rows {
            match project_row(row, self.kind.label_names()) {
                Ok((labels, value)) => {
                    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
                    self.gauge.with_label_values(&refs).set(value);
                }
                Err(e) => warn!(
                    "[{}] cannot project {} row: {}",
                    self.bridge_id,
                    self.kind.as_str(),
                    e
                ),
            }
        }
    }
}

/// Maps one serialized result row onto gauge label values and the sample
/// value taken from the `_value` field.
pub fn project_row(
    row: &serde_json::Value,
    label_names: &[&str],
) -> MonitorResult<(Vec<String>, f64)> {
    let object = row
        .as_object()
        .ok_or_else(|| MonitorError::InvalidPostgresResult("row is not an object".into()))?;

    let value = match object.get("_value") {
        Some(serde_json::Value::String(s)) => s.parse::<f64>().map_err(|e| {
            MonitorError::InvalidPostgresResult(format!("bad _value {:?}: {}", s, e))
        })?,
        Some(serde_json::Value::Number(n)) => n.as_f64().ok_or_else(|| {
            MonitorError::InvalidPostgresResult(format!("bad numeric _value {}", n))
        })?,
        other => {
            return Err(MonitorError::InvalidPostgresResult(format!(
                "missing _value in row: {:?}",
                other
            )))
        }
    };

    let mut labels = Vec::with_capacity(label_names.len());
    for name in label_names {
        let label = match object.get(*name) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::Bool(b)) => b.to_string(),
            _ => {
                return Err(MonitorError::InvalidPostgresResult(format!(
                    "missing label {} in row",
                    name
                )))
            }
        };
        labels.push(label);
    }

    Ok((labels, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_row() {
        let row = json!({
            "chain_id": "1",
            "block_number": 11,
            "tx_hash": "aabb",
            "signer": "1111",
            "msg_hash": "2222",
            "_value": "3600"
        });
        let (labels, value) = project_row(
            &row,
            &["chain_id", "block_number", "tx_hash", "signer", "msg_hash"],
        )
        .unwrap();
        assert_eq!(labels, vec!["1", "11", "aabb", "1111", "2222"]);
        assert_eq!(value, 3600.0);
    }

    #[test]
    fn test_project_row_missing_label() {
        let row = json!({"chain_id": "1", "_value": "0"});
        assert!(project_row(&row, &["chain_id", "tx_hash"]).is_err());
    }

    #[test]
    fn test_project_row_bad_value() {
        let row = json!({"chain_id": "1", "_value": "not-a-number"});
        assert!(project_row(&row, &["chain_id"]).is_err());

        let row = json!({"chain_id": "1"});
        assert!(project_row(&row, &["chain_id"]).is_err());
    }

    #[test]
    fn test_project_row_numeric_value() {
        let row = json!({"chain_id": "1", "_value": 42});
        let (_, value) = project_row(&row, &["chain_id"]).unwrap();
        assert_eq!(value, 42.0);
    }
}
