// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use prometheus::{
    register_gauge_vec_with_registry, register_histogram_vec_with_registry,
    register_int_counter_vec_with_registry, register_int_gauge_vec_with_registry, Encoder,
    GaugeVec, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

const LATENCY_SEC_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Process-wide monitor metrics. Constructed once against a registry; monitors
/// obtain per-contract handles through [`MonitorMetrics::contract`].
#[derive(Clone, Debug)]
pub struct MonitorMetrics {
    registry: Registry,

    contract_latest_head_block: IntGaugeVec,
    contract_latest_fetched_block: IntGaugeVec,
    contract_latest_processed_block: IntGaugeVec,
    contract_synced: IntGaugeVec,

    pub rpc_request_results: IntCounterVec,
    pub rpc_request_duration: HistogramVec,
    pub db_query_duration: HistogramVec,
}

impl MonitorMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            registry: registry.clone(),
            contract_latest_head_block: register_int_gauge_vec_with_registry!(
                "monitor_contract_latest_head_block",
                "Chain head minus required confirmations, as seen by the block fetcher",
                &["bridge_id", "chain_id", "address"],
                registry,
            )
            .unwrap(),
            contract_latest_fetched_block: register_int_gauge_vec_with_registry!(
                "monitor_contract_latest_fetched_block",
                "Last block whose logs were fetched and persisted",
                &["bridge_id", "chain_id", "address"],
                registry,
            )
            .unwrap(),
            contract_latest_processed_block: register_int_gauge_vec_with_registry!(
                "monitor_contract_latest_processed_block",
                "Last block whose logs were fully handled",
                &["bridge_id", "chain_id", "address"],
                registry,
            )
            .unwrap(),
            contract_synced: register_int_gauge_vec_with_registry!(
                "monitor_contract_synced",
                "1 when the contract monitor has caught up to the safe head",
                &["bridge_id", "chain_id", "address"],
                registry,
            )
            .unwrap(),
            rpc_request_results: register_int_counter_vec_with_registry!(
                "monitor_rpc_request_results_total",
                "Total number of RPC requests, by url, query and status",
                &["url", "query", "status"],
                registry,
            )
            .unwrap(),
            rpc_request_duration: register_histogram_vec_with_registry!(
                "monitor_rpc_request_duration_seconds",
                "RPC request latency, by url and query",
                &["url", "query"],
                LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            db_query_duration: register_histogram_vec_with_registry!(
                "monitor_db_query_duration_seconds",
                "Database query latency, by query name",
                &["query"],
                LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
        }
    }

    /// Per-contract gauge handles owned by one ContractMonitor.
    pub fn contract(&self, bridge_id: &str, chain_id: &str, address: &str) -> ContractMetrics {
        let labels = &[bridge_id, chain_id, address];
        ContractMetrics {
            head_block: self.contract_latest_head_block.with_label_values(labels),
            fetched_block: self.contract_latest_fetched_block.with_label_values(labels),
            processed_block: self
                .contract_latest_processed_block
                .with_label_values(labels),
            synced: self.contract_synced.with_label_values(labels),
        }
    }

    /// A gauge vector for one alert kind, carrying the bridge id as a const
    /// label and kind-specific label names.
    pub fn alert_gauge(
        &self,
        bridge_id: &str,
        kind: &str,
        label_names: &[&str],
    ) -> prometheus::Result<GaugeVec> {
        let opts = Opts::new(
            format!("monitor_alert_{}", kind),
            format!("Alert gauge for {}", kind),
        )
        .const_label("bridge_id", bridge_id);
        register_gauge_vec_with_registry!(opts, label_names, &self.registry)
    }
}

#[derive(Clone, Debug)]
pub struct ContractMetrics {
    pub head_block: IntGauge,
    pub fetched_block: IntGauge,
    pub processed_block: IntGauge,
    pub synced: IntGauge,
}

/// Serves the Prometheus text exposition on `addr` (`/metrics`).
pub struct MetricsService;

impl MetricsService {
    pub async fn start(addr: SocketAddr, registry: Registry) -> anyhow::Result<JoinHandle<()>> {
        let app = Router::new()
            .route("/metrics", get(serve_metrics))
            .with_state(Arc::new(registry));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Metrics server listening on {}", addr);

        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server error: {:?}", e);
            }
        }))
    }
}

async fn serve_metrics(State(registry): State<Arc<Registry>>) -> Result<String, StatusCode> {
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_metrics_are_shared_by_labels() {
        let registry = Registry::new();
        let metrics = MonitorMetrics::new(&registry);

        let a = metrics.contract("bridge-1", "1", "0xabc");
        a.head_block.set(42);

        let b = metrics.contract("bridge-1", "1", "0xabc");
        assert_eq!(b.head_block.get(), 42);

        let other = metrics.contract("bridge-1", "100", "0xabc");
        assert_eq!(other.head_block.get(), 0);
    }

    #[test]
    fn test_alert_gauge_distinct_bridges_share_name() {
        let registry = Registry::new();
        let metrics = MonitorMetrics::new(&registry);

        let g1 = metrics
            .alert_gauge("bridge-1", "unknown_message_confirmation", &["chain_id"])
            .unwrap();
        let g2 = metrics
            .alert_gauge("bridge-2", "unknown_message_confirmation", &["chain_id"])
            .unwrap();

        g1.with_label_values(&["1"]).set(1.0);
        g2.with_label_values(&["1"]).set(2.0);

        let families = registry.gather();
        let family = families
            .iter()
            .find(|f| f.get_name() == "monitor_alert_unknown_message_confirmation")
            .unwrap();
        assert_eq!(family.get_metric().len(), 2);
    }

    #[test]
    fn test_rpc_counter_labels() {
        let registry = Registry::new();
        let metrics = MonitorMetrics::new(&registry);
        metrics
            .rpc_request_results
            .with_label_values(&["https://rpc", "eth_blockNumber", "ok"])
            .inc();
        assert_eq!(
            metrics
                .rpc_request_results
                .get_metric_with_label_values(&["https://rpc", "eth_blockNumber", "ok"])
                .unwrap()
                .get(),
            1
        );
    }
}
