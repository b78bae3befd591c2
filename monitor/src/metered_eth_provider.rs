// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ethers::providers::{Http, HttpClientError, JsonRpcClient, Provider};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use url::{ParseError, Url};

use crate::metrics::MonitorMetrics;

/// HTTP JSON-RPC transport that records every request to Prometheus
/// (`{url, query, status}` counter + latency histogram) and enforces the
/// configured requests-per-second budget with a minimum inter-request delay.
#[derive(Debug, Clone)]
pub struct MeteredEthHttpProvider {
    inner: Http,
    url: String,
    metrics: Arc<MonitorMetrics>,
    min_request_delay: Duration,
    last_request_time: Arc<Mutex<Instant>>,
}

#[async_trait::async_trait]
impl JsonRpcClient for MeteredEthHttpProvider {
    type Error = HttpClientError;

    async fn request<T: Serialize + Send + Sync + Debug, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: T,
    ) -> Result<R, HttpClientError> {
        // Enforce minimum delay between requests to stay under the rps budget
        if !self.min_request_delay.is_zero() {
            let mut last_request = self.last_request_time.lock().await;
            let elapsed = Instant::now().saturating_duration_since(*last_request);
            if elapsed < self.min_request_delay {
                tokio::time::sleep(self.min_request_delay - elapsed).await;
            }
            *last_request = Instant::now();
        }

        let timer = self
            .metrics
            .rpc_request_duration
            .with_label_values(&[&self.url, method])
            .start_timer();

        let result = self.inner.request(method, &params).await;

        timer.observe_duration();
        let status = if result.is_ok() { "ok" } else { "error" };
        self.metrics
            .rpc_request_results
            .with_label_values(&[&self.url, method, status])
            .inc();

        result
    }
}

impl MeteredEthHttpProvider {
    pub fn new(url: Url, rps: f64, metrics: Arc<MonitorMetrics>) -> Self {
        let min_request_delay = if rps > 0.0 {
            Duration::from_secs_f64(1.0 / rps)
        } else {
            Duration::ZERO
        };
        Self {
            inner: Http::new(url.clone()),
            url: url.to_string(),
            metrics,
            min_request_delay,
            last_request_time: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(1))),
        }
    }
}

pub fn new_metered_eth_provider(
    url: &str,
    rps: f64,
    metrics: Arc<MonitorMetrics>,
) -> Result<Provider<MeteredEthHttpProvider>, ParseError> {
    let http_provider = MeteredEthHttpProvider::new(Url::parse(url)?, rps, metrics);
    Ok(Provider::new(http_provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::Middleware;
    use prometheus::Registry;

    #[tokio::test]
    async fn test_metered_eth_provider_records_requests() {
        let metrics = Arc::new(MonitorMetrics::new(&Registry::new()));
        let provider = new_metered_eth_provider("http://localhost:9876/", 0.0, metrics.clone())
            .unwrap();

        provider.get_block_number().await.unwrap_err(); // no server behind the port

        assert_eq!(
            metrics
                .rpc_request_results
                .get_metric_with_label_values(&[
                    "http://localhost:9876/",
                    "eth_blockNumber",
                    "error"
                ])
                .unwrap()
                .get(),
            1
        );
        assert_eq!(
            metrics
                .rpc_request_duration
                .get_metric_with_label_values(&["http://localhost:9876/", "eth_blockNumber"])
                .unwrap()
                .get_sample_count(),
            1
        );
    }

    #[test]
    fn test_min_request_delay_from_rps() {
        let metrics = Arc::new(MonitorMetrics::new(&Registry::new()));
        let provider =
            MeteredEthHttpProvider::new(Url::parse("http://localhost:1/").unwrap(), 4.0, metrics);
        assert_eq!(provider.min_request_delay, Duration::from_millis(250));
    }
}
