// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! One bridge = two contract monitors plus an alert manager.
//!
//! The sides never reference each other; the parent owns both and derives the
//! combined sync predicate the alert scheduler consumes.

use std::sync::Arc;

use ethers::providers::JsonRpcClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::alerts::{AlertManager, AlertQueries, AlertQueryParams};
use crate::config::{BridgeConfig, Config, Side};
use crate::contract_monitor::ContractMonitor;
use crate::error::{MonitorError, MonitorResult};
use crate::eth_client::EthClient;
use crate::metered_eth_provider::{new_metered_eth_provider, MeteredEthHttpProvider};
use crate::metrics::MonitorMetrics;
use crate::repositories::Repositories;

pub struct BridgeMonitor<P> {
    bridge_id: String,
    home: Arc<ContractMonitor<P>>,
    foreign: Arc<ContractMonitor<P>>,
    alert_manager: Arc<AlertManager>,
}

impl BridgeMonitor<MeteredEthHttpProvider> {
    /// Builds both sides of one configured bridge over metered HTTP providers.
    pub async fn from_config(
        bridge_id: &str,
        bridge: &BridgeConfig,
        config: &Config,
        repos: Repositories,
        metrics: &Arc<MonitorMetrics>,
    ) -> MonitorResult<Self> {
        let home_chain = config.chain(&bridge.home.chain)?;
        let foreign_chain = config.chain(&bridge.foreign.chain)?;

        let home_client = Arc::new(EthClient::new(
            new_metered_eth_provider(&home_chain.rpc.host, home_chain.rpc.rps, metrics.clone())
                .map_err(|e| MonitorError::Configuration(e.to_string()))?,
            home_chain.rpc.timeout,
        ));
        let foreign_client = Arc::new(EthClient::new(
            new_metered_eth_provider(
                &foreign_chain.rpc.host,
                foreign_chain.rpc.rps,
                metrics.clone(),
            )
            .map_err(|e| MonitorError::Configuration(e.to_string()))?,
            foreign_chain.rpc.timeout,
        ));

        let home = Arc::new(
            ContractMonitor::new(
                bridge_id,
                bridge.bridge_mode,
                Side::Home,
                bridge.home.clone(),
                &bridge.foreign,
                home_chain.clone(),
                home_client,
                repos.clone(),
                metrics,
            )
            .await?,
        );
        let foreign = Arc::new(
            ContractMonitor::new(
                bridge_id,
                bridge.bridge_mode,
                Side::Foreign,
                bridge.foreign.clone(),
                &bridge.home,
                foreign_chain.clone(),
                foreign_client,
                repos.clone(),
                metrics,
            )
            .await?,
        );

        let params = AlertQueryParams {
            bridge_id: bridge_id.to_string(),
            home_chain_id: home_chain.chain_id.clone(),
            home_address: bridge.home.address.as_bytes().to_vec(),
            foreign_chain_id: foreign_chain.chain_id.clone(),
            foreign_address: bridge.foreign.address.as_bytes().to_vec(),
            whitelisted_senders: bridge
                .home
                .whitelisted_senders
                .iter()
                .chain(&bridge.foreign.whitelisted_senders)
                .map(|a| a.as_bytes().to_vec())
                .collect(),
        };
        let alert_manager = Arc::new(AlertManager::new(
            bridge_id,
            bridge.alerts.keys().cloned(),
            AlertQueries::new(repos.db().clone(), params),
            metrics,
        )?);

        Ok(Self {
            bridge_id: bridge_id.to_string(),
            home,
            foreign,
            alert_manager,
        })
    }
}

impl<P> BridgeMonitor<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn start(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        info!("[{}] starting bridge monitor", self.bridge_id);

        let mut handles = Vec::new();
        handles.extend(self.home.clone().start(cancel.clone()));
        handles.extend(self.foreign.clone().start(cancel.clone()));
        handles.push(self.alert_manager.clone().start(
            self.home.state(),
            self.foreign.state(),
            cancel,
        ));
        handles
    }

    /// Both sides have caught up to their safe heads.
    pub fn is_synced(&self) -> bool {
        self.home.state().is_synced() && self.foreign.state().is_synced()
    }

    pub fn bridge_id(&self) -> &str {
        &self.bridge_id
    }

    pub fn home(&self) -> &Arc<ContractMonitor<P>> {
        &self.home
    }

    pub fn foreign(&self) -> &Arc<ContractMonitor<P>> {
        &self.foreign
    }
}
