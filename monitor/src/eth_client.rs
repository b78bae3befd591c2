// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockId, BlockNumber, Bytes, Filter, FilterBlockOption, Log, Transaction,
    TransactionRequest, TxHash, H256,
};

use crate::error::{MonitorError, MonitorResult};

/// Page size used by the strictly paginating [`EthClient::filter_logs_safe`]
/// variant, for providers that misbehave on wide `eth_getLogs` ranges.
const SAFE_LOGS_PAGE_SIZE: u64 = 250;

/// Block header fields the monitor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub number: u64,
    pub timestamp: u64,
}

/// Thin facade over an EVM JSON-RPC provider. Every call is bounded by the
/// configured RPC timeout; metering happens in the transport layer.
pub struct EthClient<P> {
    provider: Provider<P>,
    timeout: Duration,
}

impl<P> EthClient<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn new(provider: Provider<P>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> MonitorResult<T>
    where
        F: std::future::Future<Output = Result<T, ethers::providers::ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(MonitorError::Rpc(e.to_string())),
            Err(_) => Err(MonitorError::Rpc(format!(
                "rpc call timed out after {:?}",
                self.timeout
            ))),
        }
    }

    pub async fn chain_id(&self) -> MonitorResult<u64> {
        let id = self.bounded(self.provider.get_chainid()).await?;
        Ok(id.as_u64())
    }

    pub async fn block_number(&self) -> MonitorResult<u64> {
        let n = self.bounded(self.provider.get_block_number()).await?;
        Ok(n.as_u64())
    }

    pub async fn header_by_number(&self, number: u64) -> MonitorResult<Header> {
        let block = self
            .bounded(self.provider.get_block(BlockId::from(number)))
            .await?
            .ok_or_else(|| MonitorError::Rpc(format!("block {} not found", number)))?;
        Ok(Header {
            number,
            timestamp: block.timestamp.as_u64(),
        })
    }

    pub async fn filter_logs(&self, filter: &Filter) -> MonitorResult<Vec<Log>> {
        self.bounded(self.provider.get_logs(filter)).await
    }

    /// Like [`filter_logs`](Self::filter_logs) but splits the requested block
    /// range into fixed pages, issuing one query per page.
    pub async fn filter_logs_safe(&self, filter: &Filter) -> MonitorResult<Vec<Log>> {
        let (from, to) = match filter.block_option {
            FilterBlockOption::Range {
                from_block: Some(BlockNumber::Number(from)),
                to_block: Some(BlockNumber::Number(to)),
            } => (from.as_u64(), to.as_u64()),
            _ => {
                return Err(MonitorError::Rpc(
                    "safe logs request needs a bounded block range".into(),
                ))
            }
        };

        let mut logs = Vec::new();
        let mut page_start = from;
        while page_start <= to {
            let page_end = (page_start + SAFE_LOGS_PAGE_SIZE - 1).min(to);
            let page_filter = filter.clone().from_block(page_start).to_block(page_end);
            logs.extend(self.bounded(self.provider.get_logs(&page_filter)).await?);
            page_start = page_end + 1;
        }
        Ok(logs)
    }

    pub async fn call_contract(&self, to: Address, data: Vec<u8>) -> MonitorResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.bounded(self.provider.call(&tx, None)).await
    }

    pub async fn transaction_by_hash(&self, hash: H256) -> MonitorResult<Transaction> {
        self.bounded(self.provider.get_transaction(TxHash::from(hash)))
            .await?
            .ok_or_else(|| MonitorError::Rpc(format!("transaction {:?} not found", hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::MockProvider;
    use ethers::types::U64;

    fn mocked() -> (EthClient<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (EthClient::new(provider, Duration::from_secs(5)), mock)
    }

    #[tokio::test]
    async fn test_block_number() {
        let (client, mock) = mocked();
        mock.push(U64::from(12345u64)).unwrap();
        assert_eq!(client.block_number().await.unwrap(), 12345);
    }

    #[tokio::test]
    async fn test_filter_logs_safe_paginates() {
        let (client, mock) = mocked();
        // Three pages for a 600-block range with page size 250; responses are
        // popped in reverse order of the requests.
        mock.push::<Vec<Log>, _>(vec![]).unwrap();
        mock.push::<Vec<Log>, _>(vec![]).unwrap();
        mock.push::<Vec<Log>, _>(vec![]).unwrap();

        let filter = Filter::new().from_block(100u64).to_block(699u64);
        let logs = client.filter_logs_safe(&filter).await.unwrap();
        assert!(logs.is_empty());
        // A fourth page would have failed with an empty mock queue.
        assert!(client.filter_logs_safe(&filter).await.is_err());
    }

    #[tokio::test]
    async fn test_filter_logs_safe_requires_range() {
        let (client, _mock) = mocked();
        let filter = Filter::new();
        assert!(client.filter_logs_safe(&filter).await.is_err());
    }
}
