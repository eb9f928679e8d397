//! Transport collaborator
//!
//! Network access, signing and gas handling live behind [`Transport`]. The
//! runtime only builds requests and interprets the answers.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::options::TransactionOptions;
use crate::receipt::{Log, TransactionReceipt};

/// An encoded invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRequest {
    /// Target contract, `None` for deployments
    pub to: Option<String>,
    /// Hex call data, `0x`-prefixed
    pub data: String,
    pub options: TransactionOptions,
}

/// Log query over a block range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Option<String>,
    /// Accepted signature topics; a log matches any of them
    pub topics: Vec<String>,
}

impl LogFilter {
    /// Whether `log` satisfies the filter
    pub fn matches(&self, log: &Log) -> bool {
        let topic_ok = match log.topic0() {
            Some(topic) => self.topics.iter().any(|t| t.eq_ignore_ascii_case(topic)),
            None => false,
        };
        let address_ok = self
            .address
            .as_deref()
            .map(|address| log.is_from(address))
            .unwrap_or(true);
        let block_ok = log
            .block_number
            .map(|n| n >= self.from_block && n <= self.to_block)
            .unwrap_or(true);
        topic_ok && address_ok && block_ok
    }
}

/// Wallet or node connection used by contracts
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read-only invocation returning the raw return data
    async fn call(&self, request: CallRequest) -> anyhow::Result<Vec<u8>>;

    /// Submit a transaction and wait for its receipt
    async fn send(&self, request: CallRequest) -> anyhow::Result<TransactionReceipt>;

    /// Fetch logs matching `filter`
    async fn get_logs(&self, filter: LogFilter) -> anyhow::Result<Vec<Log>>;

    /// Execute several read-only invocations
    ///
    /// The default issues them concurrently; transports with a multicall
    /// facility can aggregate them into one round trip instead.
    async fn call_batch(&self, requests: Vec<CallRequest>) -> Vec<anyhow::Result<Vec<u8>>> {
        join_all(requests.into_iter().map(|request| self.call(request))).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, request: CallRequest) -> anyhow::Result<Vec<u8>> {
        (**self).call(request).await
    }

    async fn send(&self, request: CallRequest) -> anyhow::Result<TransactionReceipt> {
        (**self).send(request).await
    }

    async fn get_logs(&self, filter: LogFilter) -> anyhow::Result<Vec<Log>> {
        (**self).get_logs(filter).await
    }

    async fn call_batch(&self, requests: Vec<CallRequest>) -> Vec<anyhow::Result<Vec<u8>>> {
        (**self).call_batch(requests).await
    }
}
