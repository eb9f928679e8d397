//! Receipts and logs as returned by the transport

use std::collections::BTreeMap;

use ethbind_abi::codec::decode_hex;
use ethbind_common::Result;
use serde::{Deserialize, Serialize};

/// A raw log entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract
    pub address: String,
    /// Hex topics, signature topic first unless the event is anonymous
    pub topics: Vec<String>,
    /// Hex-encoded non-indexed data
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl Log {
    /// Signature topic, if any
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }

    /// Whether the log was emitted by `address`, ignoring case
    pub fn is_from(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }

    pub(crate) fn topic_bytes(&self) -> Result<Vec<Vec<u8>>> {
        self.topics
            .iter()
            .enumerate()
            .map(|(i, topic)| decode_hex(topic, &format!("topics[{}]", i)))
            .collect()
    }

    pub(crate) fn data_bytes(&self) -> Result<Vec<u8>> {
        decode_hex(&self.data, "data")
    }
}

/// Topics and data of a pre-grouped receipt event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// An entry of a receipt's pre-grouped `events` map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub address: String,
    pub raw: RawLog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl From<EventLog> for Log {
    fn from(event: EventLog) -> Self {
        Log {
            address: event.address,
            topics: event.raw.topics,
            data: event.raw.data,
            block_number: event.block_number,
            transaction_hash: event.transaction_hash,
            log_index: event.log_index,
        }
    }
}

/// A single entry or a list of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Result of a submitted transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Set for deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
    /// Logs already grouped by event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, OneOrMany<EventLog>>>,
}

impl TransactionReceipt {
    /// All logs of the receipt, from the grouped map when present
    pub fn all_logs(&self) -> Vec<Log> {
        match &self.events {
            Some(events) => events
                .values()
                .cloned()
                .flat_map(OneOrMany::into_vec)
                .map(Log::from)
                .collect(),
            None => self.logs.clone(),
        }
    }
}
