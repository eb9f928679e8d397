//! Event topic table and decoded events

use std::collections::HashMap;

use ethbind_abi::{Abi, AbiItem, Record};
use tracing::debug;

use crate::receipt::Log;

/// A decoded event log
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name from the ABI
    pub name: String,
    /// Emitting contract
    pub address: String,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<String>,
    pub log_index: Option<u64>,
    /// Decoded parameters keyed by name (or `paramK`)
    pub data: Record,
    /// The log the event was decoded from
    pub raw: Log,
}

/// Lookup from signature topic to event item
///
/// Anonymous events carry no signature topic and are not entered.
#[derive(Debug, Clone, Default)]
pub struct TopicTable {
    by_topic: HashMap<String, AbiItem>,
    /// Every overload's topic per event name, in ABI order
    by_name: HashMap<String, Vec<String>>,
}

impl TopicTable {
    /// Build the table from the events of `abi`
    pub fn build(abi: &Abi) -> Self {
        let mut table = TopicTable::default();
        for event in abi.events().filter(|event| !event.anonymous) {
            let topic = event.topic();
            table
                .by_name
                .entry(event.name.clone())
                .or_default()
                .push(topic.clone());
            table.by_topic.insert(topic, event.clone());
        }
        debug!("Built topic table with {} event(s)", table.by_topic.len());
        table
    }

    /// Event item for a topic, case-insensitive
    pub fn get(&self, topic: &str) -> Option<&AbiItem> {
        self.by_topic.get(&topic.to_ascii_lowercase())
    }

    /// Topics of every overload of the named event
    pub fn topics_of(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Topics for the requested names, or every topic when no names are given
    ///
    /// Unknown names are dropped, so a request naming only unknown events
    /// resolves to no topics at all.
    pub fn resolve(&self, names: Option<&[&str]>) -> Vec<String> {
        match names {
            Some(names) if !names.is_empty() => names
                .iter()
                .flat_map(|name| self.topics_of(name))
                .cloned()
                .collect(),
            _ => {
                let mut topics: Vec<String> = self.by_topic.keys().cloned().collect();
                topics.sort();
                topics
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}
