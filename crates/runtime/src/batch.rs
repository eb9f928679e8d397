//! Batched read-only calls

use std::collections::BTreeMap;

use ethbind_abi::{decode_output, AbiItem, AbiValue};
use tracing::{debug, warn};

use crate::transport::{CallRequest, Transport};

struct PendingCall {
    key: String,
    item: AbiItem,
    request: CallRequest,
}

/// Calls queued by `*_batch_call` accessors, executed together
#[derive(Default)]
pub struct BatchRequest {
    pending: Vec<PendingCall>,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an encoded call under `key`; a later entry with the same key replaces the result
    pub fn enqueue(&mut self, key: impl Into<String>, item: AbiItem, request: CallRequest) {
        self.pending.push(PendingCall {
            key: key.into(),
            item,
            request,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every queued call through `transport` and decode the answers
    ///
    /// An entry whose call or decoding fails maps to `None`, as does a call
    /// without outputs.
    pub async fn execute<T: Transport + ?Sized>(
        self,
        transport: &T,
    ) -> BTreeMap<String, Option<AbiValue>> {
        debug!("Executing batch of {} call(s)", self.pending.len());
        let (meta, requests): (Vec<_>, Vec<_>) = self
            .pending
            .into_iter()
            .map(|call| ((call.key, call.item), call.request))
            .unzip();

        let responses = transport.call_batch(requests).await;

        let mut results = BTreeMap::new();
        for ((key, item), response) in meta.into_iter().zip(responses) {
            let value = match response {
                Ok(data) => match decode_output(&item, &data) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!("Batch entry `{}` failed to decode: {}", key, e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Batch entry `{}` failed: {}", key, e);
                    None
                }
            };
            results.insert(key, value);
        }
        results
    }
}
