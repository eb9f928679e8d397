//! Live contract instance
//!
//! A [`Contract`] owns the parsed ABI, optional deployment data and the bound
//! address. Reads, writes and deployments go through the transport; encoding
//! and decoding happen locally, so malformed arguments fail before any request
//! is made.

use std::sync::OnceLock;

use ethbind_abi::{
    decode_log, decode_output, encode_call, encode_params, link_bytecode, to_hex, Abi, AbiItem,
    AbiParser, AbiValue, LinkReferences, Numeric,
};
use ethbind_common::{Error, Result};
use tracing::{debug, info};

use crate::batch::BatchRequest;
use crate::events::{Event, TopicTable};
use crate::options::{DeployOptions, TransactionOptions};
use crate::receipt::{Log, TransactionReceipt};
use crate::transport::{CallRequest, LogFilter, Transport};

/// Result of [`Contract::invoke`]
#[derive(Debug, Clone, PartialEq)]
pub enum MethodOutput {
    /// Decoded return value of a read-only call
    Value(Option<AbiValue>),
    /// Receipt of a submitted transaction
    Receipt(TransactionReceipt),
}

/// A contract bound to a transport
pub struct Contract<T> {
    transport: T,
    abi: Abi,
    bytecode: Option<String>,
    link_references: LinkReferences,
    address: Option<String>,
    topics: OnceLock<TopicTable>,
}

impl<T: Transport> Contract<T> {
    /// Create a contract from ABI JSON
    pub fn new(transport: T, abi_json: &str) -> Result<Self> {
        let abi = AbiParser::new().parse_content(abi_json)?;
        Ok(Self::from_abi(transport, abi))
    }

    /// Create a contract from a parsed ABI
    pub fn from_abi(transport: T, abi: Abi) -> Self {
        Self {
            transport,
            abi,
            bytecode: None,
            link_references: LinkReferences::new(),
            address: None,
            topics: OnceLock::new(),
        }
    }

    /// Attach creation bytecode
    pub fn with_bytecode(mut self, bytecode: impl Into<String>) -> Self {
        self.bytecode = Some(bytecode.into());
        self
    }

    /// Attach library link references
    pub fn with_link_references(mut self, link_references: LinkReferences) -> Self {
        self.link_references = link_references;
        self
    }

    /// Attach library link references given as JSON
    pub fn with_link_references_json(self, json: &str) -> Result<Self> {
        let link_references = serde_json::from_str(json)?;
        Ok(self.with_link_references(link_references))
    }

    /// Bind to an on-chain address
    pub fn at(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = Some(address.into());
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Topic table, built on first use
    pub fn topics(&self) -> &TopicTable {
        self.topics.get_or_init(|| TopicTable::build(&self.abi))
    }

    /// Find a function by signature, or by name and argument count
    pub fn function(&self, method: &str, arity: usize) -> Result<&AbiItem> {
        self.abi
            .function(method, Some(arity))
            .ok_or_else(|| Error::unknown_item(format!("{} with {} argument(s)", method, arity)))
    }

    fn request(
        &self,
        item: &AbiItem,
        params: &[AbiValue],
        options: Option<TransactionOptions>,
    ) -> Result<CallRequest> {
        let data = encode_call(item, params)?;
        let options = options.unwrap_or_default();
        let to = options
            .to
            .clone()
            .or_else(|| self.address.clone())
            .ok_or(Error::MissingAddress)?;
        Ok(CallRequest {
            to: Some(to),
            data: to_hex(data),
            options,
        })
    }

    /// Read-only invocation
    ///
    /// Returns `None` for functions without outputs, the bare value for a
    /// single output and a record for several.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<AbiValue>,
        options: Option<TransactionOptions>,
    ) -> Result<Option<AbiValue>> {
        let item = self.function(method, params.len())?;
        let request = self.request(item, &params, options)?;
        debug!("Calling {}", item.signature());
        let data = self.transport.call(request).await.map_err(Error::transport)?;
        decode_output(item, &data)
    }

    /// Submit a state-changing transaction
    pub async fn send(
        &self,
        method: &str,
        params: Vec<AbiValue>,
        options: Option<TransactionOptions>,
    ) -> Result<TransactionReceipt> {
        let item = self.function(method, params.len())?;
        let request = self.request(item, &params, options)?;
        debug!("Sending {}", item.signature());
        self.transport.send(request).await.map_err(Error::transport)
    }

    /// Hex call data for an invocation, without submitting it
    pub fn tx_data(&self, method: &str, params: Vec<AbiValue>) -> Result<String> {
        let item = self.function(method, params.len())?;
        Ok(to_hex(encode_call(item, &params)?))
    }

    /// Queue a read-only invocation on `batch` under `key`
    pub fn batch_call(
        &self,
        batch: &mut BatchRequest,
        key: &str,
        method: &str,
        params: Vec<AbiValue>,
        options: Option<TransactionOptions>,
    ) -> Result<()> {
        let item = self.function(method, params.len())?;
        let request = self.request(item, &params, options)?;
        batch.enqueue(key, item.clone(), request);
        Ok(())
    }

    /// Dispatch by mutability
    ///
    /// Read-only functions are called, others are sent. For payable functions
    /// the trailing argument is the transferred value.
    pub async fn invoke(
        &self,
        method: &str,
        mut params: Vec<AbiValue>,
        options: Option<TransactionOptions>,
    ) -> Result<MethodOutput> {
        let item = self.dispatch_target(method, params.len())?;
        let signature = item.signature();
        if item.is_read_only() {
            return self.call(&signature, params, options).await.map(MethodOutput::Value);
        }

        let options = if item.is_payable() {
            let value = match params.pop() {
                Some(AbiValue::Number(n)) => Numeric::Big(n),
                _ => {
                    return Err(Error::encoding(
                        format!("{}.value", item.name),
                        "payable invocation needs a numeric value as its last argument",
                    ))
                }
            };
            Some(TransactionOptions::with_value(options, value))
        } else {
            options
        };
        self.send(&signature, params, options).await.map(MethodOutput::Receipt)
    }

    fn dispatch_target(&self, method: &str, arg_count: usize) -> Result<&AbiItem> {
        let found = if method.contains('(') {
            self.abi.function(method, None)
        } else {
            self.abi.functions().find(|item| {
                item.name == method && item.inputs.len() + usize::from(item.is_payable()) == arg_count
            })
        };
        found.ok_or_else(|| Error::unknown_item(method))
    }

    /// Deploy the attached bytecode and bind the new address
    ///
    /// Library links are resolved first; a missing library address fails
    /// before anything is submitted.
    pub async fn deploy(
        &mut self,
        params: Vec<AbiValue>,
        options: Option<DeployOptions>,
    ) -> Result<String> {
        let bytecode = self.bytecode.as_deref().ok_or(Error::MissingBytecode)?;
        let options = options.unwrap_or_default();
        let linked = link_bytecode(bytecode, &self.link_references, options.libraries.as_ref())?;

        let args = match self.abi.constructor() {
            Some(constructor) => encode_params(&constructor.inputs, &params, "constructor")?,
            None if params.is_empty() => Vec::new(),
            None => {
                return Err(Error::encoding(
                    "constructor",
                    "ABI declares no constructor but arguments were given",
                ))
            }
        };

        let code = linked.strip_prefix("0x").unwrap_or(&linked);
        let request = CallRequest {
            to: None,
            data: format!("0x{}{}", code, hex::encode(args)),
            options: options.options,
        };

        let receipt = self.transport.send(request).await.map_err(Error::transport)?;
        let address = receipt
            .contract_address
            .ok_or_else(|| Error::Deployment("receipt carries no contract address".to_string()))?;
        info!("Deployed contract at {}", address);
        self.address = Some(address.clone());
        Ok(address)
    }

    /// Fetch and decode events in a block range
    ///
    /// With no names every event of the ABI is scanned. When names are given
    /// but none exists in the ABI, the result is empty and no logs are fetched.
    pub async fn scan_events(
        &self,
        from_block: u64,
        to_block: u64,
        event_names: Option<&[&str]>,
    ) -> Result<Vec<Event>> {
        let topics = self.topics().resolve(event_names);
        if topics.is_empty() {
            debug!("No event topics to scan");
            return Ok(Vec::new());
        }

        let filter = LogFilter {
            from_block,
            to_block,
            address: self.address.clone(),
            topics,
        };
        let logs = self
            .transport
            .get_logs(filter.clone())
            .await
            .map_err(Error::transport)?;
        debug!("Scanned {} log(s) in blocks {}..={}", logs.len(), from_block, to_block);

        logs.iter()
            .filter(|log| filter.matches(log))
            .filter_map(|log| {
                let topic = log.topic0()?;
                self.topics().get(topic).map(|item| self.decode(item, log))
            })
            .collect()
    }

    fn is_own(&self, log: &Log) -> bool {
        self.address
            .as_deref()
            .map(|address| log.is_from(address))
            .unwrap_or(false)
    }

    /// Decode the receipt's logs of event `event_name` emitted by this contract
    pub fn parse_events(&self, receipt: &TransactionReceipt, event_name: &str) -> Result<Vec<Event>> {
        let item = self
            .abi
            .event(event_name)
            .ok_or_else(|| Error::unknown_item(event_name))?;
        let topic = item.topic();

        receipt
            .all_logs()
            .iter()
            .filter(|log| {
                log.topic0().map(|t| t.eq_ignore_ascii_case(&topic)).unwrap_or(false)
                    && self.is_own(log)
            })
            .map(|log| self.decode(item, log))
            .collect()
    }

    /// Decode every log of the receipt that belongs to this ABI
    ///
    /// When an address is bound, logs of other contracts are skipped.
    pub fn decode_events(&self, receipt: &TransactionReceipt) -> Result<Vec<Event>> {
        receipt
            .all_logs()
            .iter()
            .filter(|log| self.address.is_none() || self.is_own(log))
            .filter_map(|log| {
                let item = self.topics().get(log.topic0()?)?;
                Some(self.decode(item, log))
            })
            .collect()
    }

    /// Decode one log against an event item
    pub fn decode(&self, item: &AbiItem, log: &Log) -> Result<Event> {
        let topics = log.topic_bytes()?;
        let data = log.data_bytes()?;
        let record = decode_log(item, &topics, &data)?;
        Ok(Event {
            name: item.name.clone(),
            address: log.address.clone(),
            block_number: log.block_number,
            transaction_hash: log.transaction_hash.clone(),
            log_index: log.log_index,
            data: record,
            raw: log.clone(),
        })
    }
}
