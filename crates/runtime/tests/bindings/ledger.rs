//! Bindings for the `Ledger` contract
//!
//! Generated by ethbind from the contract ABI. Regenerate instead of editing.

#[allow(unused_imports)]
use ethbind_runtime::{
    output, AbiValue, BatchRequest, BigInt, Contract, DeployOptions, Error, Event, FromAbiValue,
    IntoAbiValue, Log, Numeric, Record, Result, TransactionOptions, TransactionReceipt, Transport,
};

/// Contract ABI as JSON
pub const ABI: &str = r#"[{"inputs":[{"components":[{"name":"left","type":"uint256"},{"name":"right","type":"address"}],"internalType":"struct Ledger.Pair","name":"pair","type":"tuple"}],"name":"setPair","outputs":[],"stateMutability":"nonpayable","type":"function"},{"inputs":[],"name":"getPair","outputs":[{"components":[{"name":"left","type":"uint256"},{"name":"right","type":"address"}],"internalType":"struct Ledger.Pair","name":"pair","type":"tuple"}],"stateMutability":"view","type":"function"},{"inputs":[],"name":"ping","outputs":[],"stateMutability":"view","type":"function"},{"inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"name":"transfer","outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable","type":"function"},{"inputs":[],"name":"transferCall","outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"},{"inputs":[],"name":"totals","outputs":[{"name":"supply","type":"uint256"},{"name":"held","type":"uint256"}],"stateMutability":"view","type":"function"},{"anonymous":false,"inputs":[{"indexed":true,"name":"from","type":"address"},{"indexed":false,"name":"amount","type":"uint256"}],"name":"Moved","type":"event"}]"#;

/// `Pair` tuple
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub left: Numeric,
    pub right: String,
}

impl IntoAbiValue for Pair {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Record(
            Record::new()
                .with("left", self.left)
                .with("right", self.right)
        )
    }
}

impl FromAbiValue for Pair {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        let mut record = Record::from_abi_value(value, path)?;
        Ok(Self {
            left: record.take("left", path)?,
            right: record.take("right", path)?,
        })
    }
}

/// `Pair` tuple
#[derive(Debug, Clone, PartialEq)]
pub struct PairOutput {
    pub left: BigInt,
    pub right: String,
}

impl IntoAbiValue for PairOutput {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Record(
            Record::new()
                .with("left", self.left)
                .with("right", self.right)
        )
    }
}

impl FromAbiValue for PairOutput {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        let mut record = Record::from_abi_value(value, path)?;
        Ok(Self {
            left: record.take("left", path)?,
            right: record.take("right", path)?,
        })
    }
}

/// `TotalsOutput` tuple
#[derive(Debug, Clone, PartialEq)]
pub struct TotalsOutput {
    pub supply: BigInt,
    pub held: BigInt,
}

impl IntoAbiValue for TotalsOutput {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Record(
            Record::new()
                .with("supply", self.supply)
                .with("held", self.held)
        )
    }
}

impl FromAbiValue for TotalsOutput {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        let mut record = Record::from_abi_value(value, path)?;
        Ok(Self {
            supply: record.take("supply", path)?,
            held: record.take("held", path)?,
        })
    }
}

/// Arguments of `transfer(address,uint256)`
#[derive(Debug, Clone, PartialEq)]
pub struct TransferParams {
    pub to: String,
    pub amount: Numeric,
}

impl TransferParams {
    /// Argument values in declaration order
    pub fn into_values(self) -> Vec<AbiValue> {
        vec![
            self.to.into_abi_value(),
            self.amount.into_abi_value(),
        ]
    }
}

/// Typed bindings for the `Ledger` contract
pub struct Ledger<T: Transport> {
    contract: Contract<T>,
}

impl<T: Transport> Ledger<T> {
    /// Create bindings, bound to `address` when given
    pub fn new(transport: T, address: Option<String>) -> Result<Self> {
        let contract = Contract::new(transport, ABI)?;
        let contract = match address {
            Some(address) => contract.at(address),
            None => contract,
        };
        Ok(Self { contract })
    }

    pub fn address(&self) -> Option<&str> {
        self.contract.address()
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.contract.set_address(address);
    }

    /// Untyped runtime contract
    pub fn contract(&self) -> &Contract<T> {
        &self.contract
    }

    /// Sends `setPair((uint256,address))` and returns the receipt
    pub async fn set_pair(&self, pair: Pair, options: Option<TransactionOptions>) -> Result<TransactionReceipt> {
        self.contract.send("setPair((uint256,address))", vec![pair.into_abi_value()], options).await
    }

    /// Simulates `setPair((uint256,address))` without submitting it
    pub async fn set_pair_call(&self, pair: Pair, options: Option<TransactionOptions>) -> Result<()> {
        self.contract.call("setPair((uint256,address))", vec![pair.into_abi_value()], options).await?;
        Ok(())
    }

    /// Call data for `setPair((uint256,address))`
    pub fn set_pair_tx_data(&self, pair: Pair) -> Result<String> {
        self.contract.tx_data("setPair((uint256,address))", vec![pair.into_abi_value()])
    }

    /// Calls `getPair()`
    pub async fn get_pair(&self, options: Option<TransactionOptions>) -> Result<PairOutput> {
        let value = self.contract.call("getPair()", Vec::new(), options).await?;
        output(value, "getPair")
    }

    /// Calls `ping()`
    pub async fn ping(&self, options: Option<TransactionOptions>) -> Result<()> {
        self.contract.call("ping()", Vec::new(), options).await?;
        Ok(())
    }

    /// Sends `transfer(address,uint256)` and returns the receipt
    pub async fn transfer(&self, params: TransferParams, options: Option<TransactionOptions>) -> Result<TransactionReceipt> {
        self.contract.send("transfer(address,uint256)", params.into_values(), options).await
    }

    /// Simulates `transfer(address,uint256)` without submitting it
    pub async fn transfer_call(&self, params: TransferParams, options: Option<TransactionOptions>) -> Result<bool> {
        let value = self.contract.call("transfer(address,uint256)", params.into_values(), options).await?;
        output(value, "transfer")
    }

    /// Call data for `transfer(address,uint256)`
    pub fn transfer_tx_data(&self, params: TransferParams) -> Result<String> {
        self.contract.tx_data("transfer(address,uint256)", params.into_values())
    }

    /// Calls `transferCall()`
    pub async fn transfer_call_1(&self, options: Option<TransactionOptions>) -> Result<BigInt> {
        let value = self.contract.call("transferCall()", Vec::new(), options).await?;
        output(value, "transferCall")
    }

    /// Calls `totals()`
    pub async fn totals(&self, options: Option<TransactionOptions>) -> Result<TotalsOutput> {
        let value = self.contract.call("totals()", Vec::new(), options).await?;
        output(value, "totals")
    }

    /// Decode `Moved` events emitted by this contract in `receipt`
    pub fn parse_moved_event(&self, receipt: &TransactionReceipt) -> Result<Vec<events::MovedEvent>> {
        self.contract
            .parse_events(receipt, "Moved(address,uint256)")?
            .into_iter()
            .map(events::MovedEvent::from_event)
            .collect()
    }

    /// Decode one located `Moved` log
    pub fn decode_moved_event(&self, log: &Log) -> Result<events::MovedEvent> {
        let item = self
            .contract
            .abi()
            .event("Moved(address,uint256)")
            .ok_or_else(|| Error::unknown_item("Moved"))?;
        events::MovedEvent::from_event(self.contract.decode(item, log)?)
    }
}

/// Decoded event records
pub mod events {
    use super::*;

    /// `event Moved(address indexed from, uint256 amount)`
    #[derive(Debug, Clone, PartialEq)]
    pub struct MovedEvent {
        pub from: String,
        pub amount: BigInt,
        /// Originating log and its metadata
        pub event: Event,
    }

    impl MovedEvent {
        pub fn from_event(mut event: Event) -> Result<Self> {
            let mut data = std::mem::take(&mut event.data);
            Ok(Self {
                from: data.take("from", "Moved")?,
                amount: data.take("amount", "Moved")?,
                event,
            })
        }
    }
}
