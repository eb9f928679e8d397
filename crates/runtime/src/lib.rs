//! Runtime for generated contract bindings
//!
//! Generated code wraps a [`Contract`] and converts between typed values and
//! the dynamic [`AbiValue`] tree. Everything network-related is delegated to
//! a [`Transport`].

pub mod batch;
pub mod contract;
pub mod events;
pub mod options;
pub mod receipt;
pub mod transport;

pub use batch::BatchRequest;
pub use contract::{Contract, MethodOutput};
pub use events::{Event, TopicTable};
pub use options::{DeployOptions, TransactionOptions};
pub use receipt::{EventLog, Log, OneOrMany, RawLog, TransactionReceipt};
pub use transport::{CallRequest, LogFilter, Transport};

pub use ethbind_abi::{
    output, AbiValue, BigInt, FromAbiValue, IntoAbiValue, Libraries, LinkReferences, Numeric,
    Record,
};
pub use ethbind_common::{Error, Result};
