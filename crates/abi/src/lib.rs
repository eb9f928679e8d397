//! ABI handling shared by binding generation and the contract runtime
//!
//! Both sides go through the same type tree, signature rules and codec, so
//! generated code and runtime decoding agree on how every type is handled.

pub mod codec;
pub mod link;
pub mod mapper;
pub mod parser;
pub mod signature;
pub mod types;
pub mod value;

pub use codec::{decode_log, decode_output, decode_params, encode_call, encode_params};
pub use link::{link_bytecode, Libraries, LinkReferences, Offset};
pub use mapper::{map_param, map_type, Position, RecordShape, TypeExpr};
pub use parser::{Abi, AbiItem, AbiParser, Artifact, ItemKind, StateMutability};
pub use signature::{selector, signature, to_hex, topic};
pub use types::{param_name, AbiType, Param};
pub use value::{
    output, to_checksum_address, AbiValue, FromAbiValue, IntoAbiValue, Numeric, Record,
};

pub use ethabi::Address;
pub use num_bigint::BigInt;
