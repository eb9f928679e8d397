//! Dynamic ABI values
//!
//! [`AbiValue`] is the loosely-typed tree passed into the encoder and produced
//! by the decoder. Generated bindings convert their typed fields to and from
//! it through [`IntoAbiValue`] and [`FromAbiValue`].

use ethabi::Address;
use ethbind_common::{Error, Result};
use num_bigint::BigInt;

use crate::signature::{keccak256, to_hex};

/// A dynamic ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    /// Text; also accepted on input for addresses and byte strings
    String(String),
    Bytes(Vec<u8>),
    /// Any integer, always arbitrary precision
    Number(BigInt),
    Array(Vec<AbiValue>),
    Record(Record),
}

impl AbiValue {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::String(_) => "string",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::Number(_) => "number",
            AbiValue::Array(_) => "array",
            AbiValue::Record(_) => "record",
        }
    }
}

/// Ordered record with named fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, AbiValue)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, keeping first-insertion order
    pub fn insert<K: Into<String>>(&mut self, key: K, value: AbiValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with<K: Into<String>>(mut self, key: K, value: impl IntoAbiValue) -> Self {
        self.insert(key, value.into_abi_value());
        self
    }

    pub fn get(&self, key: &str) -> Option<&AbiValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<AbiValue> {
        let index = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(index).1)
    }

    /// Remove a field and convert it; `path` names the record for errors
    pub fn take<T: FromAbiValue>(&mut self, key: &str, path: &str) -> Result<T> {
        let field_path = format!("{}.{}", path, key);
        let value = self
            .remove(key)
            .ok_or_else(|| Error::decoding(&field_path, "missing field"))?;
        T::from_abi_value(value, &field_path)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AbiValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AbiValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, AbiValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Input integer: a native number or an arbitrary-precision one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numeric {
    Native(i128),
    Big(BigInt),
}

impl Numeric {
    pub fn to_bigint(&self) -> BigInt {
        match self {
            Numeric::Native(n) => BigInt::from(*n),
            Numeric::Big(n) => n.clone(),
        }
    }
}

macro_rules! numeric_from_native {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Numeric {
                fn from(value: $t) -> Self {
                    Numeric::Native(value as i128)
                }
            }

            impl IntoAbiValue for $t {
                fn into_abi_value(self) -> AbiValue {
                    AbiValue::Number(BigInt::from(self))
                }
            }
        )*
    };
}

numeric_from_native!(u8, u16, u32, u64, i8, i16, i32, i64, i128);

impl From<u128> for Numeric {
    fn from(value: u128) -> Self {
        Numeric::Big(BigInt::from(value))
    }
}

impl From<BigInt> for Numeric {
    fn from(value: BigInt) -> Self {
        Numeric::Big(value)
    }
}

impl From<ethabi::Uint> for Numeric {
    fn from(value: ethabi::Uint) -> Self {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        Numeric::Big(BigInt::from_bytes_be(num_bigint::Sign::Plus, &buf))
    }
}

/// EIP-55 mixed-case checksum rendering of an address
pub fn to_checksum_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Conversion of a typed value into the dynamic tree
pub trait IntoAbiValue {
    fn into_abi_value(self) -> AbiValue;
}

/// Conversion out of the dynamic tree; `path` locates the value for errors
pub trait FromAbiValue: Sized {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self>;
}

fn mismatch(path: &str, expected: &str, value: &AbiValue) -> Error {
    Error::decoding(path, format!("expected {}, found {}", expected, value.kind()))
}

impl IntoAbiValue for AbiValue {
    fn into_abi_value(self) -> AbiValue {
        self
    }
}

impl IntoAbiValue for String {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::String(self)
    }
}

impl IntoAbiValue for &str {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::String(self.to_string())
    }
}

impl IntoAbiValue for bool {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Bool(self)
    }
}

impl IntoAbiValue for Numeric {
    fn into_abi_value(self) -> AbiValue {
        match self {
            Numeric::Native(n) => AbiValue::Number(BigInt::from(n)),
            Numeric::Big(n) => AbiValue::Number(n),
        }
    }
}

impl IntoAbiValue for BigInt {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Number(self)
    }
}

impl IntoAbiValue for Address {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Address(self)
    }
}

impl IntoAbiValue for Record {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Record(self)
    }
}

impl<T: IntoAbiValue> IntoAbiValue for Vec<T> {
    fn into_abi_value(self) -> AbiValue {
        AbiValue::Array(self.into_iter().map(IntoAbiValue::into_abi_value).collect())
    }
}

impl FromAbiValue for AbiValue {
    fn from_abi_value(value: AbiValue, _path: &str) -> Result<Self> {
        Ok(value)
    }
}

impl FromAbiValue for String {
    /// Addresses render checksummed, byte strings as `0x` hex
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        match value {
            AbiValue::String(s) => Ok(s),
            AbiValue::Address(address) => Ok(to_checksum_address(&address)),
            AbiValue::Bytes(bytes) => Ok(to_hex(bytes)),
            other => Err(mismatch(path, "string", &other)),
        }
    }
}

impl FromAbiValue for bool {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        match value {
            AbiValue::Bool(b) => Ok(b),
            other => Err(mismatch(path, "bool", &other)),
        }
    }
}

impl FromAbiValue for BigInt {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        match value {
            AbiValue::Number(n) => Ok(n),
            other => Err(mismatch(path, "number", &other)),
        }
    }
}

impl FromAbiValue for Numeric {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        BigInt::from_abi_value(value, path).map(Numeric::Big)
    }
}

impl FromAbiValue for Record {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        match value {
            AbiValue::Record(record) => Ok(record),
            other => Err(mismatch(path, "record", &other)),
        }
    }
}

impl<T: FromAbiValue> FromAbiValue for Vec<T> {
    fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {
        match value {
            AbiValue::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_abi_value(item, &format!("{}[{}]", path, i)))
                .collect(),
            other => Err(mismatch(path, "array", &other)),
        }
    }
}

/// Convert an optional call result into a typed output
///
/// Used by generated accessors: a missing value is a decoding error for `method`.
pub fn output<T: FromAbiValue>(value: Option<AbiValue>, method: &str) -> Result<T> {
    let value = value.ok_or_else(|| Error::decoding(method, "call returned no value"))?;
    T::from_abi_value(value, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_address() {
        let address =
            Address::from_slice(&hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap());
        assert_eq!(
            to_checksum_address(&address),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_record_take_reports_field_path() {
        let mut record = Record::new().with("amount", 10u64);
        let err = record.take::<bool>("amount", "Deposit").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to decode `Deposit.amount`: expected bool, found number"
        );

        let err = record.take::<BigInt>("missing", "Deposit").unwrap_err();
        assert!(err.to_string().contains("Deposit.missing"));
    }

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut record = Record::new().with("b", true).with("a", "x");
        record.insert("b", AbiValue::Bool(false));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&AbiValue::Bool(false)));
    }

    #[test]
    fn test_vec_conversion_paths() {
        let value = AbiValue::Array(vec![AbiValue::Number(BigInt::from(1)), AbiValue::Bool(true)]);
        let err = Vec::<BigInt>::from_abi_value(value, "shares").unwrap_err();
        assert!(err.to_string().contains("shares[1]"));
    }

    #[test]
    fn test_numeric_inputs_convert_to_numbers() {
        assert_eq!(
            Numeric::from(5u64).into_abi_value(),
            AbiValue::Number(BigInt::from(5))
        );
        let big = BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        assert_eq!(
            Numeric::from(big.clone()).into_abi_value(),
            AbiValue::Number(big)
        );
        assert_eq!(Numeric::from(ethabi::Uint::from(7u64)).to_bigint(), BigInt::from(7));
    }

    #[test]
    fn test_output_requires_value() {
        assert!(output::<BigInt>(None, "totalSupply").is_err());
        assert_eq!(
            output::<BigInt>(Some(AbiValue::Number(BigInt::from(3))), "totalSupply").unwrap(),
            BigInt::from(3)
        );
    }
}
