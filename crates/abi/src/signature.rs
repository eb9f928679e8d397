//! Canonical signatures, function selectors and event topics

use std::fmt;

use sha3::{Digest, Keccak256};

use crate::types::{AbiType, Param};

impl fmt::Display for AbiType {
    /// Canonical rendering used as hash input: tuples expand to their components
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Address => f.write_str("address"),
            AbiType::Bool => f.write_str("bool"),
            AbiType::String => f.write_str("string"),
            AbiType::Bytes => f.write_str("bytes"),
            AbiType::FixedBytes(len) => write!(f, "bytes{}", len),
            AbiType::Uint(bits) => write!(f, "uint{}", bits),
            AbiType::Int(bits) => write!(f, "int{}", bits),
            AbiType::Tuple(components) => {
                f.write_str("(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", component.ty)?;
                }
                f.write_str(")")
            }
            AbiType::Array(inner, Some(size)) => write!(f, "{}[{}]", inner, size),
            AbiType::Array(inner, None) => write!(f, "{}[]", inner),
        }
    }
}

/// Canonical type string, e.g. `(uint256,address)[]`
pub fn canonical_type(ty: &AbiType) -> String {
    ty.to_string()
}

/// Canonical signature `name(type1,type2,...)`
pub fn signature(name: &str, inputs: &[Param]) -> String {
    let types: Vec<String> = inputs.iter().map(|param| canonical_type(&param.ty)).collect();
    format!("{}({})", name, types.join(","))
}

/// Keccak-256 digest
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// 4-byte function selector of a canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// 32-byte event topic of a canonical signature
pub fn topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// `0x`-prefixed lowercase hex
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Selector of `name(inputs)` as `0x`-prefixed hex
pub fn selector_hex(name: &str, inputs: &[Param]) -> String {
    to_hex(selector(&signature(name, inputs)))
}

/// Topic of `name(inputs)` as `0x`-prefixed hex
pub fn topic_hex(name: &str, inputs: &[Param]) -> String {
    to_hex(topic(&signature(name, inputs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn transfer_inputs() -> Vec<Param> {
        vec![
            Param::new("to", AbiType::Address),
            Param::new("amount", AbiType::Uint(256)),
        ]
    }

    #[test]
    fn test_flat_signature() {
        assert_eq!(
            signature("name", &transfer_inputs()),
            "name(address,uint256)"
        );
        let inputs = vec![
            Param::new("", AbiType::Uint(256)),
            Param::new("", AbiType::Address),
        ];
        assert_eq!(signature("name", &inputs), "name(uint256,address)");
    }

    #[test]
    fn test_tuple_signature_expands_components() {
        let t = Param::new(
            "t",
            AbiType::Tuple(vec![
                Param::new("a", AbiType::Uint(256)),
                Param::new("b", AbiType::Address),
            ]),
        );
        assert_eq!(signature("name", &[t]), "name((uint256,address))");
    }

    #[test]
    fn test_nested_tuple_array_signature() {
        let inner = AbiType::Tuple(vec![
            Param::new("addr", AbiType::Address),
            Param::new("share", AbiType::Uint(16)),
        ]);
        let outer = AbiType::Tuple(vec![
            Param::new("amount", AbiType::Uint(256)),
            Param::new(
                "recipients",
                AbiType::Array(Box::new(inner), None),
            ),
        ]);
        let param = Param::new(
            "plan",
            AbiType::Array(Box::new(AbiType::Array(Box::new(outer), Some(2))), None),
        );
        assert_eq!(
            signature("submit", &[param]),
            "submit((uint256,(address,uint16)[])[2][])"
        );
    }

    #[test]
    fn test_known_selector_and_topic() {
        assert_eq!(
            selector_hex("transfer", &transfer_inputs()),
            "0xa9059cbb"
        );
        let event_inputs = vec![
            Param::new("from", AbiType::Address).indexed(),
            Param::new("to", AbiType::Address).indexed(),
            Param::new("value", AbiType::Uint(256)),
        ];
        assert_eq!(
            topic_hex("Transfer", &event_inputs),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_hashing_is_deterministic_and_distinct() {
        let signatures = [
            "transfer(address,uint256)",
            "transferFrom(address,address,uint256)",
            "approve(address,uint256)",
            "balanceOf(address)",
            "allowance(address,address)",
            "totalSupply()",
            "Transfer(address,address,uint256)",
            "Approval(address,address,uint256)",
            "submit((uint256,(address,uint16)[])[2][])",
        ];
        let topics: HashSet<[u8; 32]> = signatures.iter().map(|s| topic(s)).collect();
        assert_eq!(topics.len(), signatures.len());
        for sig in signatures {
            assert_eq!(selector(sig), selector(sig));
        }
    }
}
