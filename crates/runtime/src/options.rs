//! Call and deployment options

use ethbind_abi::{BigInt, Libraries, Numeric};
use serde::{Deserialize, Serialize};

/// Options for a call or transaction
///
/// Unset fields are left to the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal")]
    pub gas_price: Option<BigInt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal")]
    pub value: Option<BigInt>,
}

impl TransactionOptions {
    pub fn from_address(from: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            ..Default::default()
        }
    }

    /// Attach a transferred value, as payable accessors do
    pub fn with_value(options: Option<TransactionOptions>, value: Numeric) -> TransactionOptions {
        let mut options = options.unwrap_or_default();
        options.value = Some(value.to_bigint());
        options
    }
}

/// Options for a deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    #[serde(flatten)]
    pub options: TransactionOptions,
    /// `file -> contract -> address` for linked libraries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Libraries>,
}

impl DeployOptions {
    pub fn with_libraries(libraries: Libraries) -> Self {
        Self {
            options: TransactionOptions::default(),
            libraries: Some(libraries),
        }
    }
}

impl From<TransactionOptions> for DeployOptions {
    fn from(options: TransactionOptions) -> Self {
        Self {
            options,
            libraries: None,
        }
    }
}

/// `Option<BigInt>` as a decimal string
mod decimal {
    use ethbind_abi::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<BigInt>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BigInt>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| s.parse::<BigInt>().map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_options_are_omitted() {
        let options = TransactionOptions {
            gas_limit: Some(21_000),
            value: Some(BigInt::from(5)),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({"gasLimit": 21000, "value": "5"}));

        let parsed: TransactionOptions = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_with_value_keeps_other_options() {
        let options = TransactionOptions::with_value(
            Some(TransactionOptions::from_address("0xabc")),
            Numeric::from(7u64),
        );
        assert_eq!(options.from.as_deref(), Some("0xabc"));
        assert_eq!(options.value, Some(BigInt::from(7)));
    }

    #[test]
    fn test_deploy_options_flatten_transaction_fields() {
        let json = serde_json::json!({
            "from": "0xabc",
            "libraries": {"lib/Math.sol": {"Math": "0x1111111111111111111111111111111111111111"}}
        });
        let options: DeployOptions = serde_json::from_value(json).unwrap();
        assert_eq!(options.options.from.as_deref(), Some("0xabc"));
        assert!(options.libraries.unwrap().contains_key("lib/Math.sol"));
    }
}
