//! Ethereum ABI parser
//!
//! Parses ABI JSON documents, or compiler artifacts carrying one, into the
//! closed [`AbiItem`] model shared by the generator and the runtime.

use std::fmt;

use ethbind_common::{Error, Result};
use serde_json::Value;
use tracing::debug;

use crate::link::LinkReferences;
use crate::signature;
use crate::types::{AbiType, Param};

/// Kind of an ABI item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Function,
    Event,
    Constructor,
}

/// State mutability of a function or constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "pure" => Ok(StateMutability::Pure),
            "view" => Ok(StateMutability::View),
            "nonpayable" => Ok(StateMutability::NonPayable),
            "payable" => Ok(StateMutability::Payable),
            other => Err(Error::abi(format!("unknown state mutability `{}`", other))),
        }
    }

    /// Whether calls never modify state
    pub fn is_read_only(self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        };
        f.write_str(s)
    }
}

/// One function, event or constructor entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiItem {
    /// Item name, empty for constructors
    pub name: String,
    pub kind: ItemKind,
    /// Present for functions and constructors only
    pub state_mutability: Option<StateMutability>,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    /// Events only: no signature topic is emitted
    pub anonymous: bool,
}

impl AbiItem {
    /// Canonical signature `name(type1,...)`
    pub fn signature(&self) -> String {
        signature::signature(&self.name, &self.inputs)
    }

    /// 4-byte selector of a function
    pub fn selector(&self) -> [u8; 4] {
        signature::selector(&self.signature())
    }

    /// Topic hash of an event as `0x`-prefixed hex
    pub fn topic(&self) -> String {
        signature::to_hex(signature::topic(&self.signature()))
    }

    /// Whether a function only reads state
    pub fn is_read_only(&self) -> bool {
        self.state_mutability.map(StateMutability::is_read_only).unwrap_or(false)
    }

    /// Whether a function or constructor accepts value
    pub fn is_payable(&self) -> bool {
        self.state_mutability == Some(StateMutability::Payable)
    }

    /// Human-readable declaration, e.g. `function balanceOf(address account) returns (uint256)`
    pub fn declaration(&self) -> String {
        let inputs: Vec<String> = self
            .inputs
            .iter()
            .map(|param| {
                let indexed = if param.indexed { " indexed" } else { "" };
                if param.name.is_empty() {
                    format!("{}{}", param.ty, indexed)
                } else {
                    format!("{}{} {}", param.ty, indexed, param.name)
                }
            })
            .collect();

        match self.kind {
            ItemKind::Event => format!("event {}({})", self.name, inputs.join(", ")),
            ItemKind::Constructor => format!("constructor({})", inputs.join(", ")),
            ItemKind::Function => {
                let outputs: Vec<String> =
                    self.outputs.iter().map(|param| param.ty.to_string()).collect();
                let outputs_part = if outputs.is_empty() {
                    String::new()
                } else {
                    format!(" returns ({})", outputs.join(", "))
                };
                format!("function {}({}){}", self.name, inputs.join(", "), outputs_part)
            }
        }
    }
}

/// A parsed contract ABI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abi {
    pub items: Vec<AbiItem>,
}

impl Abi {
    /// The constructor, if declared
    pub fn constructor(&self) -> Option<&AbiItem> {
        self.items.iter().find(|item| item.kind == ItemKind::Constructor)
    }

    /// Functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = &AbiItem> {
        self.items.iter().filter(|item| item.kind == ItemKind::Function)
    }

    /// Events in declaration order
    pub fn events(&self) -> impl Iterator<Item = &AbiItem> {
        self.items.iter().filter(|item| item.kind == ItemKind::Event)
    }

    /// Find a function by canonical signature, or by name and arity
    ///
    /// With a plain name the first overload taking `arity` inputs wins; when
    /// no arity is given the first function of that name is returned.
    pub fn function(&self, key: &str, arity: Option<usize>) -> Option<&AbiItem> {
        if key.contains('(') {
            return self.functions().find(|item| item.signature() == key);
        }
        let mut candidates = self.functions().filter(|item| item.name == key);
        match arity {
            Some(arity) => candidates.find(|item| item.inputs.len() == arity),
            None => candidates.next(),
        }
    }

    /// Find an event by canonical signature or by name
    pub fn event(&self, key: &str) -> Option<&AbiItem> {
        if key.contains('(') {
            return self.events().find(|item| item.signature() == key);
        }
        self.events().find(|item| item.name == key)
    }

    /// Whether more than one function carries `name`
    pub fn is_overloaded(&self, name: &str) -> bool {
        self.functions().filter(|item| item.name == name).count() > 1
    }
}

/// A compiler artifact: ABI plus optional deployment data
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    pub abi: Abi,
    /// ABI JSON exactly as read
    pub raw_abi: Value,
    /// Creation bytecode as hex, possibly `0x`-prefixed
    pub bytecode: Option<String>,
    pub link_references: LinkReferences,
}

/// Ethereum ABI parser
pub struct AbiParser;

impl AbiParser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self
    }

    /// Parse an ABI or artifact file
    pub fn parse_file(&self, file_path: &str) -> Result<Artifact> {
        let content = std::fs::read_to_string(file_path)?;
        self.parse_artifact(&content)
    }

    /// Parse a bare ABI array from JSON content
    pub fn parse_content(&self, content: &str) -> Result<Abi> {
        let value: Value = serde_json::from_str(content)?;
        self.parse_abi(&value)
    }

    /// Parse either a bare ABI array or an artifact object `{abi, bytecode, linkReferences}`
    pub fn parse_artifact(&self, content: &str) -> Result<Artifact> {
        let value: Value = serde_json::from_str(content)?;
        if value.is_array() {
            return Ok(Artifact {
                abi: self.parse_abi(&value)?,
                raw_abi: value,
                ..Default::default()
            });
        }

        let raw_abi = value
            .get("abi")
            .cloned()
            .ok_or_else(|| Error::abi("artifact has no `abi` field"))?;
        let abi = self.parse_abi(&raw_abi)?;

        // Hardhat stores a hex string, solc standard JSON an `{object}` wrapper
        let bytecode = match value.get("bytecode") {
            Some(Value::String(code)) => Some(code.clone()),
            Some(Value::Object(obj)) => obj.get("object").and_then(|v| v.as_str()).map(String::from),
            _ => None,
        }
        .filter(|code| !code.is_empty() && code != "0x");

        let link_references = value
            .get("linkReferences")
            .or_else(|| value.get("bytecode").and_then(|b| b.get("linkReferences")))
            .map(|refs| serde_json::from_value(refs.clone()))
            .transpose()?
            .unwrap_or_default();

        Ok(Artifact {
            abi,
            raw_abi,
            bytecode,
            link_references,
        })
    }

    /// Parse ABI from JSON value
    pub fn parse_abi(&self, value: &Value) -> Result<Abi> {
        let abi_array = value
            .as_array()
            .ok_or_else(|| Error::abi("ABI must be an array"))?;

        let mut items = Vec::new();
        let mut has_constructor = false;

        for item in abi_array {
            let item_type = item
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("function");

            match item_type {
                "function" => items.push(self.parse_function(item, ItemKind::Function)?),
                "constructor" => {
                    if has_constructor {
                        return Err(Error::abi("ABI declares more than one constructor"));
                    }
                    has_constructor = true;
                    items.push(self.parse_function(item, ItemKind::Constructor)?);
                }
                "event" => items.push(self.parse_event(item)?),
                other => {
                    debug!("Skipping ABI item of type `{}`", other);
                }
            }
        }

        Ok(Abi { items })
    }

    /// Parse a function or constructor from ABI
    fn parse_function(&self, value: &Value, kind: ItemKind) -> Result<AbiItem> {
        let name = match kind {
            ItemKind::Constructor => String::new(),
            _ => value
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::abi("Function must have a name"))?
                .to_string(),
        };

        let inputs = self.parse_parameter_field(value, "inputs")?;
        let outputs = self.parse_parameter_field(value, "outputs")?;

        let state_mutability = match value.get("stateMutability").and_then(|v| v.as_str()) {
            Some(mutability) => StateMutability::parse(mutability)?,
            // Legacy support
            None if value.get("constant").and_then(|v| v.as_bool()).unwrap_or(false) => {
                StateMutability::View
            }
            None if value.get("payable").and_then(|v| v.as_bool()).unwrap_or(false) => {
                StateMutability::Payable
            }
            None => StateMutability::NonPayable,
        };

        Ok(AbiItem {
            name,
            kind,
            state_mutability: Some(state_mutability),
            inputs,
            outputs,
            anonymous: false,
        })
    }

    /// Parse an event from ABI
    fn parse_event(&self, value: &Value) -> Result<AbiItem> {
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::abi("Event must have a name"))?
            .to_string();

        let inputs = self.parse_parameter_field(value, "inputs")?;

        let anonymous = value
            .get("anonymous")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(AbiItem {
            name,
            kind: ItemKind::Event,
            state_mutability: None,
            inputs,
            outputs: Vec::new(),
            anonymous,
        })
    }

    /// Parse an optional parameter list; absent lists are empty
    fn parse_parameter_field(&self, value: &Value, field: &str) -> Result<Vec<Param>> {
        value
            .get(field)
            .and_then(|v| v.as_array())
            .map(|arr| Self::parse_parameters(arr))
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Parse parameters, recursing into tuple components
    fn parse_parameters(array: &[Value]) -> Result<Vec<Param>> {
        let mut parameters = Vec::with_capacity(array.len());

        for param in array {
            let name = param
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let param_type = param
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::abi("Parameter must have a type"))?;

            let internal_type = param
                .get("internalType")
                .and_then(|v| v.as_str())
                .map(String::from);

            let indexed = param
                .get("indexed")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            let components = if param_type.starts_with("tuple") {
                param
                    .get("components")
                    .and_then(|v| v.as_array())
                    .map(|arr| Self::parse_parameters(arr))
                    .transpose()?
            } else {
                None
            };

            let ty = AbiType::parse(param_type, components.as_deref())?;

            parameters.push(Param {
                name,
                ty,
                internal_type,
                indexed,
            });
        }

        Ok(parameters)
    }
}

impl Default for AbiParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ABI: &str = r#"[
        {"type": "constructor", "inputs": [{"name": "_name", "type": "string"}], "stateMutability": "nonpayable"},
        {"type": "function", "name": "balanceOf", "inputs": [{"name": "account", "type": "address"}],
         "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"},
        {"type": "function", "name": "transfer", "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}],
         "outputs": [{"name": "", "type": "bool"}], "stateMutability": "nonpayable"},
        {"type": "function", "name": "transfer", "inputs": [{"name": "to", "type": "address"}],
         "stateMutability": "payable"},
        {"type": "function", "name": "legacy", "inputs": [], "constant": true},
        {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [
            {"name": "from", "type": "address", "indexed": true},
            {"name": "to", "type": "address", "indexed": true},
            {"name": "value", "type": "uint256", "indexed": false}]},
        {"type": "error", "name": "Unauthorized", "inputs": []},
        {"type": "receive", "stateMutability": "payable"}
    ]"#;

    #[test]
    fn test_parse_items() {
        let abi = AbiParser::new().parse_content(SAMPLE_ABI).unwrap();
        assert_eq!(abi.items.len(), 6);
        assert_eq!(abi.functions().count(), 4);
        assert_eq!(abi.events().count(), 1);

        let constructor = abi.constructor().unwrap();
        assert_eq!(constructor.inputs[0].name, "_name");
        assert_eq!(constructor.inputs[0].ty, AbiType::String);
    }

    #[test]
    fn test_absent_outputs_are_empty() {
        let abi = AbiParser::new().parse_content(SAMPLE_ABI).unwrap();
        let payable = abi.function("transfer", Some(1)).unwrap();
        assert!(payable.outputs.is_empty());
        assert!(payable.is_payable());
    }

    #[test]
    fn test_legacy_constant_flag() {
        let abi = AbiParser::new().parse_content(SAMPLE_ABI).unwrap();
        let legacy = abi.function("legacy", None).unwrap();
        assert_eq!(legacy.state_mutability, Some(StateMutability::View));
        assert!(legacy.is_read_only());
    }

    #[test]
    fn test_function_lookup_by_signature_and_arity() {
        let abi = AbiParser::new().parse_content(SAMPLE_ABI).unwrap();
        assert!(abi.is_overloaded("transfer"));
        assert_eq!(abi.function("transfer", Some(2)).unwrap().inputs.len(), 2);
        assert_eq!(
            abi.function("transfer(address)", None).unwrap().inputs.len(),
            1
        );
        assert!(abi.function("transfer", Some(3)).is_none());
        assert!(abi.function("mint", None).is_none());
    }

    #[test]
    fn test_event_indexed_flags() {
        let abi = AbiParser::new().parse_content(SAMPLE_ABI).unwrap();
        let transfer = abi.event("Transfer").unwrap();
        let indexed: Vec<bool> = transfer.inputs.iter().map(|p| p.indexed).collect();
        assert_eq!(indexed, vec![true, true, false]);
        assert_eq!(
            transfer.topic(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_duplicate_constructor_is_rejected() {
        let abi = r#"[{"type": "constructor", "inputs": []}, {"type": "constructor", "inputs": []}]"#;
        assert!(AbiParser::new().parse_content(abi).is_err());
    }

    #[test]
    fn test_missing_names_are_tolerated() {
        let abi = r#"[{"type": "function", "name": "pair", "inputs": [{"type": "uint256"}, {"type": "address"}],
                       "outputs": [{"type": "uint256"}, {"type": "bool"}], "stateMutability": "view"}]"#;
        let abi = AbiParser::new().parse_content(abi).unwrap();
        let pair = abi.function("pair", None).unwrap();
        assert_eq!(pair.inputs[0].key(0), "param1");
        assert_eq!(pair.outputs[1].key(1), "param2");
        assert_eq!(pair.signature(), "pair(uint256,address)");
    }

    #[test]
    fn test_tuple_components_are_parsed_recursively() {
        let abi = r#"[{"type": "function", "name": "submit", "stateMutability": "nonpayable", "inputs": [
            {"name": "plan", "type": "tuple", "internalType": "struct Pool.Plan", "components": [
                {"name": "amount", "type": "uint256"},
                {"name": "recipients", "type": "tuple[]", "internalType": "struct Pool.Recipient[]", "components": [
                    {"name": "addr", "type": "address"},
                    {"name": "share", "type": "uint16"}]}]}]}]"#;
        let abi = AbiParser::new().parse_content(abi).unwrap();
        let submit = abi.function("submit", None).unwrap();
        assert_eq!(submit.signature(), "submit((uint256,(address,uint16)[]))");
        assert_eq!(submit.inputs[0].struct_name(), Some("Plan"));
    }

    #[test]
    fn test_parse_artifact_with_bytecode_object() {
        let artifact = r#"{
            "abi": [{"type": "function", "name": "ping", "inputs": [], "outputs": [], "stateMutability": "nonpayable"}],
            "bytecode": {"object": "0x6080", "linkReferences": {"lib/Math.sol": {"Math": [{"start": 1, "length": 20}]}}}
        }"#;
        let artifact = AbiParser::new().parse_artifact(artifact).unwrap();
        assert_eq!(artifact.bytecode.as_deref(), Some("0x6080"));
        assert_eq!(artifact.link_references["lib/Math.sol"]["Math"].len(), 1);
        assert_eq!(artifact.abi.functions().count(), 1);
    }

    #[test]
    fn test_declaration_rendering() {
        let abi = AbiParser::new().parse_content(SAMPLE_ABI).unwrap();
        assert_eq!(
            abi.function("balanceOf", None).unwrap().declaration(),
            "function balanceOf(address account) returns (uint256)"
        );
        assert_eq!(
            abi.event("Transfer").unwrap().declaration(),
            "event Transfer(address indexed from, address indexed to, uint256 value)"
        );
    }
}
