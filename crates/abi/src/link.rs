//! Bytecode library linking
//!
//! Compilers leave placeholders where an external library's address belongs.
//! Link references describe those placeholders as byte ranges; linking
//! overwrites each range with the hex digits of the deployed library address.

use std::collections::BTreeMap;

use ethbind_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A placeholder location inside raw bytecode, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub start: usize,
    pub length: usize,
}

/// `file -> contract -> placeholder offsets`
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<Offset>>>;

/// `file -> contract -> library address`
pub type Libraries = BTreeMap<String, BTreeMap<String, String>>;

/// Patch every referenced placeholder with its library address
///
/// Fails before touching anything when references exist and either no
/// library map was given or a `(file, contract)` pair is missing from it.
pub fn link_bytecode(
    bytecode: &str,
    references: &LinkReferences,
    libraries: Option<&Libraries>,
) -> Result<String> {
    let required: Vec<(&String, &String, &Vec<Offset>)> = references
        .iter()
        .flat_map(|(file, contracts)| {
            contracts
                .iter()
                .map(move |(contract, offsets)| (file, contract, offsets))
        })
        .collect();

    if required.is_empty() {
        return Ok(bytecode.to_string());
    }

    let mut patches = Vec::with_capacity(required.len());
    for (file, contract, offsets) in required {
        let address = libraries
            .and_then(|libs| libs.get(file))
            .and_then(|contracts| contracts.get(contract))
            .ok_or_else(|| Error::missing_library(file.as_str(), contract.as_str()))?;

        let digits = address.strip_prefix("0x").unwrap_or(address);
        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidLibraryAddress {
                file: file.clone(),
                contract: contract.clone(),
                address: address.clone(),
            });
        }
        patches.push((file, contract, offsets, digits));
    }

    if !bytecode.is_ascii() {
        return Err(Error::abi("bytecode is not a hex string"));
    }
    let prefix = if bytecode.starts_with("0x") { 2 } else { 0 };
    let mut linked = bytecode.to_string();

    for (file, contract, offsets, digits) in patches {
        for offset in offsets {
            let begin = prefix + offset.start * 2;
            let end = begin + offset.length * 2;
            if end > linked.len() {
                return Err(Error::LinkOffset {
                    file: file.clone(),
                    contract: contract.clone(),
                    start: offset.start,
                });
            }
            linked.replace_range(begin..end, digits);
        }
        debug!("Linked {}:{} at {} offset(s)", file, contract, offsets.len());
    }

    Ok(linked)
}
