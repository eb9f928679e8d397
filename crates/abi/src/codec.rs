//! ABI wire encoding and decoding
//!
//! Values are coerced against the parsed [`AbiType`] tree into `ethabi`
//! tokens, and tokens are turned back into [`AbiValue`] trees using the same
//! tree. Every failure carries the dotted path of the offending value.

use ethabi::{Address, ParamType, Token, Uint};
use ethbind_common::{Error, Result};
use num_bigint::{BigInt, Sign};

use crate::parser::AbiItem;
use crate::types::{AbiType, Param};
use crate::value::{AbiValue, Record};

/// Map a type tree onto the `ethabi` parameter type
pub fn to_param_type(ty: &AbiType) -> ParamType {
    match ty {
        AbiType::Address => ParamType::Address,
        AbiType::Bool => ParamType::Bool,
        AbiType::String => ParamType::String,
        AbiType::Bytes => ParamType::Bytes,
        AbiType::FixedBytes(len) => ParamType::FixedBytes(*len),
        AbiType::Uint(bits) => ParamType::Uint(*bits),
        AbiType::Int(bits) => ParamType::Int(*bits),
        AbiType::Tuple(components) => {
            ParamType::Tuple(components.iter().map(|c| to_param_type(&c.ty)).collect())
        }
        AbiType::Array(inner, Some(size)) => {
            ParamType::FixedArray(Box::new(to_param_type(inner)), *size)
        }
        AbiType::Array(inner, None) => ParamType::Array(Box::new(to_param_type(inner))),
    }
}

/// Decode a hex string with an optional `0x` prefix
pub fn decode_hex(input: &str, path: &str) -> Result<Vec<u8>> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits).map_err(|e| Error::encoding(path, format!("invalid hex `{}`: {}", input, e)))
}

fn is_hex_pairs(s: &str) -> bool {
    s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn unexpected(path: &str, ty: &AbiType, value: &AbiValue) -> Error {
    Error::encoding(path, format!("cannot encode {} as {}", value.kind(), ty))
}

/// Coerce a dynamic value into a token of type `ty`
pub fn tokenize(value: &AbiValue, ty: &AbiType, path: &str) -> Result<Token> {
    match (ty, value) {
        (AbiType::Address, AbiValue::Address(address)) => Ok(Token::Address(*address)),
        (AbiType::Address, AbiValue::String(s)) => {
            let bytes = decode_hex(s, path)?;
            if bytes.len() != 20 {
                return Err(Error::encoding(path, format!("`{}` is not a 20-byte address", s)));
            }
            Ok(Token::Address(Address::from_slice(&bytes)))
        }
        (AbiType::Address, AbiValue::Bytes(bytes)) if bytes.len() == 20 => {
            Ok(Token::Address(Address::from_slice(bytes)))
        }

        (AbiType::Bool, AbiValue::Bool(b)) => Ok(Token::Bool(*b)),
        (AbiType::String, AbiValue::String(s)) => Ok(Token::String(s.clone())),

        (AbiType::Bytes, AbiValue::Bytes(bytes)) => Ok(Token::Bytes(bytes.clone())),
        (AbiType::Bytes, AbiValue::String(s)) => {
            // Hex when it looks like hex, otherwise the raw UTF-8 bytes
            if s.starts_with("0x") {
                Ok(Token::Bytes(decode_hex(s, path)?))
            } else if !s.is_empty() && is_hex_pairs(s) {
                Ok(Token::Bytes(decode_hex(s, path)?))
            } else {
                Ok(Token::Bytes(s.as_bytes().to_vec()))
            }
        }

        (AbiType::FixedBytes(len), AbiValue::Bytes(bytes)) => fixed_bytes(bytes.clone(), *len, path),
        (AbiType::FixedBytes(len), AbiValue::String(s)) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            if !is_hex_pairs(digits) {
                return Err(Error::encoding(
                    path,
                    format!("bytes{} expects a hex string, got `{}`", len, s),
                ));
            }
            fixed_bytes(decode_hex(digits, path)?, *len, path)
        }

        (AbiType::Uint(bits), _) | (AbiType::Int(bits), _) => {
            let number = match value {
                AbiValue::Number(n) => n.clone(),
                AbiValue::String(s) => parse_number(s, path)?,
                other => return Err(unexpected(path, ty, other)),
            };
            let signed = matches!(ty, AbiType::Int(_));
            let word = to_word(&number, *bits, signed, path)?;
            Ok(if signed { Token::Int(word) } else { Token::Uint(word) })
        }

        (AbiType::Tuple(components), AbiValue::Record(record)) => {
            let tokens = components
                .iter()
                .enumerate()
                .map(|(i, component)| {
                    let key = component.key(i);
                    let field_path = format!("{}.{}", path, key);
                    let field = record
                        .get(&key)
                        .ok_or_else(|| Error::encoding(&field_path, "missing field"))?;
                    tokenize(field, &component.ty, &field_path)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Token::Tuple(tokens))
        }
        (AbiType::Tuple(components), AbiValue::Array(items)) => {
            if items.len() != components.len() {
                return Err(Error::encoding(
                    path,
                    format!("expected {} tuple fields, got {}", components.len(), items.len()),
                ));
            }
            let tokens = components
                .iter()
                .zip(items)
                .enumerate()
                .map(|(i, (component, item))| {
                    tokenize(item, &component.ty, &format!("{}.{}", path, component.key(i)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Token::Tuple(tokens))
        }

        (AbiType::Array(inner, size), AbiValue::Array(items)) => {
            if let Some(size) = size {
                if items.len() != *size {
                    return Err(Error::encoding(
                        path,
                        format!("expected {} elements, got {}", size, items.len()),
                    ));
                }
            }
            let tokens = items
                .iter()
                .enumerate()
                .map(|(i, item)| tokenize(item, inner, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()?;
            Ok(match size {
                Some(_) => Token::FixedArray(tokens),
                None => Token::Array(tokens),
            })
        }

        (_, other) => Err(unexpected(path, ty, other)),
    }
}

fn fixed_bytes(mut bytes: Vec<u8>, len: usize, path: &str) -> Result<Token> {
    if bytes.len() > len {
        return Err(Error::encoding(
            path,
            format!("{} bytes do not fit in bytes{}", bytes.len(), len),
        ));
    }
    bytes.resize(len, 0);
    Ok(Token::FixedBytes(bytes))
}

fn parse_number(s: &str, path: &str) -> Result<BigInt> {
    let parsed = match s.strip_prefix("0x") {
        Some(digits) => BigInt::parse_bytes(digits.as_bytes(), 16),
        None => BigInt::parse_bytes(s.as_bytes(), 10),
    };
    parsed.ok_or_else(|| Error::encoding(path, format!("`{}` is not a number", s)))
}

/// Range-check `number` against the declared width and produce its 256-bit word
fn to_word(number: &BigInt, bits: usize, signed: bool, path: &str) -> Result<Uint> {
    let (min, max) = if signed {
        let half = BigInt::from(1) << (bits - 1);
        (-half.clone(), half - 1)
    } else {
        (BigInt::from(0), (BigInt::from(1) << bits) - 1)
    };
    if *number < min || *number > max {
        let kind = if signed { "int" } else { "uint" };
        return Err(Error::encoding(
            path,
            format!("{} is out of range for {}{}", number, kind, bits),
        ));
    }

    // Two's complement over the full word
    let unsigned = if number.sign() == Sign::Minus {
        number + (BigInt::from(1) << 256)
    } else {
        number.clone()
    };
    let (_, bytes) = unsigned.to_bytes_be();
    Ok(Uint::from_big_endian(&bytes))
}

fn from_word(word: &Uint, signed: bool) -> BigInt {
    let mut buf = [0u8; 32];
    word.to_big_endian(&mut buf);
    let value = BigInt::from_bytes_be(Sign::Plus, &buf);
    if signed && buf[0] & 0x80 != 0 {
        value - (BigInt::from(1) << 256)
    } else {
        value
    }
}

/// Turn a decoded token back into a dynamic value of type `ty`
pub fn detokenize(token: Token, ty: &AbiType, path: &str) -> Result<AbiValue> {
    let value = match (ty, token) {
        (AbiType::Address, Token::Address(address)) => AbiValue::Address(address),
        (AbiType::Bool, Token::Bool(b)) => AbiValue::Bool(b),
        (AbiType::String, Token::String(s)) => AbiValue::String(s),
        (AbiType::Bytes, Token::Bytes(bytes)) => AbiValue::Bytes(bytes),
        (AbiType::FixedBytes(_), Token::FixedBytes(bytes)) => AbiValue::Bytes(bytes),
        (AbiType::Uint(_), Token::Uint(word)) => AbiValue::Number(from_word(&word, false)),
        (AbiType::Int(_), Token::Int(word)) => AbiValue::Number(from_word(&word, true)),
        (AbiType::Tuple(components), Token::Tuple(tokens)) => {
            if tokens.len() != components.len() {
                return Err(Error::decoding(path, "tuple arity mismatch"));
            }
            let mut record = Record::new();
            for (i, (component, token)) in components.iter().zip(tokens).enumerate() {
                let key = component.key(i);
                let field = detokenize(token, &component.ty, &format!("{}.{}", path, key))?;
                record.insert(key, field);
            }
            AbiValue::Record(record)
        }
        (AbiType::Array(inner, _), Token::Array(tokens))
        | (AbiType::Array(inner, _), Token::FixedArray(tokens)) => AbiValue::Array(
            tokens
                .into_iter()
                .enumerate()
                .map(|(i, token)| detokenize(token, inner, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()?,
        ),
        (ty, token) => {
            return Err(Error::decoding(
                path,
                format!("expected {}, found token {:?}", ty, token),
            ))
        }
    };
    Ok(value)
}

/// Encode `values` against `params`; `path` names the method for errors
pub fn encode_params(params: &[Param], values: &[AbiValue], path: &str) -> Result<Vec<u8>> {
    if params.len() != values.len() {
        return Err(Error::encoding(
            path,
            format!("expected {} arguments, got {}", params.len(), values.len()),
        ));
    }
    let tokens = params
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (param, value))| tokenize(value, &param.ty, &format!("{}.{}", path, param.key(i))))
        .collect::<Result<Vec<_>>>()?;
    Ok(ethabi::encode(&tokens))
}

/// Decode a payload against `params`; `path` names the method or event for errors
pub fn decode_params(params: &[Param], data: &[u8], path: &str) -> Result<Vec<AbiValue>> {
    let types: Vec<ParamType> = params.iter().map(|p| to_param_type(&p.ty)).collect();
    let tokens = ethabi::decode(&types, data)
        .map_err(|e| Error::decoding(failing_param(params, &types, data, path), e.to_string()))?;
    params
        .iter()
        .zip(tokens)
        .enumerate()
        .map(|(i, (param, token))| detokenize(token, &param.ty, &format!("{}.{}", path, param.key(i))))
        .collect()
}

/// Path of the first parameter that does not decode
///
/// Decoding tolerates trailing data, so the shortest failing prefix of
/// `types` ends at the culprit.
fn failing_param(params: &[Param], types: &[ParamType], data: &[u8], path: &str) -> String {
    (1..=types.len())
        .find(|&n| ethabi::decode(&types[..n], data).is_err())
        .map(|n| format!("{}.{}", path, params[n - 1].key(n - 1)))
        .unwrap_or_else(|| path.to_string())
}

/// Selector followed by the encoded arguments
pub fn encode_call(item: &AbiItem, values: &[AbiValue]) -> Result<Vec<u8>> {
    let mut data = item.selector().to_vec();
    data.extend(encode_params(&item.inputs, values, &item.name)?);
    Ok(data)
}

/// Decode a call's return data into its result shape
///
/// No outputs give `None`, one output the bare value, several a record keyed
/// by output name (or `paramK`).
pub fn decode_output(item: &AbiItem, data: &[u8]) -> Result<Option<AbiValue>> {
    let mut values = decode_params(&item.outputs, data, &item.name)?;
    match values.len() {
        0 => Ok(None),
        1 => Ok(values.pop()),
        _ => Ok(Some(AbiValue::Record(
            item.outputs
                .iter()
                .enumerate()
                .map(|(i, param)| param.key(i))
                .zip(values)
                .collect(),
        ))),
    }
}

/// Decode an event log into a record in parameter order
///
/// Indexed parameters come from the topics after the signature topic (all
/// topics for anonymous events). Indexed strings, byte strings, tuples and
/// arrays are stored hashed, so their topic is returned as raw bytes.
pub fn decode_log<T: AsRef<[u8]>>(item: &AbiItem, topics: &[T], data: &[u8]) -> Result<Record> {
    let mut topic_index = if item.anonymous { 0 } else { 1 };
    let mut indexed_values = Vec::new();
    for (i, param) in item.inputs.iter().enumerate().filter(|(_, p)| p.indexed) {
        let path = format!("{}.{}", item.name, param.key(i));
        let topic: &[u8] = topics
            .get(topic_index)
            .ok_or_else(|| Error::decoding(&path, "missing indexed topic"))?
            .as_ref();
        topic_index += 1;

        let value = if param.ty.is_hashed_topic() {
            AbiValue::Bytes(topic.to_vec())
        } else {
            let mut tokens = ethabi::decode(&[to_param_type(&param.ty)], topic)
                .map_err(|e| Error::decoding(&path, e.to_string()))?;
            let token = tokens
                .pop()
                .ok_or_else(|| Error::decoding(&path, "empty topic"))?;
            detokenize(token, &param.ty, &path)?
        };
        indexed_values.push(value);
    }

    let plain: Vec<Param> = item.inputs.iter().filter(|p| !p.indexed).cloned().collect();
    let mut plain_values = decode_params(&plain, data, &item.name)?.into_iter();
    let mut indexed_values = indexed_values.into_iter();

    let mut record = Record::new();
    for (i, param) in item.inputs.iter().enumerate() {
        let value = if param.indexed {
            indexed_values.next()
        } else {
            plain_values.next()
        };
        let value = value.ok_or_else(|| Error::decoding(&item.name, "parameter count mismatch"))?;
        record.insert(param.key(i), value);
    }
    Ok(record)
}
