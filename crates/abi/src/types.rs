//! ABI type tree
//!
//! Solidity type strings are parsed once into an [`AbiType`] tree. Tuple
//! components come from the ABI document's `components` field, array suffixes
//! from the bracket groups trailing the base type.

use ethbind_common::{Error, Result};

/// A parsed ABI type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// 20-byte account address
    Address,
    /// Boolean
    Bool,
    /// UTF-8 string
    String,
    /// Dynamic byte string
    Bytes,
    /// Fixed-length byte string (`bytes1` to `bytes32`), length in bytes
    FixedBytes(usize),
    /// Unsigned integer, width in bits
    Uint(usize),
    /// Signed integer, width in bits
    Int(usize),
    /// Ordered, named components
    Tuple(Vec<Param>),
    /// Array of the element type, with an optional fixed length
    Array(Box<AbiType>, Option<usize>),
}

/// A named parameter of a function, event or tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    /// Declared name, empty when the ABI omits it
    pub name: String,
    /// Parameter type
    pub ty: AbiType,
    /// Compiler-provided type name such as `struct Pool.Recipient[]`
    pub internal_type: Option<String>,
    /// Whether the parameter is an indexed event topic
    pub indexed: bool,
}

impl Param {
    /// Create a non-indexed parameter
    pub fn new<S: Into<String>>(name: S, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
            internal_type: None,
            indexed: false,
        }
    }

    /// Mark the parameter as an indexed event topic
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Set the compiler-provided type name
    pub fn with_internal_type<S: Into<String>>(mut self, internal_type: S) -> Self {
        self.internal_type = Some(internal_type.into());
        self
    }

    /// Record key of the parameter at `index`
    pub fn key(&self, index: usize) -> String {
        param_name(&self.name, index)
    }

    /// Struct name from `internalType`, e.g. `struct Pool.Recipient[]` gives `Recipient`
    pub fn struct_name(&self) -> Option<&str> {
        let internal = self.internal_type.as_deref()?.strip_prefix("struct ")?;
        let base = internal.split('[').next()?;
        base.rsplit('.').next().filter(|name| !name.is_empty())
    }
}

/// Declared name, or the positional fallback `paramK` (1-indexed)
pub fn param_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("param{}", index + 1)
    } else {
        name.to_string()
    }
}

impl AbiType {
    /// Parse a Solidity type string; `components` is required for tuple types
    pub fn parse(type_str: &str, components: Option<&[Param]>) -> Result<Self> {
        TypeParser::new(type_str).parse(components)
    }

    /// Whether values of this type are encoded out of line
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::String | AbiType::Bytes => true,
            AbiType::Array(_, None) => true,
            AbiType::Array(inner, Some(_)) => inner.is_dynamic(),
            AbiType::Tuple(components) => components.iter().any(|c| c.ty.is_dynamic()),
            _ => false,
        }
    }

    /// Whether an indexed parameter of this type is stored as a hash in its topic
    pub fn is_hashed_topic(&self) -> bool {
        matches!(
            self,
            AbiType::String | AbiType::Bytes | AbiType::Tuple(_) | AbiType::Array(..)
        )
    }

    /// Whether the type is an integer
    pub fn is_numeric(&self) -> bool {
        matches!(self, AbiType::Uint(_) | AbiType::Int(_))
    }

    /// Innermost non-array type
    pub fn element(&self) -> &AbiType {
        match self {
            AbiType::Array(inner, _) => inner.element(),
            other => other,
        }
    }

    /// Array dimensions from innermost to outermost, as written left to right
    pub fn dimensions(&self) -> Vec<Option<usize>> {
        let mut dims = Vec::new();
        let mut current = self;
        while let AbiType::Array(inner, size) = current {
            dims.push(*size);
            current = inner;
        }
        dims.reverse();
        dims
    }
}

/// Recursive-descent parser over a single type string
struct TypeParser<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> TypeParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            rest: source.trim(),
        }
    }

    fn parse(mut self, components: Option<&[Param]>) -> Result<AbiType> {
        let base_len = self.rest.find('[').unwrap_or(self.rest.len());
        let (base, suffix) = self.rest.split_at(base_len);
        let mut ty = self.base(base, components)?;

        // Bracket groups wrap in source order: `T[2][]` is a dynamic array of `T[2]`
        self.rest = suffix;
        while !self.rest.is_empty() {
            let size = self.dimension()?;
            ty = AbiType::Array(Box::new(ty), size);
        }
        Ok(ty)
    }

    fn base(&self, base: &str, components: Option<&[Param]>) -> Result<AbiType> {
        let ty = match base {
            "address" => AbiType::Address,
            "bool" => AbiType::Bool,
            "string" => AbiType::String,
            "bytes" => AbiType::Bytes,
            "uint" => AbiType::Uint(256),
            "int" => AbiType::Int(256),
            "tuple" => {
                let components =
                    components.ok_or_else(|| self.error("tuple type without components"))?;
                AbiType::Tuple(components.to_vec())
            }
            _ => {
                if let Some(width) = base.strip_prefix("uint") {
                    AbiType::Uint(self.bit_width(width)?)
                } else if let Some(width) = base.strip_prefix("int") {
                    AbiType::Int(self.bit_width(width)?)
                } else if let Some(len) = base.strip_prefix("bytes") {
                    AbiType::FixedBytes(self.byte_length(len)?)
                } else {
                    return Err(self.error("unsupported type"));
                }
            }
        };
        Ok(ty)
    }

    fn dimension(&mut self) -> Result<Option<usize>> {
        let (digits, rest) = self
            .rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])))
            .ok_or_else(|| self.error("malformed array suffix"))?;
        self.rest = rest;

        if digits.is_empty() {
            return Ok(None);
        }
        match digits.parse::<usize>() {
            Ok(0) | Err(_) => Err(self.error("invalid array length")),
            Ok(size) => Ok(Some(size)),
        }
    }

    fn bit_width(&self, digits: &str) -> Result<usize> {
        match digits.parse::<usize>() {
            Ok(bits) if bits > 0 && bits <= 256 && bits % 8 == 0 => Ok(bits),
            _ => Err(self.error("integer width must be a multiple of 8 up to 256")),
        }
    }

    fn byte_length(&self, digits: &str) -> Result<usize> {
        match digits.parse::<usize>() {
            Ok(len) if (1..=32).contains(&len) => Ok(len),
            _ => Err(self.error("fixed bytes length must be between 1 and 32")),
        }
    }

    fn error(&self, msg: &str) -> Error {
        Error::abi(format!("{} in type `{}`", msg, self.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple_components() -> Vec<Param> {
        vec![
            Param::new("addr", AbiType::Address),
            Param::new("share", AbiType::Uint(256)),
        ]
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(AbiType::parse("address", None).unwrap(), AbiType::Address);
        assert_eq!(AbiType::parse("bool", None).unwrap(), AbiType::Bool);
        assert_eq!(AbiType::parse("string", None).unwrap(), AbiType::String);
        assert_eq!(AbiType::parse("bytes", None).unwrap(), AbiType::Bytes);
        assert_eq!(AbiType::parse("bytes32", None).unwrap(), AbiType::FixedBytes(32));
        assert_eq!(AbiType::parse("uint8", None).unwrap(), AbiType::Uint(8));
        assert_eq!(AbiType::parse("int128", None).unwrap(), AbiType::Int(128));
        assert_eq!(AbiType::parse("uint", None).unwrap(), AbiType::Uint(256));
    }

    #[test]
    fn test_parse_array_suffixes_in_source_order() {
        let ty = AbiType::parse("uint256[2][]", None).unwrap();
        assert_eq!(
            ty,
            AbiType::Array(
                Box::new(AbiType::Array(Box::new(AbiType::Uint(256)), Some(2))),
                None
            )
        );
        assert_eq!(ty.dimensions(), vec![Some(2), None]);
        assert_eq!(ty.element(), &AbiType::Uint(256));
    }

    #[test]
    fn test_parse_tuple_array() {
        let components = tuple_components();
        let ty = AbiType::parse("tuple[2][]", Some(&components)).unwrap();
        assert_eq!(ty.dimensions(), vec![Some(2), None]);
        assert_eq!(ty.element(), &AbiType::Tuple(components));
        assert!(ty.is_dynamic());
    }

    #[test]
    fn test_parse_rejects_malformed_types() {
        assert!(AbiType::parse("uint7", None).is_err());
        assert!(AbiType::parse("uint264", None).is_err());
        assert!(AbiType::parse("bytes33", None).is_err());
        assert!(AbiType::parse("bytes0", None).is_err());
        assert!(AbiType::parse("address[", None).is_err());
        assert!(AbiType::parse("address[0]", None).is_err());
        assert!(AbiType::parse("tuple", None).is_err());
        assert!(AbiType::parse("mapping", None).is_err());
    }

    #[test]
    fn test_dynamic_detection() {
        assert!(!AbiType::parse("uint256[3]", None).unwrap().is_dynamic());
        assert!(AbiType::parse("string[3]", None).unwrap().is_dynamic());
        assert!(AbiType::parse("address[]", None).unwrap().is_dynamic());
        let static_tuple = AbiType::Tuple(tuple_components());
        assert!(!static_tuple.is_dynamic());
    }

    #[test]
    fn test_param_name_fallback_is_one_indexed() {
        assert_eq!(param_name("", 0), "param1");
        assert_eq!(param_name("", 2), "param3");
        assert_eq!(param_name("amount", 2), "amount");
    }

    #[test]
    fn test_struct_name_from_internal_type() {
        let param = Param::new("recipients", AbiType::Tuple(tuple_components()))
            .with_internal_type("struct Pool.Recipient[]");
        assert_eq!(param.struct_name(), Some("Recipient"));

        let plain = Param::new("r", AbiType::Tuple(tuple_components()))
            .with_internal_type("struct Recipient");
        assert_eq!(plain.struct_name(), Some("Recipient"));

        let scalar = Param::new("x", AbiType::Uint(256)).with_internal_type("uint256");
        assert_eq!(scalar.struct_name(), None);
    }
}
