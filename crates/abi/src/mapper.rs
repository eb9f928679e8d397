//! Mapping of ABI types onto target-language type expressions
//!
//! Input positions accept loose values (`Numeric` for any integer), output
//! positions always materialize integers as `BigInt`. Tuples become records
//! whose fields are mapped recursively; arrays of any dimension become nested
//! lists, one level per bracket group.

use convert_case::{Case, Casing};

use crate::types::{AbiType, Param};

/// Where a mapped type appears in a generated signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Input,
    Output,
}

/// Target-language type expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Addresses and strings
    Text,
    Bool,
    /// Hex-encoded byte strings
    Bytes,
    /// Native integer or arbitrary precision, input only
    Numeric,
    /// Arbitrary precision integer
    BigNumber,
    List(Box<TypeExpr>),
    Record(RecordShape),
}

/// Structural record built from tuple components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordShape {
    /// Preferred type name
    pub hint: String,
    pub fields: Vec<Field>,
}

/// One record field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// ABI key: declared name or `paramK`
    pub key: String,
    /// Rust identifier for the field
    pub ident: String,
    pub ty: TypeExpr,
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Snake-case identifier for a parameter, `paramK` when unnamed
///
/// Leading and trailing underscores are dropped, so `_spender` and `spender`
/// both give `spender`.
pub fn ident(name: &str, index: usize) -> String {
    let stripped = name.trim_matches('_');
    if stripped.is_empty() {
        return format!("param{}", index + 1);
    }
    let snake = stripped.to_case(Case::Snake);
    let snake = if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("p{}", snake)
    } else {
        snake
    };
    if matches!(snake.as_str(), "self" | "super" | "crate") {
        format!("{}_", snake)
    } else if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// PascalCase type name
pub fn type_name(name: &str) -> String {
    let stripped = name.trim_matches('_');
    if stripped.is_empty() {
        return String::new();
    }
    stripped.to_case(Case::Pascal)
}

/// Map a parameter; `index` is its position for the fallback name
pub fn map_param(param: &Param, index: usize, position: Position) -> TypeExpr {
    let hint = param
        .struct_name()
        .map(type_name)
        .unwrap_or_else(|| type_name(&param.key(index)));
    map_type(&param.ty, &hint, position)
}

/// Map a type tree; `hint` names the record when the type holds a tuple
pub fn map_type(ty: &AbiType, hint: &str, position: Position) -> TypeExpr {
    match ty {
        AbiType::Address | AbiType::String => TypeExpr::Text,
        AbiType::Bool => TypeExpr::Bool,
        AbiType::Bytes | AbiType::FixedBytes(_) => TypeExpr::Bytes,
        AbiType::Uint(_) | AbiType::Int(_) => match position {
            Position::Input => TypeExpr::Numeric,
            Position::Output => TypeExpr::BigNumber,
        },
        AbiType::Tuple(components) => TypeExpr::Record(RecordShape {
            hint: hint.to_string(),
            fields: components
                .iter()
                .enumerate()
                .map(|(i, component)| Field {
                    key: component.key(i),
                    ident: ident(&component.name, i),
                    ty: map_param(component, i, position),
                })
                .collect(),
        }),
        // Fixed lengths are not carried into the target type
        AbiType::Array(inner, _) => TypeExpr::List(Box::new(map_type(inner, hint, position))),
    }
}

impl TypeExpr {
    /// Render as Rust, naming records through `resolve`
    pub fn render_with<F>(&self, resolve: &mut F) -> String
    where
        F: FnMut(&RecordShape) -> String,
    {
        match self {
            TypeExpr::Text | TypeExpr::Bytes => "String".to_string(),
            TypeExpr::Bool => "bool".to_string(),
            TypeExpr::Numeric => "Numeric".to_string(),
            TypeExpr::BigNumber => "BigInt".to_string(),
            TypeExpr::List(inner) => format!("Vec<{}>", inner.render_with(resolve)),
            TypeExpr::Record(shape) => resolve(shape),
        }
    }

    /// Render using each record's hint as its name
    pub fn render(&self) -> String {
        self.render_with(&mut |shape: &RecordShape| shape.hint.clone())
    }

    /// Visit every record shape, innermost first
    pub fn for_each_record<F>(&self, visit: &mut F)
    where
        F: FnMut(&RecordShape),
    {
        match self {
            TypeExpr::List(inner) => inner.for_each_record(visit),
            TypeExpr::Record(shape) => {
                for field in &shape.fields {
                    field.ty.for_each_record(visit);
                }
                visit(shape);
            }
            _ => {}
        }
    }
}
