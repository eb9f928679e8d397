//! Per-run generation state
//!
//! Name deduplication and the record registry live here rather than in
//! globals, so separate generation runs never influence each other.

use std::collections::HashSet;

use ethbind_abi::mapper::ident;
use ethbind_abi::{Position, RecordShape, TypeExpr};

/// Names brought into scope by the generated file's imports
pub const RESERVED_TYPES: &[&str] = &[
    "AbiValue",
    "BatchRequest",
    "BigInt",
    "Contract",
    "DeployOptions",
    "Error",
    "Event",
    "FromAbiValue",
    "IntoAbiValue",
    "Log",
    "Numeric",
    "Record",
    "Result",
    "TransactionOptions",
    "TransactionReceipt",
    "Transport",
    "String",
    "Vec",
    "Option",
];

/// Methods every generated contract type defines itself
pub const RESERVED_METHODS: &[&str] = &["new", "address", "set_address", "contract", "deploy"];

/// A record struct to emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    pub name: String,
    pub shape: RecordShape,
    /// `(ident, key, rendered type)` per field
    pub fields: Vec<(String, String, String)>,
}

/// State threaded through one generation run
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// Every method name the contract impl defines so far
    methods: HashSet<String>,
    types: HashSet<String>,
    records: Vec<RecordDef>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self {
            methods: RESERVED_METHODS.iter().map(|s| s.to_string()).collect(),
            types: RESERVED_TYPES.iter().map(|s| s.to_string()).collect(),
            records: Vec::new(),
        }
    }

    /// Exposed name for a single method, `name_1`, `name_2`, ... on collision
    pub fn unique_function_name(&mut self, name: &str) -> String {
        self.unique_accessor_name(name, |method| vec![method.to_string()])
    }

    /// Base name for a group of accessors
    ///
    /// `members` lists every method the group defines for a candidate base
    /// name. If any of them is taken the whole group moves to `name_1`,
    /// `name_2`, ... and all members are claimed together.
    pub fn unique_accessor_name<F>(&mut self, name: &str, members: F) -> String
    where
        F: Fn(&str) -> Vec<String>,
    {
        let stem = name.trim_start_matches("r#");
        let mut counter = 0;
        loop {
            let candidate = if counter == 0 {
                name.to_string()
            } else {
                format!("{}_{}", stem, counter)
            };
            let claimed = members(&candidate);
            if claimed.iter().all(|method| !self.methods.contains(method)) {
                self.methods.extend(claimed);
                return candidate;
            }
            counter += 1;
        }
    }

    /// Claim a type name, `Name1`, `Name2`, ... on collision
    pub fn unique_type_name(&mut self, name: &str) -> String {
        let name = if name.is_empty() { "Tuple" } else { name };
        unique(&mut self.types, name, "")
    }

    /// Register every record in `expr`, innermost first
    pub fn register(&mut self, expr: &TypeExpr, position: Position) {
        let mut shapes = Vec::new();
        expr.for_each_record(&mut |shape: &RecordShape| shapes.push(shape.clone()));
        for shape in shapes {
            self.intern(shape, position);
        }
    }

    fn intern(&mut self, shape: RecordShape, position: Position) -> String {
        if let Some(def) = self.records.iter().find(|def| def.shape == shape) {
            return def.name.clone();
        }

        let mut idents = HashSet::new();
        let fields = shape
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let ident = unique(&mut idents, &field.ident, "_");
                (ident, field.key.clone(), self.render(&field.ty))
            })
            .collect();

        let hint = if shape.hint.is_empty() { "Tuple" } else { shape.hint.as_str() };
        let name = if position == Position::Output && self.types.contains(hint) {
            self.unique_type_name(&format!("{}Output", hint))
        } else {
            self.unique_type_name(hint)
        };

        self.records.push(RecordDef {
            name: name.clone(),
            shape,
            fields,
        });
        name
    }

    /// Render a type expression with registered record names
    pub fn render(&self, expr: &TypeExpr) -> String {
        expr.render_with(&mut |shape: &RecordShape| {
            self.records
                .iter()
                .find(|def| def.shape == *shape)
                .map(|def| def.name.clone())
                .unwrap_or_else(|| shape.hint.clone())
        })
    }

    /// Registered records in registration order
    pub fn records(&self) -> &[RecordDef] {
        &self.records
    }
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct field identifiers for a parameter list
pub fn field_idents<'a>(
    names: impl IntoIterator<Item = &'a str>,
    reserved: &[&str],
) -> Vec<String> {
    let mut taken: HashSet<String> = reserved.iter().map(|s| s.to_string()).collect();
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| unique(&mut taken, &ident(name, i), "_"))
        .collect()
}

fn unique(taken: &mut HashSet<String>, name: &str, separator: &str) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let base = name.trim_start_matches("r#");
    let mut counter = 1;
    loop {
        let candidate = format!("{}{}{}", base, separator, counter);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
