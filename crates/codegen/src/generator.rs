//! Binding generator
//!
//! Walks an ABI in two passes. The first assigns every function and event a
//! unique exposed name; the second emits accessors into a structured
//! [`Document`] that the printer turns into source text.

use std::path::{Path, PathBuf};

use convert_case::{Case, Casing};
use ethbind_abi::mapper::{ident, type_name};
use ethbind_abi::{map_param, map_type, AbiItem, AbiType, Artifact, Param, Position, TypeExpr};
use ethbind_common::{Error, Result};
use serde_json::json;
use tracing::{debug, info};

use crate::context::{field_idents, GenerationContext, RecordDef};
use crate::document::{Document, Node, Printer};
use crate::templates::{TemplateManager, BINDING_TEMPLATE};
use crate::CodegenConfig;

/// Identifiers accessor signatures use besides the ABI arguments
const ACCESSOR_ARGS: &[&str] = &["options", "value", "batch", "key", "params"];

/// How an accessor receives its ABI arguments
enum Args {
    None,
    Single { ident: String, ty: String },
    Params { name: String },
}

impl Args {
    /// Declaration fragment following `&self`
    fn declaration(&self) -> String {
        match self {
            Args::None => String::new(),
            Args::Single { ident, ty } => format!(", {}: {}", ident, ty),
            Args::Params { name } => format!(", params: {}", name),
        }
    }

    /// Expression producing the argument values
    fn values(&self) -> String {
        match self {
            Args::None => "Vec::new()".to_string(),
            Args::Single { ident, .. } => format!("vec![{}.into_abi_value()]", ident),
            Args::Params { .. } => "params.into_values()".to_string(),
        }
    }
}

/// Code generator for contract bindings
pub struct BindingGenerator {
    config: CodegenConfig,
    templates: TemplateManager,
    printer: Printer,
}

impl BindingGenerator {
    /// Create a new generator with the given configuration
    pub fn new(config: CodegenConfig) -> Result<Self> {
        Ok(Self {
            config,
            templates: TemplateManager::new()?,
            printer: Printer::default(),
        })
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    fn contract_type(&self) -> Result<String> {
        let name = type_name(&self.config.contract_name);
        if !name.starts_with(|c: char| c.is_ascii_alphabetic())
            || !name.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::codegen(format!(
                "`{}` is not a usable contract name",
                self.config.contract_name
            )));
        }
        Ok(name)
    }

    /// Name of the generated file, `snake_case.rs` of the contract name
    pub fn file_name(&self) -> Result<String> {
        Ok(format!("{}.rs", self.contract_type()?.to_case(Case::Snake)))
    }

    /// Render the binding source for `artifact`
    pub fn generate(&self, artifact: &Artifact) -> Result<String> {
        let requested = self.contract_type()?;
        let mut ctx = GenerationContext::new();
        let contract = ctx.unique_type_name(&requested);
        info!("Generating bindings for contract {}", contract);

        let document = self.build(&contract, artifact, &mut ctx)?;
        let body = self.printer.print(&document);

        self.templates.render(
            BINDING_TEMPLATE,
            &json!({
                "contract_name": contract,
                "runtime": self.config.runtime_crate,
                "body": body,
            }),
        )
    }

    /// Generate and write the binding file, returning its path
    pub async fn write(&self, artifact: &Artifact) -> Result<PathBuf> {
        let source = self.generate(artifact)?;
        let output_dir = Path::new(&self.config.output_dir);

        if !self.config.dry_run {
            tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
                Error::codegen(format!("Failed to create output directory: {}", e))
            })?;
        }

        let path = output_dir.join(self.file_name()?);
        self.write_file(&path, &source).await?;
        Ok(path)
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if self.config.dry_run {
            info!("Dry run, not writing {}", path.display());
            println!("\n--- {} ---", path.display());
            println!("{}", content);
        } else {
            tokio::fs::write(path, content).await.map_err(|e| {
                Error::codegen(format!("Failed to write file {}: {}", path.display(), e))
            })?;
            info!("Wrote {}", path.display());
        }
        Ok(())
    }

    fn build(&self, contract: &str, artifact: &Artifact, ctx: &mut GenerationContext) -> Result<Document> {
        let abi = &artifact.abi;
        let bytecode = if self.config.output_bytecode {
            Some(artifact.bytecode.as_deref().ok_or_else(|| {
                Error::codegen("bytecode output requested but the artifact carries no bytecode")
            })?)
        } else {
            None
        };

        // Names first, so every accessor sees the final deduplicated set.
        // Derived accessors are claimed with their base name.
        let batch = self.config.has_batch_call;
        let functions: Vec<(&AbiItem, String)> = abi
            .functions()
            .map(|item| {
                let read_only = item.is_read_only();
                let name = ctx.unique_accessor_name(&ident(&item.name, 0), |method| {
                    function_accessor_names(method, read_only, batch)
                });
                (item, name)
            })
            .collect();
        let events: Vec<(&AbiItem, String)> = abi
            .events()
            .map(|item| {
                let snake = item.name.to_case(Case::Snake);
                let name = ctx.unique_accessor_name(&snake, event_accessor_names);
                (item, name)
            })
            .collect();

        let mut params_structs = Vec::new();
        let mut methods = self.lifecycle_methods(bytecode.is_some());

        if bytecode.is_some() {
            let constructor = abi.constructor();
            let inputs = constructor.map(|c| c.inputs.as_slice()).unwrap_or_default();
            let args = self.plan_args(inputs, "Deploy", "constructor", ctx, &mut params_structs);
            let payable = constructor.map(AbiItem::is_payable).unwrap_or(false);
            methods.push(Node::Blank);
            methods.extend(deploy_accessor(&args, payable));
        }

        for (item, method) in &functions {
            debug!("Generating accessors for {}", item.signature());
            let signature = item.signature();
            let args = self.plan_args(&item.inputs, base(method), &signature, ctx, &mut params_structs);
            let output = plan_output(item, method, ctx);
            methods.push(Node::Blank);
            methods.extend(self.function_accessors(item, method, &args, output.as_deref()));
        }

        let mut event_structs = Vec::new();
        for (item, name) in &events {
            debug!("Generating decoders for event {}", item.signature());
            let struct_name = format!("{}Event", type_name(name));
            methods.push(Node::Blank);
            methods.extend(event_accessors(item, name, &struct_name));
            event_structs.push(Node::Blank);
            event_structs.extend(event_struct(item, &struct_name, ctx));
        }

        let mut document = Document::new();
        document.push(Node::doc("Contract ABI as JSON"));
        document.push(Node::line(format!(
            "pub const ABI: &str = {};",
            raw_string(&artifact.raw_abi.to_string())
        )));
        if let Some(code) = bytecode {
            let link_references = serde_json::to_string(&artifact.link_references)?;
            document.section(vec![
                Node::doc("Creation bytecode, library placeholders unresolved"),
                Node::line(format!("pub const BYTECODE: &str = {:?};", code)),
                Node::Blank,
                Node::line(format!(
                    "pub const LINK_REFERENCES: &str = {};",
                    raw_string(&link_references)
                )),
            ]);
        }

        for record in ctx.records() {
            document.section(record_struct(record));
        }
        document.section(params_structs);

        document.section(vec![
            Node::doc(format!("Typed bindings for the `{}` contract", contract)),
            Node::block(
                format!("pub struct {}<T: Transport> {{", contract),
                vec![Node::line("contract: Contract<T>,")],
            ),
        ]);
        document.section(vec![Node::block(
            format!("impl<T: Transport> {}<T> {{", contract),
            methods,
        )]);

        if !event_structs.is_empty() {
            let mut body = vec![Node::line("use super::*;")];
            body.extend(event_structs);
            document.section(vec![
                Node::doc("Decoded event records"),
                Node::block("pub mod events {", body),
            ]);
        }

        Ok(document)
    }

    fn lifecycle_methods(&self, with_bytecode: bool) -> Vec<Node> {
        let construct = if with_bytecode {
            vec![
                Node::line("let contract = Contract::new(transport, ABI)?"),
                Node::line("    .with_bytecode(BYTECODE)"),
                Node::line("    .with_link_references_json(LINK_REFERENCES)?;"),
            ]
        } else {
            vec![Node::line("let contract = Contract::new(transport, ABI)?;")]
        };

        let mut new_body = construct;
        new_body.push(Node::block_with_tail(
            "let contract = match address {",
            vec![
                Node::line("Some(address) => contract.at(address),"),
                Node::line("None => contract,"),
            ],
            "};",
        ));
        new_body.push(Node::line("Ok(Self { contract })"));

        vec![
            Node::doc("Create bindings, bound to `address` when given"),
            Node::block(
                "pub fn new(transport: T, address: Option<String>) -> Result<Self> {",
                new_body,
            ),
            Node::Blank,
            Node::block(
                "pub fn address(&self) -> Option<&str> {",
                vec![Node::line("self.contract.address()")],
            ),
            Node::Blank,
            Node::block(
                "pub fn set_address(&mut self, address: impl Into<String>) {",
                vec![Node::line("self.contract.set_address(address);")],
            ),
            Node::Blank,
            Node::doc("Untyped runtime contract"),
            Node::block(
                "pub fn contract(&self) -> &Contract<T> {",
                vec![Node::line("&self.contract")],
            ),
        ]
    }

    /// Decide how `inputs` are passed; arity two and up gets a params struct
    fn plan_args(
        &self,
        inputs: &[Param],
        pascal_base: &str,
        signature: &str,
        ctx: &mut GenerationContext,
        structs: &mut Vec<Node>,
    ) -> Args {
        let exprs: Vec<TypeExpr> = inputs
            .iter()
            .enumerate()
            .map(|(i, param)| map_param(param, i, Position::Input))
            .collect();
        for expr in &exprs {
            ctx.register(expr, Position::Input);
        }

        match inputs {
            [] => Args::None,
            [param] => Args::Single {
                ident: field_idents([param.name.as_str()], ACCESSOR_ARGS).remove(0),
                ty: ctx.render(&exprs[0]),
            },
            _ => {
                let name = ctx.unique_type_name(&format!("{}Params", type_name(pascal_base)));
                let idents = field_idents(inputs.iter().map(|p| p.name.as_str()), &[]);
                let fields: Vec<(String, String)> = idents
                    .into_iter()
                    .zip(exprs.iter().map(|expr| ctx.render(expr)))
                    .collect();
                structs.push(Node::Blank);
                structs.extend(params_struct(&name, signature, &fields));
                Args::Params { name }
            }
        }
    }

    fn function_accessors(
        &self,
        item: &AbiItem,
        method: &str,
        args: &Args,
        output: Option<&str>,
    ) -> Vec<Node> {
        let signature = item.signature();
        let payable = item.is_payable();
        let value_decl = if payable { ", value: Numeric" } else { "" };
        let options = if payable {
            "Some(TransactionOptions::with_value(options, value))"
        } else {
            "options"
        };
        let call = format!(
            "self.contract.call({:?}, {}, {})",
            signature,
            args.values(),
            options
        );

        let mut nodes = Vec::new();
        if item.is_read_only() {
            nodes.push(Node::doc(format!("Calls `{}`", signature)));
            nodes.push(call_accessor(method, args, value_decl, &call, &item.name, output));
        } else {
            nodes.push(Node::doc(format!(
                "Sends `{}` and returns the receipt",
                signature
            )));
            nodes.push(Node::block(
                format!(
                    "pub async fn {}(&self{}{}, options: Option<TransactionOptions>) -> Result<TransactionReceipt> {{",
                    method,
                    args.declaration(),
                    value_decl
                ),
                vec![Node::line(format!(
                    "self.contract.send({:?}, {}, {}).await",
                    signature,
                    args.values(),
                    options
                ))],
            ));

            nodes.push(Node::Blank);
            nodes.push(Node::doc(format!(
                "Simulates `{}` without submitting it",
                signature
            )));
            nodes.push(call_accessor(
                &suffixed(method, "_call"),
                args,
                value_decl,
                &call,
                &item.name,
                output,
            ));

            nodes.push(Node::Blank);
            nodes.push(Node::doc(format!("Call data for `{}`", signature)));
            nodes.push(Node::block(
                format!(
                    "pub fn {}(&self{}) -> Result<String> {{",
                    suffixed(method, "_tx_data"),
                    args.declaration()
                ),
                vec![Node::line(format!(
                    "self.contract.tx_data({:?}, {})",
                    signature,
                    args.values()
                ))],
            ));
        }

        if self.config.has_batch_call {
            nodes.push(Node::Blank);
            nodes.push(Node::doc(format!(
                "Queues `{}` on `batch` under `key`",
                signature
            )));
            nodes.push(Node::block(
                format!(
                    "pub fn {}(&self, batch: &mut BatchRequest, key: &str{}{}, options: Option<TransactionOptions>) -> Result<()> {{",
                    suffixed(method, "_batch_call"),
                    args.declaration(),
                    value_decl
                ),
                vec![Node::line(format!(
                    "self.contract.batch_call(batch, key, {:?}, {}, {})",
                    signature,
                    args.values(),
                    options
                ))],
            ));
        }

        nodes
    }
}

/// Method name without a raw-identifier prefix
fn base(method: &str) -> &str {
    method.trim_start_matches("r#")
}

fn suffixed(method: &str, suffix: &str) -> String {
    format!("{}{}", base(method), suffix)
}

/// Every method emitted for a function exposed as `method`
fn function_accessor_names(method: &str, read_only: bool, batch: bool) -> Vec<String> {
    let mut names = vec![method.to_string()];
    if !read_only {
        names.push(suffixed(method, "_call"));
        names.push(suffixed(method, "_tx_data"));
    }
    if batch {
        names.push(suffixed(method, "_batch_call"));
    }
    names
}

/// Decoder methods and record type emitted for an event exposed as `name`
fn event_accessor_names(name: &str) -> Vec<String> {
    vec![
        format!("parse_{}_event", name),
        format!("decode_{}_event", name),
        format!("{}Event", type_name(name)),
    ]
}

/// Smallest raw string literal that can hold `content`
fn raw_string(content: &str) -> String {
    let mut hashes = 1;
    while content.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{}\"{}\"{}", fence, content, fence)
}

/// Rendered return type of a function, `None` without outputs
fn plan_output(item: &AbiItem, method: &str, ctx: &mut GenerationContext) -> Option<String> {
    let expr = match item.outputs.as_slice() {
        [] => return None,
        [single] => map_param(single, 0, Position::Output),
        outputs => map_type(
            &AbiType::Tuple(outputs.to_vec()),
            &format!("{}Output", type_name(base(method))),
            Position::Output,
        ),
    };
    ctx.register(&expr, Position::Output);
    Some(ctx.render(&expr))
}

fn call_accessor(
    method: &str,
    args: &Args,
    value_decl: &str,
    call: &str,
    abi_name: &str,
    output: Option<&str>,
) -> Node {
    let (ret, body) = match output {
        None => (
            "()".to_string(),
            vec![Node::line(format!("{}.await?;", call)), Node::line("Ok(())")],
        ),
        Some(ty) => (
            ty.to_string(),
            vec![
                Node::line(format!("let value = {}.await?;", call)),
                Node::line(format!("output(value, {:?})", abi_name)),
            ],
        ),
    };
    Node::block(
        format!(
            "pub async fn {}(&self{}{}, options: Option<TransactionOptions>) -> Result<{}> {{",
            method,
            args.declaration(),
            value_decl,
            ret
        ),
        body,
    )
}

fn deploy_accessor(args: &Args, payable: bool) -> Vec<Node> {
    let value_decl = if payable { ", value: Numeric" } else { "" };
    let body = if payable {
        vec![
            Node::line("let mut options = options.unwrap_or_default();"),
            Node::line("options.options.value = Some(value.to_bigint());"),
            Node::line(format!(
                "self.contract.deploy({}, Some(options)).await",
                args.values()
            )),
        ]
    } else {
        vec![Node::line(format!(
            "self.contract.deploy({}, options).await",
            args.values()
        ))]
    };

    vec![
        Node::doc("Deploy a new instance and bind to its address"),
        Node::doc(""),
        Node::doc("Library addresses for linked bytecode go in `options.libraries`."),
        Node::block(
            format!(
                "pub async fn deploy(&mut self{}{}, options: Option<DeployOptions>) -> Result<String> {{",
                args.declaration(),
                value_decl
            ),
            body,
        ),
    ]
}

fn event_accessors(item: &AbiItem, name: &str, struct_name: &str) -> Vec<Node> {
    let signature = item.signature();
    vec![
        Node::doc(format!(
            "Decode `{}` events emitted by this contract in `receipt`",
            item.name
        )),
        Node::block(
            format!(
                "pub fn parse_{}_event(&self, receipt: &TransactionReceipt) -> Result<Vec<events::{}>> {{",
                name, struct_name
            ),
            vec![
                Node::line("self.contract"),
                Node::line(format!("    .parse_events(receipt, {:?})?", signature)),
                Node::line("    .into_iter()"),
                Node::line(format!("    .map(events::{}::from_event)", struct_name)),
                Node::line("    .collect()"),
            ],
        ),
        Node::Blank,
        Node::doc(format!("Decode one located `{}` log", item.name)),
        Node::block(
            format!(
                "pub fn decode_{}_event(&self, log: &Log) -> Result<events::{}> {{",
                name, struct_name
            ),
            vec![
                Node::line("let item = self"),
                Node::line("    .contract"),
                Node::line("    .abi()"),
                Node::line(format!("    .event({:?})", signature)),
                Node::line(format!(
                    "    .ok_or_else(|| Error::unknown_item({:?}))?;",
                    item.name
                )),
                Node::line(format!(
                    "events::{}::from_event(self.contract.decode(item, log)?)",
                    struct_name
                )),
            ],
        ),
    ]
}

fn event_struct(item: &AbiItem, struct_name: &str, ctx: &mut GenerationContext) -> Vec<Node> {
    let idents = field_idents(item.inputs.iter().map(|p| p.name.as_str()), &["event"]);
    let mut fields = Vec::new();
    for ((i, param), ident) in item.inputs.iter().enumerate().zip(idents) {
        // Hashed topics carry a digest, not the value
        let expr = if param.indexed && param.ty.is_hashed_topic() {
            TypeExpr::Bytes
        } else {
            map_param(param, i, Position::Output)
        };
        ctx.register(&expr, Position::Output);
        fields.push((ident, param.key(i), ctx.render(&expr)));
    }

    let mut declaration: Vec<Node> = fields
        .iter()
        .map(|(ident, _, ty)| Node::line(format!("pub {}: {},", ident, ty)))
        .collect();
    declaration.push(Node::doc("Originating log and its metadata"));
    declaration.push(Node::line("pub event: Event,"));

    let from_event = if fields.is_empty() {
        Node::block(
            "pub fn from_event(event: Event) -> Result<Self> {",
            vec![Node::line("Ok(Self { event })")],
        )
    } else {
        let mut init: Vec<Node> = fields
            .iter()
            .map(|(ident, key, _)| {
                Node::line(format!("{}: data.take({:?}, {:?})?,", ident, key, item.name))
            })
            .collect();
        init.push(Node::line("event,"));
        Node::block(
            "pub fn from_event(mut event: Event) -> Result<Self> {",
            vec![
                Node::line("let mut data = std::mem::take(&mut event.data);"),
                Node::block_with_tail("Ok(Self {", init, "})"),
            ],
        )
    };

    vec![
        Node::doc(format!("`{}`", item.declaration())),
        Node::line("#[derive(Debug, Clone, PartialEq)]"),
        Node::block(format!("pub struct {} {{", struct_name), declaration),
        Node::Blank,
        Node::block(format!("impl {} {{", struct_name), vec![from_event]),
    ]
}

fn params_struct(name: &str, signature: &str, fields: &[(String, String)]) -> Vec<Node> {
    vec![
        Node::doc(format!("Arguments of `{}`", signature)),
        Node::line("#[derive(Debug, Clone, PartialEq)]"),
        Node::block(
            format!("pub struct {} {{", name),
            fields
                .iter()
                .map(|(ident, ty)| Node::line(format!("pub {}: {},", ident, ty)))
                .collect(),
        ),
        Node::Blank,
        Node::block(
            format!("impl {} {{", name),
            vec![
                Node::doc("Argument values in declaration order"),
                Node::block(
                    "pub fn into_values(self) -> Vec<AbiValue> {",
                    vec![Node::block_with_tail(
                        "vec![",
                        fields
                            .iter()
                            .map(|(ident, _)| Node::line(format!("self.{}.into_abi_value(),", ident)))
                            .collect(),
                        "]",
                    )],
                ),
            ],
        ),
    ]
}

fn record_struct(record: &RecordDef) -> Vec<Node> {
    let name = &record.name;
    let into_value = if record.fields.is_empty() {
        vec![Node::line("AbiValue::Record(Record::new())")]
    } else {
        let mut chain = vec![Node::line("Record::new()")];
        chain.extend(
            record
                .fields
                .iter()
                .map(|(ident, key, _)| Node::line(format!("    .with({:?}, self.{})", key, ident))),
        );
        vec![Node::block_with_tail("AbiValue::Record(", chain, ")")]
    };
    let from_value = if record.fields.is_empty() {
        vec![
            Node::line("Record::from_abi_value(value, path)?;"),
            Node::line("Ok(Self {})"),
        ]
    } else {
        vec![
            Node::line("let mut record = Record::from_abi_value(value, path)?;"),
            Node::block_with_tail(
                "Ok(Self {",
                record
                    .fields
                    .iter()
                    .map(|(ident, key, _)| {
                        Node::line(format!("{}: record.take({:?}, path)?,", ident, key))
                    })
                    .collect(),
                "})",
            ),
        ]
    };

    vec![
        Node::doc(format!("`{}` tuple", record.shape.hint)),
        Node::line("#[derive(Debug, Clone, PartialEq)]"),
        Node::block(
            format!("pub struct {} {{", name),
            record
                .fields
                .iter()
                .map(|(ident, _, ty)| Node::line(format!("pub {}: {},", ident, ty)))
                .collect(),
        ),
        Node::Blank,
        Node::block(
            format!("impl IntoAbiValue for {} {{", name),
            vec![Node::block("fn into_abi_value(self) -> AbiValue {", into_value)],
        ),
        Node::Blank,
        Node::block(
            format!("impl FromAbiValue for {} {{", name),
            vec![Node::block(
                "fn from_abi_value(value: AbiValue, path: &str) -> Result<Self> {",
                from_value,
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_string_fence_grows_with_content() {
        assert_eq!(raw_string("[]"), "r#\"[]\"#");
        assert_eq!(raw_string("a\"#b"), "r##\"a\"#b\"##");
    }

    #[test]
    fn test_suffixed_strips_raw_prefix() {
        assert_eq!(suffixed("r#type", "_call"), "type_call");
        assert_eq!(suffixed("transfer_1", "_tx_data"), "transfer_1_tx_data");
    }

    #[test]
    fn test_accessor_names_follow_mutability() {
        assert_eq!(function_accessor_names("total", true, false), vec!["total"]);
        assert_eq!(
            function_accessor_names("r#type", false, true),
            vec!["r#type", "type_call", "type_tx_data", "type_batch_call"]
        );
        assert_eq!(
            event_accessor_names("moved_1"),
            vec!["parse_moved_1_event", "decode_moved_1_event", "Moved1Event"]
        );
    }

    #[test]
    fn test_contract_name_is_validated() {
        let config = CodegenConfig {
            contract_name: "9lives".to_string(),
            ..Default::default()
        };
        let generator = BindingGenerator::new(config).unwrap();
        assert!(matches!(generator.file_name(), Err(Error::Codegen(_))));

        let config = CodegenConfig {
            contract_name: "simple_storage".to_string(),
            ..Default::default()
        };
        let generator = BindingGenerator::new(config).unwrap();
        assert_eq!(generator.file_name().unwrap(), "simple_storage.rs");
    }
}
