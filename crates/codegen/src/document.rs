//! Structured source document and its printer
//!
//! The generator describes what to emit as a tree of [`Node`]s; indentation
//! and blank-line handling belong to the [`Printer`].

/// One element of generated source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single line, printed at the current depth
    Line(String),
    /// Separator between declarations
    Blank,
    /// `///` documentation line
    Doc(String),
    /// `head`, the body one level deeper, then `tail`
    Block {
        head: String,
        body: Vec<Node>,
        tail: String,
    },
}

impl Node {
    pub fn line(text: impl Into<String>) -> Self {
        Node::Line(text.into())
    }

    pub fn doc(text: impl Into<String>) -> Self {
        Node::Doc(text.into())
    }

    /// A brace-delimited block
    pub fn block(head: impl Into<String>, body: Vec<Node>) -> Self {
        Node::Block {
            head: head.into(),
            body,
            tail: "}".to_string(),
        }
    }

    /// A block closed by a custom tail such as `});`
    pub fn block_with_tail(head: impl Into<String>, body: Vec<Node>, tail: impl Into<String>) -> Self {
        Node::Block {
            head: head.into(),
            body,
            tail: tail.into(),
        }
    }
}

/// An ordered list of top-level nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Append nodes, separated from what precedes them by a blank line
    pub fn section(&mut self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }
        self.nodes.push(Node::Blank);
        self.nodes.extend(nodes);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Renders a [`Document`] as source text
#[derive(Debug, Clone)]
pub struct Printer {
    indent: String,
}

impl Printer {
    pub fn new(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
        }
    }

    /// Print the document
    ///
    /// Blank lines never open a block, never repeat and never trail.
    pub fn print(&self, document: &Document) -> String {
        let mut out = String::new();
        self.print_nodes(document.nodes(), 0, &mut out);
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    fn print_nodes(&self, nodes: &[Node], depth: usize, out: &mut String) {
        let mut at_start = true;
        for node in nodes {
            match node {
                Node::Blank => {
                    if !at_start && !out.ends_with("\n\n") {
                        out.push('\n');
                    }
                    continue;
                }
                Node::Line(text) => self.push_line(text, depth, out),
                Node::Doc(text) if text.is_empty() => self.push_line("///", depth, out),
                Node::Doc(text) => self.push_line(&format!("/// {}", text), depth, out),
                Node::Block { head, body, tail } => {
                    self.push_line(head, depth, out);
                    self.print_nodes(body, depth + 1, out);
                    while out.ends_with("\n\n") {
                        out.pop();
                    }
                    self.push_line(tail, depth, out);
                }
            }
            at_start = false;
        }
    }

    fn push_line(&self, text: &str, depth: usize, out: &mut String) {
        if !text.is_empty() {
            for _ in 0..depth {
                out.push_str(&self.indent);
            }
            out.push_str(text);
        }
        out.push('\n');
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks_are_indented() {
        let mut doc = Document::new();
        doc.push(Node::doc("A contract"));
        doc.push(Node::block(
            "impl Token {",
            vec![Node::block("pub fn new() -> Self {", vec![Node::line("Self")])],
        ));

        let printed = Printer::default().print(&doc);
        assert_eq!(
            printed,
            "/// A contract\nimpl Token {\n    pub fn new() -> Self {\n        Self\n    }\n}\n"
        );
    }

    #[test]
    fn test_blank_lines_are_collapsed() {
        let mut doc = Document::new();
        doc.push(Node::Blank);
        doc.push(Node::line("const A: u8 = 1;"));
        doc.section(vec![Node::Blank, Node::line("const B: u8 = 2;")]);
        doc.push(Node::block("mod m {", vec![Node::Blank, Node::line("x"), Node::Blank]));
        doc.push(Node::Blank);

        let printed = Printer::default().print(&doc);
        assert_eq!(printed, "const A: u8 = 1;\n\nconst B: u8 = 2;\nmod m {\n    x\n}\n");
    }

    #[test]
    fn test_empty_section_is_ignored() {
        let mut doc = Document::new();
        doc.section(Vec::new());
        assert!(doc.is_empty());
    }
}
