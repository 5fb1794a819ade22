//! Static import pre-scan
//!
//! Finds module specifiers without resolving or type-checking anything.
//! Incomplete or broken files still yield whatever imports can be recognized.

use crate::parser::{node_text, string_literal_value, ScriptKind, SourceParser};
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::Node;

/// How a specifier was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import … from "x"` or `import "x"`
    Static,
    /// `export … from "x"`
    ReExport,
    /// `require("x")` or `import x = require("x")`
    Require,
    /// `import("x")`
    Dynamic,
}

/// A raw module specifier found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub name: String,
    pub kind: ImportKind,
    /// Byte offset of the statement or call that introduced the specifier.
    pub offset: usize,
}

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(import|export)\b[^;'"]*?\bfrom\s*['"]([^'"]*)['"]"#).unwrap()
});
static SIDE_EFFECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*import\s*['"]([^'"]*)['"]"#).unwrap());
static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"]*)['"]\s*\)"#).unwrap());
static DYNAMIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimport\s*\(\s*['"]([^'"]*)['"]\s*\)"#).unwrap());

/// Extracts import specifiers from TypeScript or JavaScript content.
pub struct ImportScanner {
    parser: SourceParser,
}

impl ImportScanner {
    pub fn new() -> Self {
        ImportScanner {
            parser: SourceParser::new(),
        }
    }

    /// Specifiers in document order. Empty specifiers are kept; filtering is
    /// left to the caller.
    pub fn scan(&mut self, content: &str) -> Vec<ImportSpecifier> {
        match self.parser.parse(ScriptKind::TypeScript, content) {
            Ok(tree) => {
                let mut imports = Vec::new();
                collect_imports(tree.root_node(), content, &mut imports);
                imports
            }
            Err(e) => {
                tracing::debug!("Import scan falling back to patterns: {}", e);
                scan_with_patterns(content)
            }
        }
    }
}

impl Default for ImportScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first walk over the tree, in source order, without recursion.
fn collect_imports(root: Node<'_>, source: &str, imports: &mut Vec<ImportSpecifier>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(specifier) = import_at(node, source) {
            imports.push(specifier);
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

fn import_at(node: Node<'_>, source: &str) -> Option<ImportSpecifier> {
    let found = |name: String, kind: ImportKind| ImportSpecifier {
        name,
        kind,
        offset: node.start_byte(),
    };

    match node.kind() {
        "import_statement" => node
            .child_by_field_name("source")
            .and_then(|literal| string_literal_value(literal, source))
            .map(|name| found(name, ImportKind::Static)),
        "export_statement" => node
            .child_by_field_name("source")
            .and_then(|literal| string_literal_value(literal, source))
            .map(|name| found(name, ImportKind::ReExport)),
        "import_require_clause" => node
            .child_by_field_name("source")
            .and_then(|literal| string_literal_value(literal, source))
            .map(|name| found(name, ImportKind::Require)),
        "call_expression" => {
            let function = node.child_by_field_name("function")?;
            let kind = match function.kind() {
                "import" => ImportKind::Dynamic,
                "identifier" if node_text(function, source) == "require" => ImportKind::Require,
                _ => return None,
            };
            let arguments = node.child_by_field_name("arguments")?;
            let mut cursor = arguments.walk();
            let first = arguments.named_children(&mut cursor).next()?;
            string_literal_value(first, source).map(|name| found(name, kind))
        }
        _ => None,
    }
}

/// Pattern based scan used when no syntax tree is available.
pub fn scan_with_patterns(content: &str) -> Vec<ImportSpecifier> {
    let mut imports = Vec::new();

    for caps in FROM_RE.captures_iter(content) {
        let kind = if &caps[1] == "export" {
            ImportKind::ReExport
        } else {
            ImportKind::Static
        };
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) {
            imports.push(ImportSpecifier {
                name: name.as_str().to_string(),
                kind,
                offset: whole.start(),
            });
        }
    }

    let simple: [(&LazyLock<Regex>, ImportKind); 3] = [
        (&SIDE_EFFECT_RE, ImportKind::Static),
        (&REQUIRE_RE, ImportKind::Require),
        (&DYNAMIC_RE, ImportKind::Dynamic),
    ];
    for (pattern, kind) in simple {
        for caps in pattern.captures_iter(content) {
            if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
                imports.push(ImportSpecifier {
                    name: name.as_str().to_string(),
                    kind,
                    offset: whole.start(),
                });
            }
        }
    }

    imports.sort_by_key(|import| import.offset);
    imports
}
