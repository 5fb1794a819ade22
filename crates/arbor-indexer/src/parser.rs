//! Tree-sitter parsing for TypeScript and JavaScript sources
//!
//! Parsing is synchronous and owned by whoever holds the [`SourceParser`];
//! tree-sitter parsers are cheap to keep around and are reused between files.

use anyhow::Result;
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Grammar variants the parser can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    TypeScript,
    Tsx,
}

impl ScriptKind {
    /// Determine the grammar from a file name. Everything that is not JSX
    /// goes through the TypeScript grammar, which also accepts plain JavaScript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => ScriptKind::Tsx,
            _ => ScriptKind::TypeScript,
        }
    }

    /// Get the tree-sitter language for this script kind
    pub fn language(&self) -> Language {
        match self {
            ScriptKind::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            ScriptKind::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// A reusable parser that remembers which grammar it was last set to.
pub struct SourceParser {
    parser: Parser,
    current: Option<ScriptKind>,
}

impl SourceParser {
    pub fn new() -> Self {
        SourceParser {
            parser: Parser::new(),
            current: None,
        }
    }

    /// Parse `content`. Syntax errors do not fail the parse; they show up as
    /// `ERROR` nodes in the returned tree.
    pub fn parse(&mut self, kind: ScriptKind, content: &str) -> Result<Tree> {
        if self.current != Some(kind) {
            self.parser
                .set_language(&kind.language())
                .map_err(|e| anyhow::anyhow!("Failed to set language: {}", e))?;
            self.current = Some(kind);
        }
        self.parser
            .parse(content, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse content"))
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of a node, empty when the byte range is not valid UTF-8.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

/// Contents of a string literal node without its quotes.
pub fn string_literal_value(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    let value = text.trim_matches('"').trim_matches('\'');
    Some(value.to_string())
}

/// Name declared by a top-level statement, looking through `export` and `declare` wrappers.
pub fn declared_name(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "export_statement" => node
            .child_by_field_name("declaration")
            .and_then(|declaration| declared_name(declaration, source)),
        "ambient_declaration" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next();
            inner.and_then(|inner| declared_name(inner, source))
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            let declarator = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "variable_declarator");
            declarator
                .and_then(|declarator| declarator.child_by_field_name("name"))
                .map(|name| node_text(name, source).to_string())
        }
        _ => node
            .child_by_field_name("name")
            .map(|name| node_text(name, source).to_string()),
    }
}

/// Innermost declaration wrapped by `export`/`declare`, or the node itself.
pub fn unwrap_declaration(node: Node<'_>) -> Node<'_> {
    match node.kind() {
        "export_statement" => node
            .child_by_field_name("declaration")
            .map(unwrap_declaration)
            .unwrap_or(node),
        "ambient_declaration" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next();
            inner.map(unwrap_declaration).unwrap_or(node)
        }
        _ => node,
    }
}

pub fn is_identifier_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier" | "type_identifier" | "property_identifier" | "shorthand_property_identifier"
    )
}
