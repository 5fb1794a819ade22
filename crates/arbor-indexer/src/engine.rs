//! Syntax-level analysis engine
//!
//! Answers queries from top-level declarations and identifier names only.
//! There is no type checker behind it; it exists so a host can be driven end
//! to end without an external compiler service.

use crate::parser::{
    declared_name, is_identifier_kind, node_text, unwrap_declaration, ScriptKind, SourceParser,
};
use arbor_core::{
    AnalysisEngine, DefinitionInfo, ImplementationLocation, QuickInfo, ReferenceEntry,
    ReferencedSymbol, ScriptHost, SourceUnit, Statement, TextSpan, UNTRACKED_VERSION,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::{Node, Tree};
use tracing::{debug, warn};

const TYPE_KINDS: &[&str] = &["interface", "type", "class", "enum"];

/// A named top-level declaration of a file.
#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    kind: &'static str,
    name_span: TextSpan,
    display: String,
    documentation: Option<String>,
    /// Names listed in `extends`/`implements` clauses of a class.
    heritage: Vec<String>,
}

struct CachedUnit {
    version: String,
    unit: Arc<SourceUnit>,
    tree: Tree,
    source: Arc<str>,
    declarations: Vec<Declaration>,
}

/// An identifier found under a query position.
struct Target {
    name: String,
    span: TextSpan,
}

/// Tree-sitter backed [`AnalysisEngine`].
///
/// Parsed units are cached per file name and rebuilt only when the host
/// reports a different script version for that file.
pub struct SyntaxEngine {
    parser: SourceParser,
    units: HashMap<String, CachedUnit>,
    parse_count: usize,
}

impl SyntaxEngine {
    pub fn new() -> Self {
        SyntaxEngine {
            parser: SourceParser::new(),
            units: HashMap::new(),
            parse_count: 0,
        }
    }

    /// Number of parses performed so far.
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }

    /// Number of files with a cached parse.
    pub fn cached_files(&self) -> usize {
        self.units.len()
    }

    fn ensure(&mut self, host: &dyn ScriptHost, file_name: &str) -> Option<&CachedUnit> {
        let version = host.script_version(file_name);
        if version == UNTRACKED_VERSION.to_string() {
            self.units.remove(file_name);
            return None;
        }

        let fresh = matches!(self.units.get(file_name), Some(cached) if cached.version == version);
        if !fresh {
            let source = host.script_snapshot(file_name)?;
            let cached = self.parse_unit(file_name, version, source)?;
            self.units.insert(file_name.to_string(), cached);
        } else {
            debug!("Reusing parse of {}", file_name);
        }
        self.units.get(file_name)
    }

    fn parse_unit(
        &mut self,
        file_name: &str,
        version: String,
        source: Arc<str>,
    ) -> Option<CachedUnit> {
        let kind = ScriptKind::from_path(Path::new(file_name));
        let tree = match self.parser.parse(kind, &source) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Failed to parse {}: {}", file_name, e);
                return None;
            }
        };
        self.parse_count += 1;
        debug!("Parsed {} at version {}", file_name, version);

        let mut statements = Vec::new();
        let mut declarations = Vec::new();
        {
            let root = tree.root_node();
            let mut cursor = root.walk();
            for node in root.named_children(&mut cursor) {
                if node.kind() == "comment" {
                    continue;
                }
                statements.push(Statement {
                    kind: node.kind().to_string(),
                    name: declared_name(node, &source),
                    span: TextSpan::new(node.start_byte(), node.end_byte()),
                    text: node_text(node, &source).to_string(),
                    file_name: file_name.to_string(),
                });
                if let Some(declaration) = declaration_of(node, &source) {
                    declarations.push(declaration);
                }
            }
        }

        let unit = Arc::new(SourceUnit {
            file_name: file_name.to_string(),
            version: version.clone(),
            statements,
        });
        Some(CachedUnit {
            version,
            unit,
            tree,
            source,
            declarations,
        })
    }

    fn target_at(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Target> {
        let cached = self.ensure(host, file_name)?;
        let end = (position + 1).min(cached.source.len());
        let node = cached
            .tree
            .root_node()
            .descendant_for_byte_range(position, end)?;
        if !is_identifier_kind(node.kind()) {
            return None;
        }
        Some(Target {
            name: node_text(node, &cached.source).to_string(),
            span: TextSpan::new(node.start_byte(), node.end_byte()),
        })
    }

    /// Tracked file names with `first` moved to the front.
    fn search_order(host: &dyn ScriptHost, first: &str) -> Vec<String> {
        let mut names = host.script_file_names();
        names.retain(|name| name != first);
        names.insert(0, first.to_string());
        names
    }

    /// Declarations named `name` across every tracked file, the query file first.
    fn declarations_named(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        name: &str,
    ) -> Vec<(String, Declaration)> {
        let mut found = Vec::new();
        for candidate in Self::search_order(host, file_name) {
            if let Some(cached) = self.ensure(host, &candidate) {
                found.extend(
                    cached
                        .declarations
                        .iter()
                        .filter(|declaration| declaration.name == name)
                        .map(|declaration| (candidate.clone(), declaration.clone())),
                );
            }
        }
        found
    }
}

impl Default for SyntaxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine for SyntaxEngine {
    fn source_file(&mut self, host: &dyn ScriptHost, file_name: &str) -> Option<Arc<SourceUnit>> {
        self.ensure(host, file_name)
            .map(|cached| Arc::clone(&cached.unit))
    }

    fn definition_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<DefinitionInfo>> {
        let target = self.target_at(host, file_name, position)?;
        let definitions = self
            .declarations_named(host, file_name, &target.name)
            .into_iter()
            .map(|(file, declaration)| definition_info(file, &declaration))
            .collect();
        Some(definitions)
    }

    fn type_definition_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<DefinitionInfo>> {
        let target = self.target_at(host, file_name, position)?;
        let definitions = self
            .declarations_named(host, file_name, &target.name)
            .into_iter()
            .filter(|(_, declaration)| TYPE_KINDS.contains(&declaration.kind))
            .map(|(file, declaration)| definition_info(file, &declaration))
            .collect();
        Some(definitions)
    }

    fn find_references(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<ReferencedSymbol>> {
        let target = self.target_at(host, file_name, position)?;
        let definition = self
            .declarations_named(host, file_name, &target.name)
            .into_iter()
            .next()
            .map(|(file, declaration)| definition_info(file, &declaration))
            .unwrap_or_else(|| DefinitionInfo {
                file_name: file_name.to_string(),
                text_span: target.span,
                kind: "unknown".to_string(),
                name: target.name.clone(),
                container_name: String::new(),
            });

        let mut references = Vec::new();
        for candidate in Self::search_order(host, file_name) {
            if let Some(cached) = self.ensure(host, &candidate) {
                collect_references(cached, &candidate, &target.name, &mut references);
            }
        }
        Some(vec![ReferencedSymbol {
            definition,
            references,
        }])
    }

    fn implementation_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<ImplementationLocation>> {
        let target = self.target_at(host, file_name, position)?;

        let mut implementations = Vec::new();
        for candidate in Self::search_order(host, file_name) {
            if let Some(cached) = self.ensure(host, &candidate) {
                implementations.extend(
                    cached
                        .declarations
                        .iter()
                        .filter(|declaration| declaration.heritage.contains(&target.name))
                        .map(|declaration| ImplementationLocation {
                            file_name: candidate.clone(),
                            text_span: declaration.name_span,
                            kind: declaration.kind.to_string(),
                        }),
                );
            }
        }
        if !implementations.is_empty() {
            return Some(implementations);
        }

        let concrete = self
            .declarations_named(host, file_name, &target.name)
            .into_iter()
            .filter(|(_, declaration)| !matches!(declaration.kind, "interface" | "type"))
            .map(|(file, declaration)| ImplementationLocation {
                file_name: file,
                text_span: declaration.name_span,
                kind: declaration.kind.to_string(),
            })
            .collect();
        Some(concrete)
    }

    fn quick_info_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<QuickInfo> {
        let target = self.target_at(host, file_name, position)?;
        let (_, declaration) = self
            .declarations_named(host, file_name, &target.name)
            .into_iter()
            .next()?;
        Some(QuickInfo {
            kind: declaration.kind.to_string(),
            text_span: target.span,
            display: declaration.display,
            documentation: declaration.documentation,
        })
    }

    fn release(&mut self, file_name: &str) {
        if self.units.remove(file_name).is_some() {
            debug!("Released parse of {}", file_name);
        }
    }
}

fn definition_info(file_name: String, declaration: &Declaration) -> DefinitionInfo {
    DefinitionInfo {
        file_name,
        text_span: declaration.name_span,
        kind: declaration.kind.to_string(),
        name: declaration.name.clone(),
        container_name: String::new(),
    }
}

fn declaration_kind(node: Node<'_>, source: &str) -> Option<&'static str> {
    let kind = match node.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature" => "function",
        "class_declaration" | "abstract_class_declaration" => "class",
        "interface_declaration" => "interface",
        "type_alias_declaration" => "type",
        "enum_declaration" => "enum",
        "internal_module" | "module" => "module",
        "lexical_declaration" if node_text(node, source).starts_with("const") => "const",
        "lexical_declaration" => "let",
        "variable_declaration" => "var",
        _ => return None,
    };
    Some(kind)
}

fn name_node(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            let declarator = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "variable_declarator");
            declarator.and_then(|declarator| declarator.child_by_field_name("name"))
        }
        _ => node.child_by_field_name("name"),
    }
}

fn declaration_of(statement: Node<'_>, source: &str) -> Option<Declaration> {
    let inner = unwrap_declaration(statement);
    let kind = declaration_kind(inner, source)?;
    let name = name_node(inner)?;

    Some(Declaration {
        name: node_text(name, source).to_string(),
        kind,
        name_span: TextSpan::new(name.start_byte(), name.end_byte()),
        display: header_of(node_text(statement, source)),
        documentation: documentation_of(statement, source),
        heritage: heritage_of(inner, source),
    })
}

/// First line of a declaration, without its body.
fn header_of(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let header = line.split('{').next().unwrap_or(line);
    header.trim().trim_end_matches(';').trim_end().to_string()
}

/// The comment directly above a statement, stripped of comment markers.
fn documentation_of(statement: Node<'_>, source: &str) -> Option<String> {
    let comment = statement.prev_sibling()?;
    if comment.kind() != "comment" {
        return None;
    }
    let between = source.get(comment.end_byte()..statement.start_byte())?;
    if between.chars().filter(|c| *c == '\n').count() > 1 || !between.trim().is_empty() {
        return None;
    }

    let text = node_text(comment, source);
    let lines: Vec<&str> = text
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/")
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix("//").unwrap_or(line);
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn heritage_of(declaration: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = declaration.walk();
    let Some(heritage) = declaration
        .named_children(&mut cursor)
        .find(|child| child.kind() == "class_heritage")
    else {
        return Vec::new();
    };

    let mut names = Vec::new();
    let mut stack = vec![heritage];
    while let Some(node) = stack.pop() {
        if matches!(node.kind(), "identifier" | "type_identifier") {
            names.push(node_text(node, source).to_string());
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
    names
}

fn collect_references(
    cached: &CachedUnit,
    file_name: &str,
    name: &str,
    references: &mut Vec<ReferenceEntry>,
) {
    let mut stack = vec![cached.tree.root_node()];
    while let Some(node) = stack.pop() {
        if is_identifier_kind(node.kind()) && node_text(node, &cached.source) == name {
            let is_definition = node.parent().is_some_and(|parent| {
                !matches!(parent.kind(), "import_specifier" | "export_specifier")
                    && parent.child_by_field_name("name") == Some(node)
            });
            references.push(ReferenceEntry {
                file_name: file_name.to_string(),
                text_span: TextSpan::new(node.start_byte(), node.end_byte()),
                is_definition,
            });
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_stops_at_body() {
        assert_eq!(
            header_of("export function clamp(value: number): number {\n    return value;\n}"),
            "export function clamp(value: number): number"
        );
        assert_eq!(header_of("const answer = 42;"), "const answer = 42");
    }

    #[test]
    fn documentation_strips_markers() {
        let source = "/**\n * Adds numbers.\n */\nfunction add() {}\n";
        let mut parser = SourceParser::new();
        let tree = parser.parse(ScriptKind::TypeScript, source).unwrap();
        let root = tree.root_node();
        let mut cursor = root.walk();
        let function = root
            .named_children(&mut cursor)
            .find(|node| node.kind() == "function_declaration")
            .unwrap();
        assert_eq!(
            documentation_of(function, source),
            Some("Adds numbers.".to_string())
        );
    }

    #[test]
    fn class_heritage_names() {
        let source = "class Admin extends User implements Named, Aged {}\n";
        let mut parser = SourceParser::new();
        let tree = parser.parse(ScriptKind::TypeScript, source).unwrap();
        let root = tree.root_node();
        let declaration = declaration_of(root.named_child(0).unwrap(), source).unwrap();
        assert_eq!(declaration.kind, "class");
        assert_eq!(declaration.name, "Admin");
        for expected in ["User", "Named", "Aged"] {
            assert!(declaration.heritage.iter().any(|name| name == expected));
        }
    }
}
