//! Contract between the host and the analysis engine it feeds
//!
//! The engine pulls everything it knows about files through [`ScriptHost`];
//! the host in turn only ever talks to the engine through [`AnalysisEngine`].

use crate::settings::CompilerSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Half-open byte range inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        TextSpan {
            start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// A position inside a parsed unit, as handed out by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file_name: String,
    pub offset: usize,
}

/// A top-level statement of a parsed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Grammar node kind, e.g. `function_declaration`.
    pub kind: String,
    /// Declared name, when the statement declares one.
    pub name: Option<String>,
    pub span: TextSpan,
    pub text: String,
    pub file_name: String,
}

impl Statement {
    pub fn position(&self) -> SourcePosition {
        SourcePosition {
            file_name: self.file_name.clone(),
            offset: self.span.start,
        }
    }
}

/// The engine's parsed view of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub file_name: String,
    /// The script version the unit was produced from.
    pub version: String,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    pub file_name: String,
    pub text_span: TextSpan,
    pub kind: String,
    pub name: String,
    pub container_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub file_name: String,
    pub text_span: TextSpan,
    pub is_definition: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedSymbol {
    pub definition: DefinitionInfo,
    pub references: Vec<ReferenceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationLocation {
    pub file_name: String,
    pub text_span: TextSpan,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickInfo {
    pub kind: String,
    pub text_span: TextSpan,
    pub display: String,
    pub documentation: Option<String>,
}

/// The file system view the host presents to the engine.
pub trait ScriptHost {
    fn current_directory(&self) -> &Path;

    fn compilation_settings(&self) -> &CompilerSettings;

    fn default_lib_file_name(&self, settings: &CompilerSettings) -> PathBuf;

    /// Normalized paths of every tracked file.
    fn script_file_names(&self) -> Vec<String>;

    /// Stringified version of a file, `"-1"` when it is not tracked.
    fn script_version(&self, file_name: &str) -> String;

    /// Current content of a tracked file.
    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>>;
}

/// An incremental program-analysis engine.
///
/// Query results are passed through the host untouched, so `None` and empty
/// vectors keep whatever meaning the engine gives them.
pub trait AnalysisEngine: Send {
    fn source_file(&mut self, host: &dyn ScriptHost, file_name: &str) -> Option<Arc<SourceUnit>>;

    fn definition_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<DefinitionInfo>>;

    fn type_definition_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<DefinitionInfo>>;

    fn find_references(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<ReferencedSymbol>>;

    fn implementation_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<Vec<ImplementationLocation>>;

    fn quick_info_at_position(
        &mut self,
        host: &dyn ScriptHost,
        file_name: &str,
        position: usize,
    ) -> Option<QuickInfo>;

    /// Called when the host stops tracking a file.
    fn release(&mut self, _file_name: &str) {}
}
