//! Unit tests for arbor-indexer module

use crate::*;
use arbor_core::{AnalysisEngine, CompilerSettings, Reassembler, ScriptHost};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory host: file name -> (version, content).
struct MapHost {
    cwd: PathBuf,
    settings: CompilerSettings,
    files: HashMap<String, (i64, Arc<str>)>,
}

impl MapHost {
    fn new() -> Self {
        MapHost {
            cwd: PathBuf::from("/project"),
            settings: CompilerSettings::default(),
            files: HashMap::new(),
        }
    }

    fn put(&mut self, name: &str, content: &str) {
        let version = self.files.get(name).map_or(1, |(version, _)| version + 1);
        self.files.insert(name.to_string(), (version, Arc::from(content)));
    }
}

impl ScriptHost for MapHost {
    fn current_directory(&self) -> &Path {
        &self.cwd
    }

    fn compilation_settings(&self) -> &CompilerSettings {
        &self.settings
    }

    fn default_lib_file_name(&self, settings: &CompilerSettings) -> PathBuf {
        self.cwd.join(settings.default_lib_file_name())
    }

    fn script_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.keys().cloned().collect();
        names.sort();
        names
    }

    fn script_version(&self, file_name: &str) -> String {
        self.files
            .get(file_name)
            .map_or(-1, |(version, _)| *version)
            .to_string()
    }

    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>> {
        self.files.get(file_name).map(|(_, content)| Arc::clone(content))
    }
}

const UTIL: &str = r#"/** Clamp a value into a range. */
export function clamp(value: number, min: number, max: number): number {
    return Math.min(Math.max(value, min), max);
}

export interface Shape {
    area(): number;
}
"#;

const MAIN: &str = r#"import { clamp, Shape } from './util';

export class Square implements Shape {
    area(): number {
        return clamp(4, 0, 10);
    }
}

const limit = clamp(1, 2, 3);
"#;

fn project() -> MapHost {
    let mut host = MapHost::new();
    host.put("/project/util.ts", UTIL);
    host.put("/project/main.ts", MAIN);
    host
}

fn offset_of(source: &str, needle: &str) -> usize {
    source.find(needle).unwrap()
}

#[test]
fn test_source_file_reused_until_version_changes() {
    let mut host = project();
    let mut engine = SyntaxEngine::new();

    let first = engine.source_file(&host, "/project/util.ts").unwrap();
    let again = engine.source_file(&host, "/project/util.ts").unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(engine.parse_count(), 1);

    host.put("/project/util.ts", "export const clamp = 1;\n");
    let changed = engine.source_file(&host, "/project/util.ts").unwrap();
    assert!(!Arc::ptr_eq(&first, &changed));
    assert_eq!(changed.version, "2");
    assert_eq!(engine.parse_count(), 2);
}

#[test]
fn test_statements_skip_comments() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    let unit = engine.source_file(&host, "/project/util.ts").unwrap();

    let names: Vec<Option<&str>> = unit
        .statements
        .iter()
        .map(|statement| statement.name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("clamp"), Some("Shape")]);
    assert!(unit.statements.iter().all(|s| s.file_name == "/project/util.ts"));
}

#[test]
fn test_untracked_file_has_no_unit() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    assert!(engine.source_file(&host, "/project/missing.ts").is_none());
    assert!(engine
        .definition_at_position(&host, "/project/missing.ts", 0)
        .is_none());
}

#[test]
fn test_definition_across_files() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    let position = offset_of(MAIN, "clamp(1");

    let definitions = engine
        .definition_at_position(&host, "/project/main.ts", position)
        .unwrap();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].file_name, "/project/util.ts");
    assert_eq!(definitions[0].kind, "function");
    assert_eq!(definitions[0].name, "clamp");
    let start = definitions[0].text_span.start;
    assert_eq!(&UTIL[start..start + 5], "clamp");
}

#[test]
fn test_type_definition_filters_values() {
    let host = project();
    let mut engine = SyntaxEngine::new();

    let shape = offset_of(MAIN, "Shape {");
    let definitions = engine
        .type_definition_at_position(&host, "/project/main.ts", shape)
        .unwrap();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].kind, "interface");

    let clamp = offset_of(MAIN, "clamp(1");
    let definitions = engine
        .type_definition_at_position(&host, "/project/main.ts", clamp)
        .unwrap();
    assert!(definitions.is_empty());
}

#[test]
fn test_position_outside_identifier_is_absent() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    let position = offset_of(MAIN, "(1, 2, 3)");
    assert!(engine
        .definition_at_position(&host, "/project/main.ts", position)
        .is_none());
}

#[test]
fn test_find_references() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    let position = offset_of(MAIN, "clamp(1");

    let symbols = engine
        .find_references(&host, "/project/main.ts", position)
        .unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].definition.file_name, "/project/util.ts");

    let references = &symbols[0].references;
    // import specifier, two calls in main.ts, the declaration in util.ts
    assert_eq!(references.len(), 4);
    assert_eq!(
        references
            .iter()
            .filter(|reference| reference.file_name == "/project/main.ts")
            .count(),
        3
    );
    let definitions: Vec<_> = references.iter().filter(|r| r.is_definition).collect();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].file_name, "/project/util.ts");
}

#[test]
fn test_implementation_prefers_heritage() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    let position = offset_of(UTIL, "Shape");

    let implementations = engine
        .implementation_at_position(&host, "/project/util.ts", position)
        .unwrap();
    assert_eq!(implementations.len(), 1);
    assert_eq!(implementations[0].file_name, "/project/main.ts");
    assert_eq!(implementations[0].kind, "class");
}

#[test]
fn test_quick_info_shows_header_and_docs() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    let position = offset_of(MAIN, "clamp(1");

    let info = engine
        .quick_info_at_position(&host, "/project/main.ts", position)
        .unwrap();
    assert_eq!(info.kind, "function");
    insta::assert_snapshot!(
        info.display,
        @"export function clamp(value: number, min: number, max: number): number"
    );
    assert_eq!(info.documentation.as_deref(), Some("Clamp a value into a range."));
    assert_eq!(info.text_span.start, position);
}

#[test]
fn test_release_drops_cached_parse() {
    let host = project();
    let mut engine = SyntaxEngine::new();
    engine.source_file(&host, "/project/util.ts").unwrap();
    assert_eq!(engine.cached_files(), 1);

    engine.release("/project/util.ts");
    assert_eq!(engine.cached_files(), 0);

    engine.source_file(&host, "/project/util.ts").unwrap();
    assert_eq!(engine.parse_count(), 2);
}

#[test]
fn test_reassemble_parsed_declarations() {
    let mut host = MapHost::new();
    host.put(
        "/dist/pad.ts",
        "export default function leftPad(str, len) {\n    return str.padStart(len);\n}\n",
    );
    host.put(
        "/dist/pad-temp.ts",
        "export interface PadOptions {\n    char?: string;\n}\nexport declare function leftPad(str: string, len: number): string;\n",
    );
    let mut engine = SyntaxEngine::new();
    let compiled = engine.source_file(&host, "/dist/pad.ts").unwrap();
    let declarations = engine.source_file(&host, "/dist/pad-temp.ts").unwrap();

    let merged = TypePreludeReassembler
        .reassemble(&compiled.statements, &declarations.statements)
        .unwrap();
    assert!(merged.content.starts_with("export interface PadOptions"));
    assert!(merged.content.contains("str.padStart(len)"));
}

#[test]
fn test_scanner_finds_fixture_imports() {
    let repo = arbor_core::test_utils::create_test_repo();
    let content = std::fs::read_to_string(repo.path().join("src/index.ts")).unwrap();
    let mut scanner = ImportScanner::new();
    let names: Vec<String> = scanner.scan(&content).into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["./services/user", "./util", "fs", "left-pad"]);
}
