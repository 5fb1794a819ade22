//! Declaration reassembly for compiled output

use arbor_core::{Reassembled, Reassembler, ReassemblyError, Statement};

/// Places the type-only statements of a declaration file ahead of the
/// compiled body.
///
/// Function and class signatures are not spliced into the body; only
/// interfaces, type aliases and `declare` forms are carried over.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypePreludeReassembler;

impl Reassembler for TypePreludeReassembler {
    fn reassemble(
        &self,
        compiled: &[Statement],
        declarations: &[Statement],
    ) -> Result<Reassembled, ReassemblyError> {
        if let Some(broken) = declarations.iter().find(|statement| statement.kind == "ERROR") {
            return Err(ReassemblyError::Rejected {
                reason: format!(
                    "{} has a syntax error at byte {}",
                    broken.file_name, broken.span.start
                ),
            });
        }

        let mut content = String::new();
        let prelude = declarations.iter().filter(|statement| is_type_only(statement));
        for statement in prelude.chain(compiled.iter()) {
            content.push_str(&statement.text);
            content.push('\n');
        }
        Ok(Reassembled { content })
    }
}

fn is_type_only(statement: &Statement) -> bool {
    match statement.kind.as_str() {
        "interface_declaration" | "type_alias_declaration" | "ambient_declaration" => true,
        "export_statement" => {
            let rest = statement.text.strip_prefix("export").unwrap_or(&statement.text);
            let rest = rest.trim_start();
            let rest = rest.strip_prefix("default").map(str::trim_start).unwrap_or(rest);
            ["interface ", "type ", "declare "]
                .iter()
                .any(|keyword| rest.starts_with(keyword))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::TextSpan;

    fn statement(kind: &str, text: &str) -> Statement {
        Statement {
            kind: kind.to_string(),
            name: None,
            span: TextSpan::new(0, text.len()),
            text: text.to_string(),
            file_name: "/dist/a-temp.ts".to_string(),
        }
    }

    #[test]
    fn prelude_precedes_body() {
        let compiled = vec![statement("function_declaration", "function pad(s, n) { return s; }")];
        let declarations = vec![
            statement("export_statement", "export interface PadOptions { char?: string; }"),
            statement(
                "export_statement",
                "export declare function pad(s: string, n: number): string;",
            ),
            statement("export_statement", "export function other(): void;"),
            statement("type_alias_declaration", "type Width = number;"),
        ];
        let merged = TypePreludeReassembler.reassemble(&compiled, &declarations).unwrap();
        assert_eq!(
            merged.content,
            "export interface PadOptions { char?: string; }\n\
             export declare function pad(s: string, n: number): string;\n\
             type Width = number;\n\
             function pad(s, n) { return s; }\n"
        );
    }

    #[test]
    fn broken_declarations_are_rejected() {
        let declarations = vec![statement("ERROR", "export interface {")];
        let err = TypePreludeReassembler.reassemble(&[], &declarations).unwrap_err();
        assert!(matches!(err, ReassemblyError::Rejected { .. }));
    }
}
