//! Tree-sitter backed import scanning, syntax engine and reassembler

pub mod parser;
pub mod imports;
pub mod engine;
pub mod reassembler;

#[cfg(test)]
pub mod tests;

pub use parser::{SourceParser, ScriptKind};
pub use imports::{ImportScanner, ImportSpecifier, ImportKind};
pub use engine::SyntaxEngine;
pub use reassembler::TypePreludeReassembler;
