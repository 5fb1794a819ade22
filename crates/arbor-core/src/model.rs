//! Core data structures for tracked files

use serde::{Deserialize, Serialize};

/// Suffix appended to a declaration file's base name while it takes part in a merge.
pub const TEMPORARY_DECLARATION_SUFFIX: &str = "-temp";

/// Extension every normalized path ends with.
pub const SOURCE_EXTENSION: &str = ".ts";

/// Extension of type declaration files.
pub const DECLARATION_EXTENSION: &str = ".d.ts";

/// Extension of compiled output files.
pub const COMPILED_EXTENSION: &str = ".js";

/// Version reported for paths that are not tracked.
pub const UNTRACKED_VERSION: i64 = -1;

/// The full marker a temporary declaration shim path ends with (`-temp.ts`).
pub fn temporary_declaration_addition() -> String {
    format!("{}{}", TEMPORARY_DECLARATION_SUFFIX, SOURCE_EXTENSION)
}

/// Canonical identity of a requested path.
///
/// Created once per distinct `(raw, origin)` pair and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathIdentity {
    /// Absolute path produced by module resolution (or the shim path itself).
    pub resolved_path: String,
    /// The form the analysis engine indexes files by.
    pub normalized_path: String,
    /// Marks synthetic declaration shims that only live during a merge.
    pub is_temporary: bool,
}

impl PathIdentity {
    /// Identity for a temporary declaration shim. Shims are never resolved.
    pub fn temporary(path: impl Into<String>) -> Self {
        let path = path.into();
        PathIdentity {
            resolved_path: path.clone(),
            normalized_path: path,
            is_temporary: true,
        }
    }

    /// Whether the path was a compiled output file before normalization.
    pub fn is_compiled_output(&self) -> bool {
        !self.is_temporary && self.resolved_path.ends_with(COMPILED_EXTENSION)
    }
}

/// The last known state of a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub version: i64,
    /// What the engine sees. Differs from `raw_content` after a declaration merge.
    pub content: String,
    /// What the caller or loader last supplied.
    pub raw_content: String,
}

/// Identity plus freshly observed content. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub identity: PathIdentity,
    pub needs_update: bool,
    pub raw_content: String,
    pub content: String,
}

impl PathInfo {
    pub fn normalized_path(&self) -> &str {
        &self.identity.normalized_path
    }

    pub fn resolved_path(&self) -> &str {
        &self.identity.resolved_path
    }
}

/// One statically detected import after filtering and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportEdge {
    /// The specifier exactly as written in the importing file.
    pub raw_path: String,
    pub resolved_path: String,
    pub normalized_path: String,
}

/// Stored contents of a file as returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
    pub raw_content: String,
}

impl From<&FileRecord> for FileContent {
    fn from(record: &FileRecord) -> Self {
        FileContent {
            content: record.content.clone(),
            raw_content: record.raw_content.clone(),
        }
    }
}

/// Whether a name can be handed to the engine without resolving it first.
///
/// The engine calls back with virtual names that the module resolver cannot
/// find, so anything already carrying a script extension is taken verbatim.
pub fn is_engine_file_name(name: &str) -> bool {
    name.ends_with(".ts") || name.ends_with(".tsx")
}
