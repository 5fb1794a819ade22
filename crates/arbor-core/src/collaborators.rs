//! Capabilities the host is built from: loading, module resolution, path
//! manipulation and declaration reassembly
//!
//! Each capability is a trait so callers can inject their own; the structs in
//! this module are the filesystem-backed defaults.

use crate::engine::Statement;
use crate::error::{LoadError, ReassemblyError, ResolutionError};
use crate::model::DECLARATION_EXTENSION;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Reads file contents.
pub trait FileLoader: Send + Sync {
    fn load_sync(&self, path: &Path) -> Result<String, LoadError>;

    /// First `base + extension` that exists, trying `extensions` in order.
    fn first_existing_with_extension(&self, base: &str, extensions: &[&str]) -> Option<String>;
}

/// Maps module specifiers to files.
pub trait ModuleResolver: Send + Sync {
    fn resolve_path(&self, raw: &str, origin: &Path) -> Result<String, ResolutionError>;

    /// Names that always refer to runtime built-ins.
    fn built_in_modules(&self) -> &HashSet<String>;

    fn is_built_in(&self, name: &str) -> bool {
        let modules = self.built_in_modules();
        modules.contains(name)
            || name
                .strip_prefix("node:")
                .is_some_and(|stripped| modules.contains(stripped))
    }
}

/// Extension manipulation on path strings.
pub trait PathUtil: Send + Sync {
    fn set_extension(&self, path: &str, extension: &str) -> String;
    fn clear_extension(&self, path: &str) -> String;
}

/// Output of a declaration merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub content: String,
}

/// Merges compiled statements with the signatures of a declaration file.
pub trait Reassembler: Send + Sync {
    fn reassemble(
        &self,
        compiled: &[Statement],
        declarations: &[Statement],
    ) -> Result<Reassembled, ReassemblyError>;
}

/// Loads files straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FileLoader for FsLoader {
    fn load_sync(&self, path: &Path) -> Result<String, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| LoadError::NotUtf8 {
            path: path.to_path_buf(),
        })
    }

    fn first_existing_with_extension(&self, base: &str, extensions: &[&str]) -> Option<String> {
        extensions
            .iter()
            .map(|extension| format!("{}{}", base, extension))
            .find(|candidate| Path::new(candidate).is_file())
    }
}

/// Extension handling that treats `.d.ts` as a single extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdPathUtil;

impl PathUtil for StdPathUtil {
    fn set_extension(&self, path: &str, extension: &str) -> String {
        format!("{}{}", self.clear_extension(path), extension)
    }

    fn clear_extension(&self, path: &str) -> String {
        if let Some(stripped) = path.strip_suffix(DECLARATION_EXTENSION) {
            return stripped.to_string();
        }
        let file_start = path.rfind(['/', '\\']).map_or(0, |idx| idx + 1);
        match path[file_start..].rfind('.') {
            // A leading dot names a hidden file, not an extension.
            Some(dot) if dot > 0 => path[..file_start + dot].to_string(),
            _ => path.to_string(),
        }
    }
}

/// Runtime built-ins of Node.js.
const NODE_BUILT_INS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

/// Extensions tried, in order, when a specifier omits one. Runtime files are
/// tried before declarations.
const RESOLVE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".d.ts"];

/// `package.json` fields that may point at a package's entry file, runtime entry first.
const PACKAGE_ENTRY_FIELDS: &[&str] = &["main", "types", "typings"];

/// Node-style module resolution.
///
/// Relative and absolute specifiers are tried with the script extensions and
/// as directories with an `index` file. Bare specifiers are looked up in the
/// `node_modules` directories of every ancestor of the origin, falling back to
/// a path relative to the origin when no package matches.
#[derive(Debug, Clone)]
pub struct NodeResolver {
    built_ins: HashSet<String>,
}

impl NodeResolver {
    pub fn new() -> Self {
        NodeResolver {
            built_ins: NODE_BUILT_INS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Replace the built-in module set.
    pub fn with_built_ins<I, S>(built_ins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeResolver {
            built_ins: built_ins.into_iter().map(Into::into).collect(),
        }
    }

    fn locate_file(base: &Path) -> Option<PathBuf> {
        if base.is_file() {
            return Some(base.to_path_buf());
        }
        let base = base.to_string_lossy();
        RESOLVE_EXTENSIONS
            .iter()
            .map(|extension| PathBuf::from(format!("{}{}", base, extension)))
            .find(|candidate| candidate.is_file())
    }

    fn locate_directory(dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        Self::package_entry(dir).or_else(|| Self::locate_file(&dir.join("index")))
    }

    fn package_entry(dir: &Path) -> Option<PathBuf> {
        let manifest = std::fs::read_to_string(dir.join("package.json")).ok()?;
        let manifest: serde_json::Value = match serde_json::from_str(&manifest) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Ignoring malformed package.json in {}: {}", dir.display(), e);
                return None;
            }
        };
        PACKAGE_ENTRY_FIELDS
            .iter()
            .filter_map(|field| manifest.get(*field).and_then(|value| value.as_str()))
            .find_map(|entry| {
                let entry = clean_path(&dir.join(entry));
                Self::locate_file(&entry).or_else(|| {
                    if entry.is_dir() {
                        Self::locate_file(&entry.join("index"))
                    } else {
                        None
                    }
                })
            })
    }

    fn locate(base: &Path) -> Option<PathBuf> {
        Self::locate_file(base).or_else(|| Self::locate_directory(base))
    }
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleResolver for NodeResolver {
    fn resolve_path(&self, raw: &str, origin: &Path) -> Result<String, ResolutionError> {
        if raw.trim().is_empty() {
            return Err(ResolutionError::InvalidSpecifier(raw.to_string()));
        }
        let dir = origin_directory(origin);
        let not_found = || ResolutionError::NotFound {
            specifier: raw.to_string(),
            origin: origin.to_path_buf(),
        };

        let resolved = if Path::new(raw).is_absolute() {
            Self::locate(&clean_path(Path::new(raw)))
        } else if is_relative_specifier(raw) {
            Self::locate(&clean_path(&dir.join(raw)))
        } else {
            dir.ancestors()
                .map(|ancestor| ancestor.join("node_modules").join(raw))
                .find_map(|candidate| Self::locate(&candidate))
                .or_else(|| Self::locate(&clean_path(&dir.join(raw))))
        };

        resolved
            .map(|path| path.to_string_lossy().into_owned())
            .ok_or_else(not_found)
    }

    fn built_in_modules(&self) -> &HashSet<String> {
        &self.built_ins
    }
}

fn is_relative_specifier(raw: &str) -> bool {
    raw == "." || raw == ".." || raw.starts_with("./") || raw.starts_with("../")
}

/// Directory specifiers are resolved against. A file origin resolves from its parent.
pub fn origin_directory(origin: &Path) -> PathBuf {
    let looks_like_file = origin.is_file() || (origin.extension().is_some() && !origin.is_dir());
    if looks_like_file {
        origin.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        origin.to_path_buf()
    }
}

/// Lexically remove `.` and `..` components.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
