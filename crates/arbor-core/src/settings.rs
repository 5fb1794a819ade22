//! Compiler settings and host configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Language level the engine targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptTarget {
    ES5,
    ES2015,
    ES2016,
    ES2017,
    ES2018,
    ES2019,
    ES2020,
    ESNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    CommonJS,
    AMD,
    UMD,
    System,
    ES2015,
    ESNext,
}

/// The fixed settings object handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    pub target: ScriptTarget,
    pub module: ModuleKind,
    pub lib: Vec<String>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            target: ScriptTarget::ES2017,
            module: ModuleKind::ESNext,
            lib: [
                "es2015.promise",
                "dom",
                "es6",
                "scripthost",
                "es7",
                "es2017.object",
                "es2015.proxy",
            ]
            .iter()
            .map(|lib| lib.to_string())
            .collect(),
        }
    }
}

impl CompilerSettings {
    /// File name of the default library for these settings, e.g. `lib.es2017.full.d.ts`.
    pub fn default_lib_file_name(&self) -> &'static str {
        match self.target {
            ScriptTarget::ES5 => "lib.d.ts",
            ScriptTarget::ES2015 => "lib.es6.d.ts",
            ScriptTarget::ES2016 => "lib.es2016.full.d.ts",
            ScriptTarget::ES2017 => "lib.es2017.full.d.ts",
            ScriptTarget::ES2018 => "lib.es2018.full.d.ts",
            ScriptTarget::ES2019 => "lib.es2019.full.d.ts",
            ScriptTarget::ES2020 => "lib.es2020.full.d.ts",
            ScriptTarget::ESNext => "lib.esnext.full.d.ts",
        }
    }
}

/// Looks up the directory holding the engine's bundled library files.
pub trait LibraryLocator: Send + Sync {
    fn default_lib_path(&self, settings: &CompilerSettings) -> PathBuf;
}

/// Library files live in a fixed directory.
#[derive(Debug, Clone)]
pub struct LibDirectory(pub PathBuf);

impl LibraryLocator for LibDirectory {
    fn default_lib_path(&self, settings: &CompilerSettings) -> PathBuf {
        self.0.join(settings.default_lib_file_name())
    }
}

/// Host options. Every field is optional so a partial table only touches what it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOptions {
    /// Regular expressions matched against normalized paths.
    pub excluded_files: Option<Vec<String>>,
    /// Glob patterns matched against normalized paths.
    pub excluded_globs: Option<Vec<String>>,
    pub compiler_settings: Option<CompilerSettings>,
}

impl HostOptions {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read options from an `arbor.toml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded host options from {}", path.display());
        Ok(options)
    }
}
