//! Error types shared by the arbor crates

use std::path::PathBuf;
use thiserror::Error;

/// A path or module specifier could not be mapped to a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("cannot resolve '{specifier}' from {}", origin.display())]
    NotFound { specifier: String, origin: PathBuf },
    #[error("invalid module specifier '{0}'")]
    InvalidSpecifier(String),
}

/// File contents could not be read.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },
}

/// The reassembler rejected a compiled/declaration pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    #[error("reassembly rejected: {reason}")]
    Rejected { reason: String },
    #[error("no parsed statements available for {path}")]
    MissingStatements { path: String },
}

/// Configuration could not be loaded or contains invalid patterns.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors surfaced by the language host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The engine produced no parsed unit for a file that is tracked.
    #[error("analysis engine has no source file for {path}")]
    EngineUnavailable { path: String },
}

pub type HostResult<T> = Result<T, HostError>;
