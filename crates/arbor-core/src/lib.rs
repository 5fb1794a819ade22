//! Arbor Core — path identities, versioned file store, and the contracts
//! between the language host, its collaborators and the analysis engine

pub mod model;
pub mod error;
pub mod collaborators;
pub mod engine;
pub mod identity;
pub mod store;
pub mod exclusion;
pub mod settings;
pub mod graph;


#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use model::{
    is_engine_file_name, FileContent, FileRecord, ImportEdge, PathIdentity, PathInfo,
    UNTRACKED_VERSION,
};
pub use error::{ResolutionError, LoadError, ReassemblyError, ConfigError, HostError, HostResult};
pub use collaborators::{
    FileLoader, FsLoader, ModuleResolver, NodeResolver, PathUtil, Reassembled, Reassembler,
    StdPathUtil,
};
pub use engine::{
    AnalysisEngine, DefinitionInfo, ImplementationLocation, QuickInfo, ReferenceEntry,
    ReferencedSymbol, ScriptHost, SourcePosition, SourceUnit, Statement, TextSpan,
};
pub use identity::PathResolver;
pub use store::FileStore;
pub use exclusion::ExclusionSet;
pub use settings::{
    CompilerSettings, HostOptions, LibDirectory, LibraryLocator, ModuleKind, ScriptTarget,
};
pub use graph::ImportGraph;
