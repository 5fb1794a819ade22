//! The language host: tracked files, their versions, and the engine fed from them

use arbor_core::identity::{declaration_path_for_temporary, is_temporary_path};
use arbor_core::{
    is_engine_file_name, AnalysisEngine, CompilerSettings, ExclusionSet, FileContent, FileLoader,
    FileStore, FsLoader, HostError, HostOptions, HostResult, ImportGraph, LibDirectory,
    LibraryLocator, ModuleResolver, NodeResolver, PathIdentity, PathInfo, PathResolver, PathUtil,
    Reassembler, ScriptHost, SourceUnit, StdPathUtil,
};
use arbor_indexer::{ImportScanner, SyntaxEngine, TypePreludeReassembler};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// What to add or fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddFileOptions {
    /// Raw path: relative, absolute, a bare module specifier or a shim path.
    pub path: String,
    /// Origin the path is resolved from. Defaults to the host's working directory.
    pub from: Option<PathBuf>,
    /// Content to use instead of loading the file.
    pub content: Option<String>,
    /// Also track every file the added file imports, transitively.
    pub add_imported_files: bool,
}

impl AddFileOptions {
    pub fn new(path: impl Into<String>) -> Self {
        AddFileOptions {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn origin(mut self, from: impl Into<PathBuf>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_imports(mut self) -> Self {
        self.add_imported_files = true;
        self
    }
}

/// `get_file` takes the same options as `add_file`, which it falls back to.
pub type GetFileOptions = AddFileOptions;

/// Everything the engine can see through [`ScriptHost`].
pub(crate) struct HostState {
    pub(crate) cwd: PathBuf,
    pub(crate) settings: CompilerSettings,
    pub(crate) lib_locator: Box<dyn LibraryLocator>,
    pub(crate) paths: PathResolver,
    pub(crate) store: FileStore,
    pub(crate) exclusions: ExclusionSet,
    pub(crate) loader: Box<dyn FileLoader>,
    pub(crate) resolver: Box<dyn ModuleResolver>,
    pub(crate) path_util: Box<dyn PathUtil>,
    pub(crate) reassembler: Box<dyn Reassembler>,
}

impl ScriptHost for HostState {
    fn current_directory(&self) -> &Path {
        &self.cwd
    }

    fn compilation_settings(&self) -> &CompilerSettings {
        &self.settings
    }

    fn default_lib_file_name(&self, settings: &CompilerSettings) -> PathBuf {
        self.lib_locator.default_lib_path(settings)
    }

    fn script_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.store.paths().map(str::to_string).collect();
        names.sort();
        names
    }

    fn script_version(&self, file_name: &str) -> String {
        self.store.version(file_name).to_string()
    }

    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>> {
        self.store
            .get(file_name)
            .map(|record| Arc::from(record.content.as_str()))
    }
}

/// Tracks files for an [`AnalysisEngine`] and keeps their versions current.
///
/// Not internally synchronized: callers sharing a host across threads or
/// tasks must serialize access to it.
pub struct LanguageHost<E: AnalysisEngine = SyntaxEngine> {
    pub(crate) state: HostState,
    pub(crate) engine: E,
    pub(crate) scanner: ImportScanner,
}

impl LanguageHost<SyntaxEngine> {
    /// A host with the filesystem-backed collaborators and the syntax engine.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        LanguageHostBuilder::new().current_directory(cwd).build()
    }

    pub fn builder() -> LanguageHostBuilder<SyntaxEngine> {
        LanguageHostBuilder::new()
    }
}

impl<E: AnalysisEngine> LanguageHost<E> {
    /// Apply options. Exclusions accumulate; settings replace the current ones.
    pub fn set_options(&mut self, options: HostOptions) -> HostResult<()> {
        for pattern in options.excluded_files.unwrap_or_default() {
            self.state.exclusions.add_regex_str(&pattern)?;
        }
        for pattern in options.excluded_globs.unwrap_or_default() {
            self.state.exclusions.add_glob_str(&pattern)?;
        }
        if let Some(settings) = options.compiler_settings {
            debug!("Compiler settings now target {:?}", settings.target);
            self.state.settings = settings;
        }
        Ok(())
    }

    /// Keep files matching any of `patterns` out of import closures.
    /// A single pattern can be passed as `[pattern]` or `Some(pattern)`.
    pub fn exclude_files<I>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = Regex>,
    {
        self.state.exclusions.add_regexes(patterns);
    }

    /// Resolve a path to its identity. Identical `(path, from)` pairs always
    /// return the same `Arc`.
    pub fn get_add_path(&self, path: &str, from: Option<&Path>) -> HostResult<Arc<PathIdentity>> {
        let origin = from.unwrap_or(self.state.cwd.as_path());
        let identity = self.state.paths.resolve(
            path,
            origin,
            self.state.resolver.as_ref(),
            self.state.path_util.as_ref(),
        )?;
        Ok(identity)
    }

    /// Resolve a path and observe its current content without touching the store.
    pub fn get_path_info(
        &self,
        path: &str,
        from: Option<&Path>,
        content: Option<String>,
    ) -> HostResult<PathInfo> {
        let identity = self.get_add_path(path, from)?;
        self.path_info_for(&identity, content)
    }

    /// Observe the content of an already resolved identity. Content that is
    /// neither supplied nor stored is loaded.
    pub(crate) fn path_info_for(
        &self,
        identity: &PathIdentity,
        content: Option<String>,
    ) -> HostResult<PathInfo> {
        let raw_content = match content {
            Some(content) => content,
            None => match self.state.store.get(&identity.normalized_path) {
                Some(record) => {
                    debug!("Using stored content of {}", identity.normalized_path);
                    record.raw_content.clone()
                }
                None => self.load(identity)?,
            },
        };
        let needs_update = self
            .state
            .store
            .needs_update(&identity.normalized_path, &raw_content);
        Ok(PathInfo {
            identity: identity.clone(),
            needs_update,
            content: raw_content.clone(),
            raw_content,
        })
    }

    fn load(&self, identity: &PathIdentity) -> HostResult<String> {
        let path = if identity.is_temporary {
            declaration_path_for_temporary(&identity.resolved_path)
        } else {
            identity.resolved_path.clone()
        };
        Ok(self.state.loader.load_sync(Path::new(&path))?)
    }

    /// Track a file and return the engine's parsed unit for it.
    pub fn add_file(&mut self, options: AddFileOptions) -> HostResult<Arc<SourceUnit>> {
        let info = self.get_path_info(&options.path, options.from.as_deref(), options.content)?;
        self.add_path_info(info, options.add_imported_files)
    }

    /// Like [`add_file`](Self::add_file) for a path that was already observed.
    pub fn add_path_info(
        &mut self,
        info: PathInfo,
        add_imported_files: bool,
    ) -> HostResult<Arc<SourceUnit>> {
        if self.commit_path_info(&info)? {
            if add_imported_files {
                self.walk_imports(&info, &mut ImportGraph::new());
            }
        } else {
            debug!("{} is up to date", info.normalized_path());
        }
        self.parsed_unit(info.normalized_path())
    }

    /// Return the parsed unit of a file, adding it first when it is not
    /// tracked or its content changed.
    pub fn get_file(&mut self, options: GetFileOptions) -> HostResult<Arc<SourceUnit>> {
        let info = self.get_path_info(&options.path, options.from.as_deref(), options.content)?;
        if !info.needs_update {
            if let Some(unit) = self.engine.source_file(&self.state, info.normalized_path()) {
                return Ok(unit);
            }
        }
        self.add_path_info(info, options.add_imported_files)
    }

    /// Merge a tracked compiled file with its declarations again, keeping its
    /// raw content. Used when only the sibling `.d.ts` changed, which raw
    /// content comparison cannot see. Returns whether a new version was committed.
    pub fn refresh_declarations(&mut self, name: &str) -> HostResult<bool> {
        let identity = self.get_add_path(name, None)?;
        let Some(stored) = self.state.store.get(&identity.normalized_path).cloned() else {
            return Ok(false);
        };
        let info = self.path_info_for(&identity, Some(stored.raw_content))?;
        let content = self.maybe_reassemble(&info)?;
        if content == stored.content {
            debug!("Declarations of {} are unchanged", info.normalized_path());
            return Ok(false);
        }
        let version =
            self.state
                .store
                .commit(info.normalized_path(), info.raw_content.clone(), content);
        debug!("Recommitted {} at version {}", info.normalized_path(), version);
        Ok(true)
    }

    /// Stop tracking a file. Returns whether a record existed.
    pub fn remove_file(&mut self, name: &str) -> bool {
        let file_name = self.normalize_name(name);
        let removed = self.state.store.remove(&file_name).is_some();
        self.engine.release(&file_name);
        if removed {
            debug!("Removed {}", file_name);
        }
        removed
    }

    /// Current version of a file, `-1` when it is not tracked.
    pub fn file_version(&self, name: &str) -> i64 {
        self.state.store.version(&self.normalize_name(name))
    }

    /// Stored content of a file; both fields are empty when it is not tracked.
    pub fn file_content(&self, name: &str) -> FileContent {
        self.state
            .store
            .get(&self.normalize_name(name))
            .map(FileContent::from)
            .unwrap_or_default()
    }

    /// Normalized paths of every tracked file, sorted.
    pub fn tracked_files(&self) -> Vec<String> {
        self.state.script_file_names()
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.state.exclusions
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Commit new content when the observed content differs from the stored.
    /// Returns whether a commit happened.
    pub(crate) fn commit_path_info(&mut self, info: &PathInfo) -> HostResult<bool> {
        if !info.needs_update {
            return Ok(false);
        }
        let content = self.maybe_reassemble(info)?;
        let version =
            self.state
                .store
                .commit(info.normalized_path(), info.raw_content.clone(), content);
        debug!("Committed {} at version {}", info.normalized_path(), version);
        Ok(true)
    }

    pub(crate) fn parsed_unit(&mut self, file_name: &str) -> HostResult<Arc<SourceUnit>> {
        self.engine
            .source_file(&self.state, file_name)
            .ok_or_else(|| HostError::EngineUnavailable {
                path: file_name.to_string(),
            })
    }

    /// Map a caller-supplied name to a store key. Tracked names and absolute
    /// engine names are used as they are; anything else is resolved, falling
    /// back to the name itself when resolution fails.
    pub(crate) fn normalize_name(&self, name: &str) -> String {
        if self.state.store.contains(name)
            || is_temporary_path(name)
            || (is_engine_file_name(name) && Path::new(name).is_absolute())
        {
            return name.to_string();
        }
        match self.get_add_path(name, None) {
            Ok(identity) => identity.normalized_path.clone(),
            Err(e) => {
                debug!("Using {} as given: {}", name, e);
                name.to_string()
            }
        }
    }

    /// Like [`normalize_name`](Self::normalize_name), but a name that is
    /// neither tracked nor resolvable is an error.
    pub(crate) fn engine_name(&self, name: &str) -> HostResult<String> {
        if self.state.store.contains(name) {
            return Ok(name.to_string());
        }
        Ok(self.get_add_path(name, None)?.normalized_path.clone())
    }
}

impl<E: AnalysisEngine> ScriptHost for LanguageHost<E> {
    fn current_directory(&self) -> &Path {
        self.state.current_directory()
    }

    fn compilation_settings(&self) -> &CompilerSettings {
        self.state.compilation_settings()
    }

    fn default_lib_file_name(&self, settings: &CompilerSettings) -> PathBuf {
        self.state.default_lib_file_name(settings)
    }

    fn script_file_names(&self) -> Vec<String> {
        self.state.script_file_names()
    }

    fn script_version(&self, file_name: &str) -> String {
        self.state.script_version(file_name)
    }

    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>> {
        self.state.script_snapshot(file_name)
    }
}

/// Wires a [`LanguageHost`] from its collaborators. Anything not supplied
/// falls back to the filesystem-backed defaults.
pub struct LanguageHostBuilder<E: AnalysisEngine = SyntaxEngine> {
    cwd: Option<PathBuf>,
    settings: CompilerSettings,
    lib_locator: Option<Box<dyn LibraryLocator>>,
    loader: Box<dyn FileLoader>,
    resolver: Box<dyn ModuleResolver>,
    path_util: Box<dyn PathUtil>,
    reassembler: Box<dyn Reassembler>,
    engine: E,
}

impl LanguageHostBuilder<SyntaxEngine> {
    pub fn new() -> Self {
        LanguageHostBuilder {
            cwd: None,
            settings: CompilerSettings::default(),
            lib_locator: None,
            loader: Box::new(FsLoader),
            resolver: Box::new(NodeResolver::new()),
            path_util: Box::new(StdPathUtil),
            reassembler: Box::new(TypePreludeReassembler),
            engine: SyntaxEngine::new(),
        }
    }
}

impl Default for LanguageHostBuilder<SyntaxEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AnalysisEngine> LanguageHostBuilder<E> {
    pub fn current_directory(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn compiler_settings(mut self, settings: CompilerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn lib_locator(mut self, locator: impl LibraryLocator + 'static) -> Self {
        self.lib_locator = Some(Box::new(locator));
        self
    }

    pub fn loader(mut self, loader: impl FileLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn path_util(mut self, path_util: impl PathUtil + 'static) -> Self {
        self.path_util = Box::new(path_util);
        self
    }

    pub fn reassembler(mut self, reassembler: impl Reassembler + 'static) -> Self {
        self.reassembler = Box::new(reassembler);
        self
    }

    /// Swap the analysis engine.
    pub fn engine<F: AnalysisEngine>(self, engine: F) -> LanguageHostBuilder<F> {
        LanguageHostBuilder {
            cwd: self.cwd,
            settings: self.settings,
            lib_locator: self.lib_locator,
            loader: self.loader,
            resolver: self.resolver,
            path_util: self.path_util,
            reassembler: self.reassembler,
            engine,
        }
    }

    pub fn build(self) -> LanguageHost<E> {
        let cwd = self
            .cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let lib_locator = self.lib_locator.unwrap_or_else(|| {
            Box::new(LibDirectory(cwd.join("node_modules").join("typescript").join("lib")))
        });

        LanguageHost {
            state: HostState {
                cwd,
                settings: self.settings,
                lib_locator,
                paths: PathResolver::new(),
                store: FileStore::new(),
                exclusions: ExclusionSet::new(),
                loader: self.loader,
                resolver: self.resolver,
                path_util: self.path_util,
                reassembler: self.reassembler,
            },
            engine: self.engine,
            scanner: ImportScanner::new(),
        }
    }
}
