//! Filesystem watcher feeding changes into a language host

use anyhow::Result;
use arbor_core::AnalysisEngine;
use arbor_host::{AddFileOptions, LanguageHost};
use arbor_indexer::SyntaxEngine;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Events emitted by the file watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File or directory created
    Created(PathBuf),
    /// File or directory modified
    Modified(PathBuf),
    /// File or directory removed
    Removed(PathBuf),
    /// Batch of changes completed (debounced)
    ChangesFlushed,
}

/// What applying a [`WatchEvent`] did to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// New content was committed at `version`
    Updated { path: String, version: i64 },
    /// The file is tracked and its content did not change
    Unchanged { path: String },
    /// The file was dropped from the host
    Removed { path: String },
    /// Not a tracked script file
    Ignored,
}

/// File system watcher for monitoring script changes
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    watched_paths: HashSet<PathBuf>,
    root_path: PathBuf,
}

impl FileWatcher {
    /// Create a new file watcher for the given root path
    pub fn new(root_path: impl AsRef<Path>) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => {
                    debug!("File system event: {:?}", event);
                    Self::handle_notify_event(event, &event_tx);
                }
                Err(e) => {
                    error!("File system watch error: {}", e);
                }
            }
        })?;

        Ok(Self {
            watcher,
            event_rx,
            watched_paths: HashSet::new(),
            root_path,
        })
    }

    fn handle_notify_event(event: notify::Event, event_tx: &mpsc::UnboundedSender<WatchEvent>) {
        let make: fn(PathBuf) -> WatchEvent = match event.kind {
            notify::EventKind::Create(_) => WatchEvent::Created,
            notify::EventKind::Modify(_) => WatchEvent::Modified,
            notify::EventKind::Remove(_) => WatchEvent::Removed,
            _ => return,
        };
        for path in event.paths {
            if should_ignore_path(&path) {
                continue;
            }
            if let Err(e) = event_tx.send(make(path)) {
                warn!("Failed to send watch event: {}", e);
            }
        }
    }

    /// Watch a directory recursively
    pub fn watch_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Watching directory: {:?}", path);

        self.watcher.watch(path, RecursiveMode::Recursive)?;
        self.watched_paths.insert(path.to_path_buf());
        Ok(())
    }

    /// Watch a single file
    pub fn watch_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Watching file: {:?}", path);

        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched_paths.insert(path.to_path_buf());
        Ok(())
    }

    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Stopping watch for: {:?}", path);

        self.watcher.unwatch(path)?;
        self.watched_paths.remove(path);
        Ok(())
    }

    pub fn event_receiver(&mut self) -> &mut mpsc::UnboundedReceiver<WatchEvent> {
        &mut self.event_rx
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched_paths.contains(path)
    }

    pub fn watched_paths(&self) -> &HashSet<PathBuf> {
        &self.watched_paths
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

/// Applies filesystem changes to a shared [`LanguageHost`].
///
/// Only files the host already tracks are refreshed, unless
/// [`track_new_files`](Self::track_new_files) is set. Re-adding goes through
/// the host's change detection, so a save without edits keeps the version.
pub struct WatcherService<E: AnalysisEngine = SyntaxEngine> {
    watcher: Mutex<FileWatcher>,
    host: Arc<Mutex<LanguageHost<E>>>,
    track_new_files: bool,
}

impl<E: AnalysisEngine> WatcherService<E> {
    pub fn new(root_path: impl AsRef<Path>, host: Arc<Mutex<LanguageHost<E>>>) -> Result<Self> {
        Ok(Self {
            watcher: Mutex::new(FileWatcher::new(root_path)?),
            host,
            track_new_files: false,
        })
    }

    /// Also start tracking script files created under the root.
    pub fn track_new_files(mut self, track: bool) -> Self {
        self.track_new_files = track;
        self
    }

    pub fn host(&self) -> &Arc<Mutex<LanguageHost<E>>> {
        &self.host
    }

    /// Start watching the project directory
    pub async fn start_watching(&self) -> Result<()> {
        let mut watcher = self.watcher.lock().await;
        let root_path = watcher.root_path.clone();
        watcher.watch_directory(&root_path)?;

        info!("Started watching project directory: {:?}", root_path);
        Ok(())
    }

    /// Apply events until the watcher shuts down
    pub async fn process_events(&self) -> Result<()> {
        let mut watcher = self.watcher.lock().await;
        let event_rx = watcher.event_receiver();

        while let Some(event) = event_rx.recv().await {
            debug!("Processing watch event: {:?}", event);
            match self.apply_event(event).await {
                Ok(WatchOutcome::Updated { path, version }) => {
                    info!("Updated {} to version {}", path, version);
                }
                Ok(WatchOutcome::Removed { path }) => info!("Removed {}", path),
                Ok(_) => {}
                Err(e) => warn!("Failed to apply watch event: {:#}", e),
            }
        }

        Ok(())
    }

    /// Apply one event to the host.
    pub async fn apply_event(&self, event: WatchEvent) -> Result<WatchOutcome> {
        match event {
            WatchEvent::Created(path) => self.handle_file_change(&path, self.track_new_files).await,
            WatchEvent::Modified(path) => self.handle_file_change(&path, false).await,
            WatchEvent::Removed(path) => self.handle_file_removal(&path).await,
            WatchEvent::ChangesFlushed => {
                debug!("Batch of changes completed");
                Ok(WatchOutcome::Ignored)
            }
        }
    }

    async fn handle_file_change(&self, path: &Path, track_untracked: bool) -> Result<WatchOutcome> {
        if !is_script_file(path) || !path.is_file() {
            return Ok(WatchOutcome::Ignored);
        }
        if let Some(compiled) = compiled_sibling(path) {
            return self.handle_declaration_change(&compiled).await;
        }
        // Declarations are tracked under their `.ts` name.
        let name = match declaration_base(path) {
            Some(base) => format!("{}.ts", base),
            None => path.to_string_lossy().into_owned(),
        };
        let mut host = self.host.lock().await;
        let before = host.file_version(&name);
        if before < 0 && !track_untracked {
            return Ok(WatchOutcome::Ignored);
        }

        let content = tokio::fs::read_to_string(path).await?;
        host.add_file(AddFileOptions::new(path.to_string_lossy()).content(content))?;
        let version = host.file_version(&name);
        if version == before {
            Ok(WatchOutcome::Unchanged { path: name })
        } else {
            Ok(WatchOutcome::Updated { path: name, version })
        }
    }

    /// A sibling `.d.ts` changed: merge the tracked compiled file again.
    async fn handle_declaration_change(&self, compiled: &Path) -> Result<WatchOutcome> {
        let name = compiled.to_string_lossy().into_owned();
        let mut host = self.host.lock().await;
        if host.file_version(&name) < 0 {
            return Ok(WatchOutcome::Ignored);
        }
        if host.refresh_declarations(&name)? {
            let version = host.file_version(&name);
            Ok(WatchOutcome::Updated { path: name, version })
        } else {
            Ok(WatchOutcome::Unchanged { path: name })
        }
    }

    async fn handle_file_removal(&self, path: &Path) -> Result<WatchOutcome> {
        if !is_script_file(path) {
            return Ok(WatchOutcome::Ignored);
        }
        if let Some(compiled) = compiled_sibling(path) {
            return self.handle_declaration_change(&compiled).await;
        }
        let name = path.to_string_lossy().into_owned();
        let mut host = self.host.lock().await;
        if host.remove_file(&name) {
            return Ok(WatchOutcome::Removed { path: name });
        }
        // Deleted compiled files and declarations no longer resolve to their tracked name.
        let base = match declaration_base(path) {
            Some(base) => base,
            None => path.with_extension("").to_string_lossy().into_owned(),
        };
        let normalized = format!("{}.ts", base);
        if normalized != name && host.remove_file(&normalized) {
            return Ok(WatchOutcome::Removed { path: normalized });
        }
        Ok(WatchOutcome::Ignored)
    }
}

/// Path of `x.d.ts` without its extension.
fn declaration_base(path: &Path) -> Option<String> {
    path.to_str()?.strip_suffix(".d.ts").map(str::to_string)
}

/// The compiled file a declaration file describes, when one exists.
fn compiled_sibling(path: &Path) -> Option<PathBuf> {
    let base = declaration_base(path)?;
    COMPILED_EXTENSIONS
        .iter()
        .map(|extension| PathBuf::from(format!("{}{}", base, extension)))
        .find(|candidate| candidate.is_file())
}

const COMPILED_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

/// Script sources the host can track
pub fn is_script_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs")
    )
}

/// Check if a path should be ignored (e.g., target/, .git/, etc.)
pub fn should_ignore_path(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(
            component.as_os_str().to_str(),
            Some("target" | ".git" | "node_modules")
        )
    })
}
