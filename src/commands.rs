//! CLI command implementations

use anyhow::Context as _;
use arbor_core::{HostOptions, ImportEdge, ImportGraph, ScriptHost};
use arbor_host::{AddFileOptions, LanguageHost};
use arbor_watcher::watcher::is_script_file;
use arbor_watcher::WatcherService;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Options shared by every command
pub struct Context {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
}

const CONFIG_FILE: &str = "arbor.toml";

pub fn version_string() -> String {
    format!("arbor v{}", env!("CARGO_PKG_VERSION"))
}

pub fn track(ctx: &Context, file: &str) -> anyhow::Result<()> {
    let mut host = build_host(ctx)?;
    let unit = host.add_file(AddFileOptions::new(file).with_imports())?;
    tracing::info!("Tracked {} ({} statements)", unit.file_name, unit.statements.len());
    print_tracked(ctx, &host)
}

pub fn imports(ctx: &Context, file: &str) -> anyhow::Result<()> {
    let mut host = build_host(ctx)?;
    let edges = host.imported_files_for_file(file)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&edges)?);
    } else {
        for edge in &edges {
            println!("{}", describe_edge(edge));
        }
    }
    Ok(())
}

pub fn closure(ctx: &Context, file: &str) -> anyhow::Result<()> {
    let mut host = build_host(ctx)?;
    let graph = host.expand_closure(file, None)?;
    tracing::info!(
        "Closure of {}: {} files, {} imports",
        file,
        graph.file_count(),
        graph.import_count()
    );
    print_graph(ctx, &graph)
}

pub fn index(ctx: &Context) -> anyhow::Result<()> {
    let mut host = build_host(ctx)?;
    let root = host.current_directory().to_path_buf();
    tracing::info!("Indexing repository: {}", root.display());

    let count = index_into(&mut host, &root);
    tracing::info!("Indexed {} files", count);
    print_tracked(ctx, &host)
}

pub async fn watch(ctx: &Context) -> anyhow::Result<()> {
    let mut host = build_host(ctx)?;
    let root = host.current_directory().to_path_buf();
    let count = index_into(&mut host, &root);
    tracing::info!("Indexed {} files, starting file watcher for {}", count, root.display());

    let service = WatcherService::new(&root, Arc::new(Mutex::new(host)))?.track_new_files(true);
    service.start_watching().await?;

    // Runs until the watcher shuts down
    service.process_events().await
}

/// Host rooted at the canonical repository root, with options applied.
fn build_host(ctx: &Context) -> anyhow::Result<LanguageHost> {
    let root = std::fs::canonicalize(&ctx.root)
        .with_context(|| format!("Cannot open repository root {}", ctx.root.display()))?;
    let mut host = LanguageHost::new(&root);

    let config = match &ctx.config {
        Some(path) => Some(path.clone()),
        None => Some(root.join(CONFIG_FILE)).filter(|path| path.is_file()),
    };
    if let Some(path) = config {
        host.set_options(HostOptions::load(&path)?)?;
        tracing::debug!("Applied options from {}", path.display());
    }
    Ok(host)
}

/// Track every script file under `root`, honouring ignore files.
/// Declaration files are skipped; they are read when their compiled sibling is added.
fn index_into(host: &mut LanguageHost, root: &Path) -> usize {
    let mut count = 0;
    for entry in ignore::WalkBuilder::new(root).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_script_file(path) || path.to_string_lossy().ends_with(".d.ts") {
            continue;
        }
        match host.add_file(AddFileOptions::new(path.to_string_lossy())) {
            Ok(_) => count += 1,
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    count
}

fn describe_edge(edge: &ImportEdge) -> String {
    format!("{} -> {}", edge.raw_path, edge.normalized_path)
}

fn print_tracked(ctx: &Context, host: &LanguageHost) -> anyhow::Result<()> {
    let files = host.tracked_files();
    if ctx.json {
        let entries: Vec<_> = files
            .iter()
            .map(|path| json!({ "path": path, "version": host.file_version(path) }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for path in &files {
            println!("{}\t{}", host.file_version(path), path);
        }
    }
    Ok(())
}

fn print_graph(ctx: &Context, graph: &ImportGraph) -> anyhow::Result<()> {
    if ctx.json {
        let files: serde_json::Map<_, _> = graph
            .files()
            .map(|file| (file.to_string(), json!(graph.imports_of(file))))
            .collect();
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        for file in graph.files() {
            println!("{}", file);
            for edge in graph.imports_of(file) {
                println!("  {}", describe_edge(edge));
            }
        }
    }
    Ok(())
}
