//! Keeps a language host in sync with the filesystem

pub mod watcher;

pub use watcher::{FileWatcher, WatchEvent, WatchOutcome, WatcherService};
