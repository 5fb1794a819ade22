//! Path identity resolution with a per-instance memo

use crate::collaborators::{ModuleResolver, PathUtil};
use crate::error::ResolutionError;
use crate::model::{
    temporary_declaration_addition, PathIdentity, DECLARATION_EXTENSION, SOURCE_EXTENSION,
};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Memo key: the literal `(raw, origin)` pair.
type IdentityKey = (String, PathBuf);

/// Turns `(raw, origin)` pairs into [`PathIdentity`] values.
///
/// Results are cached for the resolver's lifetime and never evicted; the same
/// pair always yields the same `Arc`, whatever happened on disk in between.
pub struct PathResolver {
    memo: DashMap<IdentityKey, Arc<PathIdentity>>,
}

impl PathResolver {
    pub fn new() -> Self {
        PathResolver {
            memo: DashMap::new(),
        }
    }

    pub fn resolve(
        &self,
        raw: &str,
        origin: &Path,
        resolver: &dyn ModuleResolver,
        path_util: &dyn PathUtil,
    ) -> Result<Arc<PathIdentity>, ResolutionError> {
        let key = (raw.to_string(), origin.to_path_buf());
        if let Some(existing) = self.memo.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let identity = if is_temporary_path(raw) {
            PathIdentity::temporary(raw)
        } else {
            let resolved_path = resolver.resolve_path(raw, origin)?;
            let normalized_path = normalize_extension(&resolved_path, path_util);
            PathIdentity {
                resolved_path,
                normalized_path,
                is_temporary: false,
            }
        };

        tracing::debug!(
            "Resolved {} from {} to {}",
            raw,
            origin.display(),
            identity.normalized_path
        );
        let entry = self.memo.entry(key).or_insert_with(|| Arc::new(identity));
        Ok(Arc::clone(entry.value()))
    }

    /// Number of memoized pairs.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_temporary_path(path: &str) -> bool {
    path.ends_with(&temporary_declaration_addition())
}

/// Rewrite a resolved path into the form the engine indexes it by.
pub fn normalize_extension(path: &str, path_util: &dyn PathUtil) -> String {
    match path.strip_suffix(DECLARATION_EXTENSION) {
        Some(base) => format!("{}{}", base, SOURCE_EXTENSION),
        None => path_util.set_extension(path, SOURCE_EXTENSION),
    }
}

/// Shim path standing in for a declaration file during a merge.
pub fn temporary_path_for_declaration(declaration_path: &str) -> String {
    let base = declaration_path
        .strip_suffix(DECLARATION_EXTENSION)
        .unwrap_or(declaration_path);
    format!("{}{}", base, temporary_declaration_addition())
}

/// The declaration file a shim path was made from.
pub fn declaration_path_for_temporary(temporary_path: &str) -> String {
    let base = temporary_path
        .strip_suffix(&temporary_declaration_addition())
        .unwrap_or(temporary_path);
    format!("{}{}", base, DECLARATION_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NodeResolver, StdPathUtil};
    use crate::test_utils::create_repo_with_structure;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::collections::HashSet;

    /// Resolver that counts calls and maps every specifier under `/virtual`.
    struct CountingResolver {
        calls: AtomicUsize,
        built_ins: HashSet<String>,
    }

    impl ModuleResolver for CountingResolver {
        fn resolve_path(&self, raw: &str, _origin: &Path) -> Result<String, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("/virtual/{}", raw.trim_start_matches("./")))
        }

        fn built_in_modules(&self) -> &HashSet<String> {
            &self.built_ins
        }
    }

    #[test]
    fn identical_pairs_share_one_identity() {
        let resolver = CountingResolver {
            calls: AtomicUsize::new(0),
            built_ins: HashSet::new(),
        };
        let paths = PathResolver::new();
        let first = paths
            .resolve("./a.js", Path::new("/virtual"), &resolver, &StdPathUtil)
            .unwrap();
        let second = paths
            .resolve("./a.js", Path::new("/virtual"), &resolver, &StdPathUtil)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.resolved_path, "/virtual/a.js");
        assert_eq!(first.normalized_path, "/virtual/a.ts");
    }

    #[test]
    fn different_origins_are_separate_entries() {
        let resolver = CountingResolver {
            calls: AtomicUsize::new(0),
            built_ins: HashSet::new(),
        };
        let paths = PathResolver::new();
        paths
            .resolve("./a", Path::new("/one"), &resolver, &StdPathUtil)
            .unwrap();
        paths
            .resolve("./a", Path::new("/two"), &resolver, &StdPathUtil)
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn temporary_paths_skip_resolution() {
        let resolver = CountingResolver {
            calls: AtomicUsize::new(0),
            built_ins: HashSet::new(),
        };
        let paths = PathResolver::new();
        let identity = paths
            .resolve("/dist/a-temp.ts", Path::new("/"), &resolver, &StdPathUtil)
            .unwrap();
        assert!(identity.is_temporary);
        assert_eq!(identity.resolved_path, "/dist/a-temp.ts");
        assert_eq!(identity.normalized_path, "/dist/a-temp.ts");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn declaration_files_normalize_to_source() {
        assert_eq!(normalize_extension("/a/b.d.ts", &StdPathUtil), "/a/b.ts");
        assert_eq!(normalize_extension("/a/b.js", &StdPathUtil), "/a/b.ts");
        assert_eq!(normalize_extension("/a/b.ts", &StdPathUtil), "/a/b.ts");
    }

    #[test]
    fn shim_paths_round_trip_to_declaration() {
        let shim = temporary_path_for_declaration("/dist/a.d.ts");
        assert_eq!(shim, "/dist/a-temp.ts");
        assert!(is_temporary_path(&shim));
        assert_eq!(declaration_path_for_temporary(&shim), "/dist/a.d.ts");
    }

    #[test]
    fn memo_survives_content_changes() {
        let repo = create_repo_with_structure(&[("src/a.ts", "export const a = 1;")]);
        let paths = PathResolver::new();
        let resolver = NodeResolver::new();
        let first = paths
            .resolve("./src/a", repo.path(), &resolver, &StdPathUtil)
            .unwrap();
        std::fs::write(repo.path().join("src/a.ts"), "export const a = 2;").unwrap();
        let second = paths
            .resolve("./src/a", repo.path(), &resolver, &StdPathUtil)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_resolution_is_not_cached() {
        let repo = create_repo_with_structure(&[("src/a.ts", "")]);
        let paths = PathResolver::new();
        let resolver = NodeResolver::new();
        assert!(paths
            .resolve("./src/b", repo.path(), &resolver, &StdPathUtil)
            .is_err());
        assert!(paths.is_empty());
    }
}
