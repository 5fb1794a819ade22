//! Restoring type information for compiled output files

use crate::host::LanguageHost;
use arbor_core::identity::temporary_path_for_declaration;
use arbor_core::model::DECLARATION_EXTENSION;
use arbor_core::{AnalysisEngine, FileRecord, HostResult, PathInfo, ReassemblyError};
use std::sync::Arc;
use tracing::debug;

/// Version given to the short-lived records a merge registers.
const TEMPORARY_VERSION: i64 = 0;

impl<E: AnalysisEngine> LanguageHost<E> {
    /// Content the engine should see for `info`.
    ///
    /// A compiled `.js` file with a sibling `.d.ts` is merged with it; every
    /// other file is returned as observed. The store is left as it was found.
    pub(crate) fn maybe_reassemble(&mut self, info: &PathInfo) -> HostResult<String> {
        if !info.identity.is_compiled_output() {
            return Ok(info.raw_content.clone());
        }
        let base = self.state.path_util.clear_extension(info.resolved_path());
        let Some(declaration_path) = self
            .state
            .loader
            .first_existing_with_extension(&base, &[DECLARATION_EXTENSION])
        else {
            return Ok(info.raw_content.clone());
        };

        let shim = self.get_add_path(&temporary_path_for_declaration(&declaration_path), None)?;
        let declarations = self.path_info_for(&shim, None)?;
        debug!(
            "Reassembling {} with {}",
            info.resolved_path(),
            declaration_path
        );

        let compiled_name = info.normalized_path();
        let shim_name = shim.normalized_path.as_str();
        let set_aside = [
            (compiled_name, self.state.store.remove(compiled_name)),
            (shim_name, self.state.store.remove(shim_name)),
        ];

        for (name, content) in [
            (compiled_name, &info.raw_content),
            (shim_name, &declarations.raw_content),
        ] {
            self.engine.release(name);
            self.state.store.insert(
                name,
                FileRecord {
                    version: TEMPORARY_VERSION,
                    content: content.clone(),
                    raw_content: content.clone(),
                },
            );
        }

        let compiled_unit = self.engine.source_file(&self.state, compiled_name);
        let declaration_unit = self.engine.source_file(&self.state, shim_name);

        for (name, previous) in set_aside {
            self.state.store.remove(name);
            self.engine.release(name);
            if let Some(previous) = previous {
                self.state.store.insert(name, previous);
            }
        }

        let compiled_unit = require_unit(compiled_unit, compiled_name)?;
        let declaration_unit = require_unit(declaration_unit, shim_name)?;
        let merged = self
            .state
            .reassembler
            .reassemble(&compiled_unit.statements, &declaration_unit.statements)?;
        Ok(merged.content)
    }
}

fn require_unit<T>(unit: Option<Arc<T>>, path: &str) -> Result<Arc<T>, ReassemblyError> {
    unit.ok_or_else(|| ReassemblyError::MissingStatements {
        path: path.to_string(),
    })
}
