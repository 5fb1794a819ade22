//! Queries answered by the analysis engine
//!
//! Each query comes in two forms: by path and offset, where the path is
//! resolved first, and by a position the engine already handed out. Results
//! are passed through untouched.

use crate::host::LanguageHost;
use arbor_core::{
    AnalysisEngine, DefinitionInfo, HostResult, ImplementationLocation, QuickInfo,
    ReferencedSymbol, SourcePosition,
};

impl<E: AnalysisEngine> LanguageHost<E> {
    pub fn definition_at(
        &mut self,
        name: &str,
        offset: usize,
    ) -> HostResult<Option<Vec<DefinitionInfo>>> {
        let file_name = self.engine_name(name)?;
        Ok(self.engine.definition_at_position(&self.state, &file_name, offset))
    }

    pub fn definition_at_node(&mut self, position: &SourcePosition) -> Option<Vec<DefinitionInfo>> {
        self.engine
            .definition_at_position(&self.state, &position.file_name, position.offset)
    }

    pub fn type_definition_at(
        &mut self,
        name: &str,
        offset: usize,
    ) -> HostResult<Option<Vec<DefinitionInfo>>> {
        let file_name = self.engine_name(name)?;
        Ok(self
            .engine
            .type_definition_at_position(&self.state, &file_name, offset))
    }

    pub fn type_definition_at_node(
        &mut self,
        position: &SourcePosition,
    ) -> Option<Vec<DefinitionInfo>> {
        self.engine
            .type_definition_at_position(&self.state, &position.file_name, position.offset)
    }

    pub fn references_at(
        &mut self,
        name: &str,
        offset: usize,
    ) -> HostResult<Option<Vec<ReferencedSymbol>>> {
        let file_name = self.engine_name(name)?;
        Ok(self.engine.find_references(&self.state, &file_name, offset))
    }

    pub fn references_at_node(
        &mut self,
        position: &SourcePosition,
    ) -> Option<Vec<ReferencedSymbol>> {
        self.engine
            .find_references(&self.state, &position.file_name, position.offset)
    }

    pub fn implementation_at(
        &mut self,
        name: &str,
        offset: usize,
    ) -> HostResult<Option<Vec<ImplementationLocation>>> {
        let file_name = self.engine_name(name)?;
        Ok(self
            .engine
            .implementation_at_position(&self.state, &file_name, offset))
    }

    pub fn implementation_at_node(
        &mut self,
        position: &SourcePosition,
    ) -> Option<Vec<ImplementationLocation>> {
        self.engine
            .implementation_at_position(&self.state, &position.file_name, position.offset)
    }

    /// Quick info (kind, signature and documentation) of the symbol at `offset`.
    pub fn quick_info_at(&mut self, name: &str, offset: usize) -> HostResult<Option<QuickInfo>> {
        let file_name = self.engine_name(name)?;
        Ok(self.engine.quick_info_at_position(&self.state, &file_name, offset))
    }

    pub fn quick_info_at_node(&mut self, position: &SourcePosition) -> Option<QuickInfo> {
        self.engine
            .quick_info_at_position(&self.state, &position.file_name, position.offset)
    }
}
