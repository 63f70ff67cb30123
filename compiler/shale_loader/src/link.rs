//! Cross-module linking.
//!
//! Rewrites every `Type::Mapped` field to the concrete structure it names in
//! the resolved dependency, and resolves function mappings to function ids.
//! Runs after dependency resolution; a name missing from its dependency means
//! the module file is corrupt.

use smallvec::SmallVec;

use shale_ir::{FunctionId, Mapping, ModuleId, StructureId, Type};

use crate::error::{LoadError, SymbolKind};
use crate::module::{Module, ModuleCommon, ModuleInfo};

/// A field whose type is rewritten: `(structure, field, target)`.
type Rewrite = (usize, usize, StructureId);

pub(crate) fn link_module(modules: &mut [ModuleInfo], id: ModuleId) -> Result<(), LoadError> {
    let (rewrites, links) = {
        let common = modules
            .get(id.index())
            .and_then(ModuleInfo::common)
            .ok_or(LoadError::UnknownModule(id))?;
        let linker = Linker {
            modules: &*modules,
            module: common,
        };
        (linker.field_rewrites()?, linker.function_links()?)
    };

    let common = modules
        .get_mut(id.index())
        .and_then(ModuleInfo::common_mut)
        .ok_or(LoadError::UnknownModule(id))?;
    for &(structure, field, target) in &rewrites {
        if let Some(field) = common
            .structures
            .get_mut(structure)
            .and_then(|s| s.fields.get_mut(field))
        {
            field.ty = Type::Structure(target);
        }
    }
    tracing::debug!(
        module = %common.path,
        fields = rewrites.len(),
        functions = links.len(),
        "module linked"
    );
    common.function_links = links;
    Ok(())
}

struct Linker<'a> {
    modules: &'a [ModuleInfo],
    module: &'a ModuleCommon,
}

impl<'a> Linker<'a> {
    fn field_rewrites(&self) -> Result<SmallVec<[Rewrite; 8]>, LoadError> {
        let mut rewrites = SmallVec::new();
        for (s, structure) in self.module.structures.iter().enumerate() {
            for (f, field) in structure.fields.iter().enumerate() {
                if let Type::Mapped(index) = field.ty {
                    rewrites.push((s, f, self.structure_target(index)?));
                }
            }
        }
        Ok(rewrites)
    }

    fn function_links(&self) -> Result<Vec<FunctionId>, LoadError> {
        self.module
            .mappings
            .functions()
            .iter()
            .map(|mapping| {
                let (target, dependency) = self.dependency(mapping)?;
                target
                    .function_by_name(&mapping.name)
                    .map(|function| FunctionId::new(target.id(), function.index))
                    .ok_or_else(|| self.missing(dependency, SymbolKind::Function, mapping))
            })
            .collect()
    }

    fn structure_target(&self, index: u32) -> Result<StructureId, LoadError> {
        let mappings = self.module.mappings.structures();
        let mapping = mappings
            .get(index as usize)
            .ok_or_else(|| LoadError::DanglingMapping {
                module: self.module.path.clone(),
                index,
                count: u32::try_from(mappings.len()).unwrap_or(u32::MAX),
            })?;
        let (target, dependency) = self.dependency(mapping)?;
        target
            .structure_by_name(&mapping.name)
            .map(|structure| StructureId::new(target.id(), structure.local_index()))
            .ok_or_else(|| self.missing(dependency, SymbolKind::Structure, mapping))
    }

    /// The module a mapping points into, and the dependency spec naming it.
    fn dependency(&self, mapping: &Mapping) -> Result<(&'a dyn Module, &'a str), LoadError> {
        let dependencies = &self.module.dependencies;
        let dependency = dependencies
            .get(mapping.dependency as usize)
            .ok_or_else(|| LoadError::DanglingDependency {
                module: self.module.path.clone(),
                index: mapping.dependency,
                count: u32::try_from(dependencies.len()).unwrap_or(u32::MAX),
            })?;
        let target = dependency
            .module
            .and_then(|id| self.modules.get(id.index()))
            .and_then(ModuleInfo::view)
            .ok_or_else(|| LoadError::Dependency {
                spec: dependency.path.clone(),
                requester: self.module.path.clone(),
                reason: "dependency was not resolved",
            })?;
        Ok((target, &dependency.path))
    }

    fn missing(&self, dependency: &str, kind: SymbolKind, mapping: &Mapping) -> LoadError {
        LoadError::Link {
            module: self.module.path.clone(),
            dependency: dependency.to_owned(),
            kind,
            symbol: mapping.name.clone(),
        }
    }
}
