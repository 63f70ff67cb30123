//! Registered modules.
//!
//! File-backed and virtual modules share one accessor surface, the
//! [`Module`] trait. The loader stores them in a closed sum type,
//! [`ModuleInfo`], and callers that only read should go through
//! [`ModuleInfo::view`] rather than matching on the variant.

use shale_bytecode::ModuleDescriptor;
use shale_ir::{
    ConstantPool, Dependency, Field, FunctionBody, FunctionId, FunctionInfo, Instructions,
    Mappings, ModuleId, ModulePath, StructureId, StructureInfo, Version,
};

/// State shared by every module variant.
#[derive(Clone, PartialEq, Debug)]
pub struct ModuleCommon {
    pub(crate) id: ModuleId,
    pub(crate) path: ModulePath,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) mappings: Mappings,
    pub(crate) structures: Vec<StructureInfo>,
    pub(crate) functions: Vec<FunctionInfo>,
    /// Targets of the function mappings, filled in by linking.
    pub(crate) function_links: Vec<FunctionId>,
}

impl ModuleCommon {
    fn new(id: ModuleId, path: ModulePath) -> Self {
        ModuleCommon {
            id,
            path,
            dependencies: Vec::new(),
            mappings: Mappings::default(),
            structures: Vec::new(),
            functions: Vec::new(),
            function_links: Vec::new(),
        }
    }
}

/// Read access to a registered module.
pub trait Module {
    fn common(&self) -> &ModuleCommon;

    fn id(&self) -> ModuleId {
        self.common().id
    }

    fn path(&self) -> &ModulePath {
        &self.common().path
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.common().dependencies
    }

    fn mappings(&self) -> &Mappings {
        &self.common().mappings
    }

    fn structures(&self) -> &[StructureInfo] {
        &self.common().structures
    }

    fn structure(&self, index: u32) -> Option<&StructureInfo> {
        self.common().structures.get(index as usize)
    }

    fn structure_by_name(&self, name: &str) -> Option<&StructureInfo> {
        self.common().structures.iter().find(|s| s.name == name)
    }

    fn functions(&self) -> &[FunctionInfo] {
        &self.common().functions
    }

    fn function(&self, index: u32) -> Option<&FunctionInfo> {
        self.common().functions.get(index as usize)
    }

    fn function_by_name(&self, name: &str) -> Option<&FunctionInfo> {
        self.common().functions.iter().find(|f| f.name == name)
    }

    /// Function a function mapping resolved to. `None` before linking.
    fn function_link(&self, index: u32) -> Option<FunctionId> {
        self.common().function_links.get(index as usize).copied()
    }

    /// Literal table; virtual modules have none.
    fn constant_pool(&self) -> Option<&ConstantPool> {
        None
    }

    /// Top-level instruction stream; virtual modules have none.
    fn entry_point(&self) -> Option<&Instructions> {
        None
    }
}

/// A module decoded from a file.
#[derive(Clone, PartialEq, Debug)]
pub struct ByteModule {
    common: ModuleCommon,
    file_version: Version,
    instruction_set_version: Version,
    constant_pool: ConstantPool,
    entry_point: Instructions,
}

impl ByteModule {
    /// Take ownership of a decoded descriptor, stamping `id` on everything
    /// it contains.
    pub(crate) fn from_descriptor(
        id: ModuleId,
        path: ModulePath,
        descriptor: ModuleDescriptor,
    ) -> Self {
        let ModuleDescriptor {
            path: _,
            file_version,
            instruction_set_version,
            dependencies,
            mappings,
            constant_pool,
            mut structures,
            mut functions,
            entry_point,
        } = descriptor;

        for structure in &mut structures {
            structure.assign_module(id);
        }
        for function in &mut functions {
            function.module = id;
        }

        ByteModule {
            common: ModuleCommon {
                dependencies,
                mappings,
                structures,
                functions,
                ..ModuleCommon::new(id, path)
            },
            file_version,
            instruction_set_version,
            constant_pool,
            entry_point,
        }
    }

    pub fn file_version(&self) -> Version {
        self.file_version
    }

    pub fn instruction_set_version(&self) -> Version {
        self.instruction_set_version
    }
}

impl Module for ByteModule {
    fn common(&self) -> &ModuleCommon {
        &self.common
    }

    fn constant_pool(&self) -> Option<&ConstantPool> {
        Some(&self.constant_pool)
    }

    fn entry_point(&self) -> Option<&Instructions> {
        Some(&self.entry_point)
    }
}

/// A module authored by the host.
///
/// Populate it through the `add_*` methods, then hand it to
/// [`Loader::build`](crate::Loader::build). Same-module structure references
/// may use the module's own id or `ModuleId::PENDING`.
#[derive(Clone, PartialEq, Debug)]
pub struct VirtualModule {
    common: ModuleCommon,
    built: bool,
    /// Table sizes at the last successful build.
    checkpoint: Option<Checkpoint>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Checkpoint {
    dependencies: usize,
    structure_mappings: usize,
    function_mappings: usize,
    structures: usize,
    functions: usize,
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl VirtualModule {
    pub(crate) fn new(id: ModuleId, path: ModulePath) -> Self {
        VirtualModule {
            common: ModuleCommon::new(id, path),
            built: false,
            checkpoint: None,
        }
    }

    /// Whether the last `build` succeeded and nothing was added since.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Record a successful build.
    pub(crate) fn mark_built(&mut self) {
        let common = &self.common;
        self.checkpoint = Some(Checkpoint {
            dependencies: common.dependencies.len(),
            structure_mappings: common.mappings.structures().len(),
            function_mappings: common.mappings.functions().len(),
            structures: common.structures.len(),
            functions: common.functions.len(),
        });
        self.built = true;
    }

    /// Drop everything added since the last successful build. Returns
    /// `false`, leaving the module untouched, if it was never built.
    ///
    /// Entries kept by the checkpoint were linked and laid out by that
    /// build, so the module is built again afterwards.
    pub(crate) fn restore_checkpoint(&mut self) -> bool {
        let Some(checkpoint) = self.checkpoint else {
            return false;
        };
        let common = &mut self.common;
        common.dependencies.truncate(checkpoint.dependencies);
        common
            .mappings
            .truncate(checkpoint.structure_mappings, checkpoint.function_mappings);
        common.function_links.truncate(checkpoint.function_mappings);
        common.structures.truncate(checkpoint.structures);
        common.functions.truncate(checkpoint.functions);
        self.built = true;
        true
    }

    /// Declare a dependency and return its index.
    pub fn add_dependency(&mut self, path: impl Into<String>) -> u32 {
        self.built = false;
        let index = next_index(self.common.dependencies.len());
        self.common.dependencies.push(Dependency::new(path));
        index
    }

    /// Declare a structure imported from dependency `dependency`. Fields
    /// refer to it as `Type::Mapped(index)`.
    pub fn add_structure_mapping(&mut self, dependency: u32, name: impl Into<String>) -> u32 {
        self.built = false;
        self.common.mappings.add_structure(dependency, name)
    }

    /// Declare a function imported from dependency `dependency`.
    pub fn add_function_mapping(&mut self, dependency: u32, name: impl Into<String>) -> u32 {
        self.built = false;
        self.common.mappings.add_function(dependency, name)
    }

    pub fn add_structure(&mut self, name: impl Into<String>, fields: Vec<Field>) -> StructureId {
        self.built = false;
        let index = next_index(self.common.structures.len());
        let mut structure = StructureInfo::new(name, self.common.id, index, fields);
        structure.assign_module(self.common.id);
        self.common.structures.push(structure);
        StructureId::new(self.common.id, index)
    }

    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        arity: u16,
        has_result: bool,
        body: FunctionBody,
    ) -> FunctionId {
        self.built = false;
        let index = next_index(self.common.functions.len());
        let mut function = FunctionInfo::new(name, index, arity, has_result, body);
        function.module = self.common.id;
        self.common.functions.push(function);
        FunctionId::new(self.common.id, index)
    }
}

impl Module for VirtualModule {
    fn common(&self) -> &ModuleCommon {
        &self.common
    }
}

/// A registry slot.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum ModuleInfo {
    /// Left behind by a failed load or build.
    #[default]
    Empty,
    File(ByteModule),
    Virtual(VirtualModule),
}

impl ModuleInfo {
    /// The shared accessor surface, or `None` for an empty slot.
    pub fn view(&self) -> Option<&dyn Module> {
        match self {
            ModuleInfo::Empty => None,
            ModuleInfo::File(module) => Some(module),
            ModuleInfo::Virtual(module) => Some(module),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, ModuleInfo::Empty)
    }

    pub(crate) fn common(&self) -> Option<&ModuleCommon> {
        self.view().map(|module| module.common())
    }

    pub(crate) fn common_mut(&mut self) -> Option<&mut ModuleCommon> {
        match self {
            ModuleInfo::Empty => None,
            ModuleInfo::File(module) => Some(&mut module.common),
            ModuleInfo::Virtual(module) => Some(&mut module.common),
        }
    }

    /// Whether this module still needs dependency resolution and linking.
    pub(crate) fn needs_build(&self) -> bool {
        matches!(self, ModuleInfo::Virtual(module) if !module.built)
    }
}
