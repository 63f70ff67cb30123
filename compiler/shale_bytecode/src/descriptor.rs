//! The decoded, not yet registered, form of a module file.

use std::path::PathBuf;

use shale_ir::{
    ConstantPool, Dependency, Field, FunctionBody, FunctionInfo, Instructions, Mappings,
    ModuleId, StructureInfo, Version,
};

/// Everything a module file contains.
///
/// Structures and functions are owned by `ModuleId::PENDING` until a loader
/// registers the module. Cross-module field types are still `Type::Mapped`.
#[derive(Clone, PartialEq, Debug)]
pub struct ModuleDescriptor {
    /// Canonical path of the source file, if decoded from disk.
    pub path: Option<PathBuf>,
    pub file_version: Version,
    pub instruction_set_version: Version,
    pub dependencies: Vec<Dependency>,
    pub mappings: Mappings,
    pub constant_pool: ConstantPool,
    pub structures: Vec<StructureInfo>,
    pub functions: Vec<FunctionInfo>,
    pub entry_point: Instructions,
}

impl Default for ModuleDescriptor {
    fn default() -> Self {
        ModuleDescriptor {
            path: None,
            file_version: Version::LATEST,
            instruction_set_version: Version::LATEST,
            dependencies: Vec::new(),
            mappings: Mappings::default(),
            constant_pool: ConstantPool::default(),
            structures: Vec::new(),
            functions: Vec::new(),
            entry_point: Instructions::default(),
        }
    }
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl ModuleDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a dependency and return its index.
    pub fn add_dependency(&mut self, path: impl Into<String>) -> u32 {
        let index = next_index(self.dependencies.len());
        self.dependencies.push(Dependency::new(path));
        index
    }

    /// Append a structure and return its local index. Same-module structure
    /// references in `fields` use `ModuleId::PENDING`.
    pub fn add_structure(&mut self, name: impl Into<String>, fields: Vec<Field>) -> u32 {
        let index = next_index(self.structures.len());
        self.structures
            .push(StructureInfo::new(name, ModuleId::PENDING, index, fields));
        index
    }

    /// Append a bytecode function and return its index.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        arity: u16,
        has_result: bool,
        body: Instructions,
    ) -> u32 {
        let index = next_index(self.functions.len());
        self.functions.push(FunctionInfo::new(
            name,
            index,
            arity,
            has_result,
            FunctionBody::Bytecode(body),
        ));
        index
    }

    pub fn structure(&self, name: &str) -> Option<&StructureInfo> {
        self.structures.iter().find(|s| s.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.name == name)
    }
}
