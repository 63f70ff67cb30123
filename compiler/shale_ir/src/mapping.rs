//! Named references into dependency modules.

/// A symbol that lives in one of the module's dependencies.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
    /// Index into the owning module's dependency list.
    pub dependency: u32,
    pub name: String,
}

/// Structure and function mapping tables of one module.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mappings {
    structures: Vec<Mapping>,
    functions: Vec<Mapping>,
}

impl Mappings {
    pub fn new(structures: Vec<Mapping>, functions: Vec<Mapping>) -> Self {
        Mappings {
            structures,
            functions,
        }
    }

    pub fn clear(&mut self) {
        self.structures.clear();
        self.functions.clear();
    }

    /// Keep only the first `structures` and `functions` entries.
    pub fn truncate(&mut self, structures: usize, functions: usize) {
        self.structures.truncate(structures);
        self.functions.truncate(functions);
    }

    /// Append a structure mapping, returning its index.
    pub fn add_structure(&mut self, dependency: u32, name: impl Into<String>) -> u32 {
        self.structures.push(Mapping {
            dependency,
            name: name.into(),
        });
        u32::try_from(self.structures.len() - 1).unwrap_or(u32::MAX)
    }

    /// Append a function mapping, returning its index.
    pub fn add_function(&mut self, dependency: u32, name: impl Into<String>) -> u32 {
        self.functions.push(Mapping {
            dependency,
            name: name.into(),
        });
        u32::try_from(self.functions.len() - 1).unwrap_or(u32::MAX)
    }

    #[inline]
    pub fn structure(&self, index: u32) -> Option<&Mapping> {
        self.structures.get(index as usize)
    }

    #[inline]
    pub fn function(&self, index: u32) -> Option<&Mapping> {
        self.functions.get(index as usize)
    }

    #[inline]
    pub fn structures(&self) -> &[Mapping] {
        &self.structures
    }

    #[inline]
    pub fn functions(&self) -> &[Mapping] {
        &self.functions
    }
}
