//! Arena identities for modules, structures and functions.
//!
//! Modules live in an append-only arena owned by the loader. Everything that
//! refers across modules does so through these ids, never through pointers:
//! - `ModuleId(u32)` is the arena index, assigned once at registration
//! - `StructureId` / `FunctionId` pair a module id with a local table index

use std::fmt;

/// Index of a module in the loader's registry.
///
/// Ids follow insertion order and are never reused, even when a failed load
/// leaves a tombstone behind.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    /// Owner of a decoded module that has not been registered yet.
    ///
    /// Registration rewrites every occurrence to the real id.
    pub const PENDING: ModuleId = ModuleId(u32::MAX);

    /// Create a new `ModuleId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        ModuleId(index)
    }

    /// Get the index into the module arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this id has been assigned by a loader.
    #[inline]
    pub const fn is_assigned(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "ModuleId({})", self.0)
        } else {
            write!(f, "ModuleId::PENDING")
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#pending")
        }
    }
}

/// A structure, identified by its owning module and its position in that
/// module's structure table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureId {
    pub module: ModuleId,
    pub index: u32,
}

impl StructureId {
    #[inline]
    pub const fn new(module: ModuleId, index: u32) -> Self {
        StructureId { module, index }
    }

    /// Same structure, owned by `module`. Used when stamping a freshly
    /// registered module.
    #[inline]
    #[must_use]
    pub const fn with_module(self, module: ModuleId) -> Self {
        StructureId {
            module,
            index: self.index,
        }
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.index)
    }
}

/// A function, identified by its owning module and its position in that
/// module's function table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionId {
    pub module: ModuleId,
    pub index: u32,
}

impl FunctionId {
    #[inline]
    pub const fn new(module: ModuleId, index: u32) -> Self {
        FunctionId { module, index }
    }
}

#[cfg(test)]
mod tests;
