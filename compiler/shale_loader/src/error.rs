//! Load and build errors.

use std::fmt;

use shale_bytecode::{DecodeError, DecodeErrorKind};
use shale_ir::{ModuleId, ModulePath, StructureId};

/// Coarse classification of a [`LoadError`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LoadErrorKind {
    /// A module file could not be opened or read.
    Io,
    /// A file is not a module file.
    Format,
    /// A module file has an unsupported version.
    Version,
    /// A module file is structurally inconsistent.
    Decode,
    /// A dependency spec names no module.
    Dependency,
    /// Structures contain each other by value.
    StructureCycle,
    /// A mapped symbol is missing from its dependency.
    Link,
    /// A structure is too large to lay out.
    Overflow,
    /// The loader API was misused.
    Usage,
}

/// What a mapping refers to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    Structure,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Structure => "structure",
            SymbolKind::Function => "function",
        })
    }
}

/// One structure on a reported cycle.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CycleEntry {
    pub id: StructureId,
    pub name: String,
}

/// Render a cycle as `A -> B -> A`.
struct CyclePath<'a>(&'a [CycleEntry]);

impl fmt::Display for CyclePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.0 {
            write!(f, "{} -> ", entry.name)?;
        }
        match self.0.first() {
            Some(first) => f.write_str(&first.name),
            None => Ok(()),
        }
    }
}

fn cycle_path(path: &[CycleEntry]) -> CyclePath<'_> {
    CyclePath(path)
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("cannot resolve dependency `{spec}` of {requester}: {reason}")]
    Dependency {
        spec: String,
        requester: ModulePath,
        reason: &'static str,
    },

    #[error("structure contains itself: {}", cycle_path(path))]
    StructureCycle { path: Vec<CycleEntry> },

    #[error("{kind} `{symbol}` mapped by {module} not found in dependency `{dependency}`")]
    Link {
        module: ModulePath,
        dependency: String,
        kind: SymbolKind,
        symbol: String,
    },

    #[error("structure `{structure}` in {module} is too large to lay out")]
    LayoutOverflow { module: ModulePath, structure: String },

    #[error("no module with id {0}")]
    UnknownModule(ModuleId),

    #[error("module {0} is not a virtual module")]
    NotVirtual(ModuleId),

    #[error("{module} refers to dependency {index}, but only {count} are declared")]
    DanglingDependency {
        module: ModulePath,
        index: u32,
        count: u32,
    },

    #[error("{module} refers to structure mapping {index}, but only {count} are declared")]
    DanglingMapping {
        module: ModulePath,
        index: u32,
        count: u32,
    },

    #[error("field type refers to missing structure {0}")]
    DanglingStructure(StructureId),

    #[error("field {field} of structure `{structure}` has a type with no storage")]
    InvalidFieldType { structure: String, field: usize },

    #[error("virtual module path `{0}` must start with `/`")]
    InvalidVirtualPath(String),

    #[error("a module is already registered at {0}")]
    DuplicateModule(ModulePath),
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Decode(err) => match err.kind() {
                DecodeErrorKind::Io => LoadErrorKind::Io,
                DecodeErrorKind::Format => LoadErrorKind::Format,
                DecodeErrorKind::Version => LoadErrorKind::Version,
                DecodeErrorKind::Malformed => LoadErrorKind::Decode,
            },
            LoadError::Dependency { .. } => LoadErrorKind::Dependency,
            LoadError::StructureCycle { .. } => LoadErrorKind::StructureCycle,
            LoadError::Link { .. } => LoadErrorKind::Link,
            LoadError::LayoutOverflow { .. } => LoadErrorKind::Overflow,
            LoadError::UnknownModule(_)
            | LoadError::NotVirtual(_)
            | LoadError::DanglingDependency { .. }
            | LoadError::DanglingMapping { .. }
            | LoadError::DanglingStructure(_)
            | LoadError::InvalidFieldType { .. }
            | LoadError::InvalidVirtualPath(_)
            | LoadError::DuplicateModule(_) => LoadErrorKind::Usage,
        }
    }

    /// The cycle, for `StructureCycle` errors.
    pub fn cycle(&self) -> Option<&[CycleEntry]> {
        match self {
            LoadError::StructureCycle { path } => Some(path),
            _ => None,
        }
    }
}
