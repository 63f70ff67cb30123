//! Type registry: type codes, type descriptors and type handles.
//!
//! # Design
//!
//! - Fundamental descriptors are `static` singletons: created once, never
//!   mutated, alive for the whole process.
//! - Structure descriptors are owned by their `StructureInfo` and die with the
//!   owning module.
//! - A `Type` is a `Copy` handle. Structure handles are `(module, index)` pairs
//!   resolved through the loader's arena, never pointers.
//! - Layout is an explicit state machine (`LayoutState`) so a zero-sized
//!   structure is never mistaken for an uncomputed one.

use std::borrow::Cow;
use std::fmt;

use crate::abi::{OBJECT_ALIGNMENT, OBJECT_HEADER_SIZE, POINTER_SIZE};
use crate::ids::{ModuleId, StructureId};

/// On-disk type code (31 significant bits).
///
/// Structure kinds are numbered `STRUCTURE_BASE + local index`; a local index
/// past the module's own structure table addresses its structure mappings.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeCode {
    None,
    /// Reserved, not supported.
    Byte,
    /// Reserved, not supported.
    Short,
    Int,
    Long,
    Single,
    Double,
    Pointer,
    GCPointer,
    Array,
    Structure(u32),
}

impl TypeCode {
    /// First raw code of the structure range.
    pub const STRUCTURE_BASE: u32 = 20;

    /// Largest raw code that fits in the 31-bit field word.
    pub const MAX_RAW: u32 = 0x7FFF_FFFF;

    /// Decode a raw code. Reserved codes (10..20) and codes wider than 31
    /// bits yield `None`.
    pub const fn from_raw(raw: u32) -> Option<TypeCode> {
        Some(match raw {
            0 => TypeCode::None,
            1 => TypeCode::Byte,
            2 => TypeCode::Short,
            3 => TypeCode::Int,
            4 => TypeCode::Long,
            5 => TypeCode::Single,
            6 => TypeCode::Double,
            7 => TypeCode::Pointer,
            8 => TypeCode::GCPointer,
            9 => TypeCode::Array,
            Self::STRUCTURE_BASE..=Self::MAX_RAW => TypeCode::Structure(raw - Self::STRUCTURE_BASE),
            _ => return None,
        })
    }

    /// Raw on-disk value.
    pub const fn raw(self) -> u32 {
        match self {
            TypeCode::None => 0,
            TypeCode::Byte => 1,
            TypeCode::Short => 2,
            TypeCode::Int => 3,
            TypeCode::Long => 4,
            TypeCode::Single => 5,
            TypeCode::Double => 6,
            TypeCode::Pointer => 7,
            TypeCode::GCPointer => 8,
            TypeCode::Array => 9,
            TypeCode::Structure(index) => Self::STRUCTURE_BASE + index,
        }
    }

    #[inline]
    pub const fn is_structure(self) -> bool {
        matches!(self, TypeCode::Structure(_))
    }
}

/// Computed storage requirements of a type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// Header-inclusive object size, rounded to `OBJECT_ALIGNMENT`.
    pub size: usize,
    /// Payload size when embedded inline.
    pub raw_size: usize,
    /// Payload alignment when embedded inline.
    pub raw_alignment: usize,
}

impl Layout {
    /// Layout of descriptors that carry no storage (`none`, `array`).
    pub const EMPTY: Layout = Layout {
        size: 0,
        raw_size: 0,
        raw_alignment: 1,
    };

    /// Layout of a header-prefixed scalar payload.
    const fn scalar(raw_size: usize, raw_alignment: usize) -> Layout {
        let total = OBJECT_HEADER_SIZE + raw_size;
        Layout {
            size: total.div_ceil(OBJECT_ALIGNMENT) * OBJECT_ALIGNMENT,
            raw_size,
            raw_alignment,
        }
    }
}

/// Progress of a structure's layout computation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutState {
    #[default]
    NotComputed,
    /// On the current layout path; seeing it again means a cycle.
    Computing,
    Done(Layout),
}

impl LayoutState {
    #[inline]
    pub const fn layout(self) -> Option<Layout> {
        match self {
            LayoutState::Done(layout) => Some(layout),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_done(self) -> bool {
        matches!(self, LayoutState::Done(_))
    }
}

/// A type descriptor.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeInfo {
    pub name: Cow<'static, str>,
    /// Owning module; `None` for fundamental types.
    pub module: Option<ModuleId>,
    pub code: TypeCode,
    pub layout: LayoutState,
}

impl TypeInfo {
    const fn fundamental(name: &'static str, code: TypeCode, layout: Layout) -> Self {
        TypeInfo {
            name: Cow::Borrowed(name),
            module: None,
            code,
            layout: LayoutState::Done(layout),
        }
    }

    /// Descriptor of a not-yet-laid-out structure.
    pub fn structure(name: impl Into<String>, module: ModuleId, index: u32) -> Self {
        TypeInfo {
            name: Cow::Owned(name.into()),
            module: Some(module),
            code: TypeCode::Structure(index),
            layout: LayoutState::NotComputed,
        }
    }
}

pub static NONE_TYPE: TypeInfo = TypeInfo::fundamental("none", TypeCode::None, Layout::EMPTY);
pub static INT_TYPE: TypeInfo = TypeInfo::fundamental("int", TypeCode::Int, Layout::scalar(4, 4));
pub static LONG_TYPE: TypeInfo =
    TypeInfo::fundamental("long", TypeCode::Long, Layout::scalar(8, 8));
pub static SINGLE_TYPE: TypeInfo =
    TypeInfo::fundamental("single", TypeCode::Single, Layout::scalar(4, 4));
pub static DOUBLE_TYPE: TypeInfo =
    TypeInfo::fundamental("double", TypeCode::Double, Layout::scalar(8, 8));
pub static POINTER_TYPE: TypeInfo = TypeInfo::fundamental(
    "pointer",
    TypeCode::Pointer,
    Layout::scalar(POINTER_SIZE, POINTER_SIZE),
);
pub static GC_POINTER_TYPE: TypeInfo = TypeInfo::fundamental(
    "gcpointer",
    TypeCode::GCPointer,
    Layout::scalar(POINTER_SIZE, POINTER_SIZE),
);
pub static ARRAY_TYPE: TypeInfo = TypeInfo::fundamental("array", TypeCode::Array, Layout::EMPTY);

/// The fixed set of built-in type descriptors.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FundamentalType {
    None,
    Int,
    Long,
    Single,
    Double,
    Pointer,
    GCPointer,
    Array,
}

impl FundamentalType {
    /// Look up the built-in descriptor for `code`.
    pub const fn from_code(code: TypeCode) -> Option<Self> {
        Some(match code {
            TypeCode::None => FundamentalType::None,
            TypeCode::Int => FundamentalType::Int,
            TypeCode::Long => FundamentalType::Long,
            TypeCode::Single => FundamentalType::Single,
            TypeCode::Double => FundamentalType::Double,
            TypeCode::Pointer => FundamentalType::Pointer,
            TypeCode::GCPointer => FundamentalType::GCPointer,
            TypeCode::Array => FundamentalType::Array,
            TypeCode::Byte | TypeCode::Short | TypeCode::Structure(_) => return None,
        })
    }

    /// The process-wide descriptor singleton.
    pub fn info(self) -> &'static TypeInfo {
        match self {
            FundamentalType::None => &NONE_TYPE,
            FundamentalType::Int => &INT_TYPE,
            FundamentalType::Long => &LONG_TYPE,
            FundamentalType::Single => &SINGLE_TYPE,
            FundamentalType::Double => &DOUBLE_TYPE,
            FundamentalType::Pointer => &POINTER_TYPE,
            FundamentalType::GCPointer => &GC_POINTER_TYPE,
            FundamentalType::Array => &ARRAY_TYPE,
        }
    }

    /// Whether values of this type have storage and can be a field type.
    #[inline]
    pub const fn is_storable(self) -> bool {
        !matches!(self, FundamentalType::None | FundamentalType::Array)
    }
}

/// Handle to a type descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Fundamental(FundamentalType),
    Structure(StructureId),
    /// Unresolved cross-module structure: index into the owning module's
    /// structure mapping table. Never survives a successful link.
    Mapped(u32),
}

impl Type {
    pub const NONE: Type = Type::Fundamental(FundamentalType::None);
    pub const INT: Type = Type::Fundamental(FundamentalType::Int);
    pub const LONG: Type = Type::Fundamental(FundamentalType::Long);
    pub const SINGLE: Type = Type::Fundamental(FundamentalType::Single);
    pub const DOUBLE: Type = Type::Fundamental(FundamentalType::Double);
    pub const POINTER: Type = Type::Fundamental(FundamentalType::Pointer);
    pub const GC_POINTER: Type = Type::Fundamental(FundamentalType::GCPointer);
    pub const ARRAY: Type = Type::Fundamental(FundamentalType::Array);

    /// A built-in type with storage (excludes `none` and `array`).
    #[inline]
    pub const fn is_fundamental(self) -> bool {
        match self {
            Type::Fundamental(fundamental) => fundamental.is_storable(),
            _ => false,
        }
    }

    #[inline]
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Type::Fundamental(FundamentalType::Pointer | FundamentalType::GCPointer)
        )
    }

    #[inline]
    pub const fn is_array(self) -> bool {
        matches!(self, Type::Fundamental(FundamentalType::Array))
    }

    #[inline]
    pub const fn is_structure(self) -> bool {
        matches!(self, Type::Structure(_))
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Type::Fundamental(FundamentalType::None))
    }

    /// False only for the unresolved mapping placeholder.
    #[inline]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Type::Mapped(_))
    }

    #[inline]
    pub const fn structure_id(self) -> Option<StructureId> {
        match self {
            Type::Structure(id) => Some(id),
            _ => None,
        }
    }

    /// Descriptor of a fundamental type; structures need the module arena.
    #[inline]
    pub fn fundamental_info(self) -> Option<&'static TypeInfo> {
        match self {
            Type::Fundamental(fundamental) => Some(fundamental.info()),
            _ => None,
        }
    }
}

impl From<FundamentalType> for Type {
    fn from(fundamental: FundamentalType) -> Self {
        Type::Fundamental(fundamental)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Fundamental(fundamental) => f.write_str(&fundamental.info().name),
            Type::Structure(id) => write!(f, "struct {id}"),
            Type::Mapped(index) => write!(f, "mapping[{index}]"),
        }
    }
}
