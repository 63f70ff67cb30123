//! Shale IR - Module Data Model
//!
//! Core data structures shared by the decoder, the loader and the execution
//! engine:
//! - Arena ids for modules, structures and functions
//! - The type registry (type codes, fundamental singletons, `Type` handles)
//! - Structures, mappings, constant pools, instruction streams, functions
//! - The canonical opcode table and historical opcode translation
//!
//! # Design Philosophy
//!
//! - **Ids, not pointers**: cross-module references are `(ModuleId, index)`
//!   pairs resolved through the loader's append-only arena.
//! - **Explicit states**: unresolved types are `Type::Mapped`, layouts are a
//!   `LayoutState`; no value doubles as a sentinel.
//! - **Data-driven compat**: opcode history is a rule table per version.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod abi;
mod constant_pool;
mod function;
mod ids;
mod instruction;
mod mapping;
mod module_path;
mod opcode;
mod structure;
mod types;
mod version;

pub use constant_pool::{Constant, ConstantPool};
pub use function::{FunctionBody, FunctionInfo};
pub use ids::{FunctionId, ModuleId, StructureId};
pub use instruction::{Instruction, Instructions};
pub use mapping::{Mapping, Mappings};
pub use module_path::{normalize_path, Dependency, ModulePath};
pub use opcode::{Opcode, OpcodeFlags, OpcodeInfo, OPCODE_COUNT};
pub use structure::{Field, StructureInfo};
pub use types::{
    FundamentalType, Layout, LayoutState, Type, TypeCode, TypeInfo, ARRAY_TYPE, DOUBLE_TYPE,
    GC_POINTER_TYPE, INT_TYPE, LONG_TYPE, NONE_TYPE, POINTER_TYPE, SINGLE_TYPE,
};
pub use version::{decode_opcode, encode_opcode, CompatRule, Version};

// Handles are copied around constantly; keep them small.
static_assert_size!(ModuleId, 4);
static_assert_size!(StructureId, 8);
static_assert_size!(Instruction, 16);
