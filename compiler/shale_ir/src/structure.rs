//! User-defined aggregate types.

use crate::ids::{ModuleId, StructureId};
use crate::types::{LayoutState, Type, TypeInfo};

/// A structure field.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    /// Byte offset inside the structure payload. Valid once the owning
    /// structure's layout is `Done`.
    pub offset: usize,
    pub ty: Type,
    /// 0 for a scalar field, otherwise the length of an inline array.
    pub count: u64,
}

impl Field {
    pub const fn scalar(ty: Type) -> Self {
        Field {
            offset: 0,
            ty,
            count: 0,
        }
    }

    pub const fn array(ty: Type, count: u64) -> Self {
        Field {
            offset: 0,
            ty,
            count,
        }
    }

    #[inline]
    pub const fn is_array(&self) -> bool {
        self.count >= 1
    }
}

/// A structure and its embedded type descriptor.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureInfo {
    pub name: String,
    pub fields: Vec<Field>,
    pub type_info: TypeInfo,
}

impl StructureInfo {
    pub fn new(name: impl Into<String>, module: ModuleId, index: u32, fields: Vec<Field>) -> Self {
        let name = name.into();
        StructureInfo {
            type_info: TypeInfo::structure(name.clone(), module, index),
            name,
            fields,
        }
    }

    /// Position of this structure in its module's table.
    pub fn local_index(&self) -> u32 {
        match self.type_info.code {
            crate::types::TypeCode::Structure(index) => index,
            _ => 0,
        }
    }

    pub fn id(&self) -> StructureId {
        StructureId::new(
            self.type_info.module.unwrap_or(ModuleId::PENDING),
            self.local_index(),
        )
    }

    #[inline]
    pub fn layout_state(&self) -> LayoutState {
        self.type_info.layout
    }

    /// Stamp the owning module on the descriptor and on every same-module
    /// structure reference still marked pending.
    pub fn assign_module(&mut self, module: ModuleId) {
        self.type_info.module = Some(module);
        for field in &mut self.fields {
            if let Type::Structure(id) = field.ty {
                if !id.module.is_assigned() {
                    field.ty = Type::Structure(id.with_module(module));
                }
            }
        }
    }
}
