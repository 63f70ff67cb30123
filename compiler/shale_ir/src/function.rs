//! Function descriptors.

use crate::ids::{FunctionId, ModuleId};
use crate::instruction::Instructions;

/// Where a function's code comes from.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionBody {
    Bytecode(Instructions),
    /// Implemented by the embedding host; only virtual modules declare these.
    Host,
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionInfo {
    pub name: String,
    pub module: ModuleId,
    /// Position in the owning module's function table.
    pub index: u32,
    pub arity: u16,
    pub has_result: bool,
    pub body: FunctionBody,
}

impl FunctionInfo {
    pub fn new(
        name: impl Into<String>,
        index: u32,
        arity: u16,
        has_result: bool,
        body: FunctionBody,
    ) -> Self {
        FunctionInfo {
            name: name.into(),
            module: ModuleId::PENDING,
            index,
            arity,
            has_result,
            body,
        }
    }

    #[inline]
    pub fn id(&self) -> FunctionId {
        FunctionId::new(self.module, self.index)
    }

    /// Bytecode body, or `None` for host functions.
    #[inline]
    pub fn instructions(&self) -> Option<&Instructions> {
        match &self.body {
            FunctionBody::Bytecode(instructions) => Some(instructions),
            FunctionBody::Host => None,
        }
    }

    #[inline]
    pub fn is_host(&self) -> bool {
        matches!(self.body, FunctionBody::Host)
    }
}
