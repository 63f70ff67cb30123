//! Structure layout.
//!
//! Two passes over the structures of a load session:
//!
//! 1. [`check_cycles`] walks by-value containment edges (scalar and array
//!    fields of structure type) iteratively and reports the first cycle with
//!    its full path.
//! 2. [`compute_layouts`] lays out every structure, recursing into embedded
//!    structures first. Results are memoized in each structure's
//!    `LayoutState`, so a structure is laid out once no matter how many
//!    others embed it.
//!
//! Fields are placed in declaration order. A scalar field is aligned to its
//! type's alignment; an inline array is a count word followed by its
//! elements, aligned to at least a pointer. There is no tail padding in the
//! raw size; the logical size adds the object header and rounds to the
//! object alignment.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use shale_ir::abi::{object_size, round_up, ARRAY_HEADER_SIZE, POINTER_SIZE};
use shale_ir::{Layout, LayoutState, ModuleId, StructureId, StructureInfo, Type};

use crate::error::{CycleEntry, LoadError};
use crate::module::ModuleInfo;
use crate::stack::ensure_sufficient_stack;

/// Look up a structure through the module arena.
pub(crate) fn structure_at(modules: &[ModuleInfo], id: StructureId) -> Option<&StructureInfo> {
    modules
        .get(id.module.index())
        .and_then(ModuleInfo::view)
        .and_then(|module| module.structure(id.index))
}

fn cycle_entry(modules: &[ModuleInfo], id: StructureId) -> CycleEntry {
    CycleEntry {
        id,
        name: structure_at(modules, id)
            .map(|s| s.name.clone())
            .unwrap_or_default(),
    }
}

fn structure_count(modules: &[ModuleInfo], module: ModuleId) -> u32 {
    modules
        .get(module.index())
        .and_then(ModuleInfo::view)
        .map_or(0, |m| u32::try_from(m.structures().len()).unwrap_or(u32::MAX))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Visit {
    /// On the current DFS path.
    Active,
    Finished,
}

/// Fail with the first by-value containment cycle among the structures of
/// `targets`. Structures already laid out are known to be acyclic.
pub(crate) fn check_cycles(modules: &[ModuleInfo], targets: &[ModuleId]) -> Result<(), LoadError> {
    let mut visits: FxHashMap<StructureId, Visit> = FxHashMap::default();
    for &module in targets {
        for index in 0..structure_count(modules, module) {
            let root = StructureId::new(module, index);
            if visits.contains_key(&root)
                || structure_at(modules, root).is_some_and(|s| s.layout_state().is_done())
            {
                continue;
            }
            visit(modules, &mut visits, root)?;
        }
    }
    tracing::trace!(structures = visits.len(), "no structure cycles");
    Ok(())
}

/// Iterative DFS from `root`. Each stack entry is a structure and the index
/// of its next field to examine.
fn visit(
    modules: &[ModuleInfo],
    visits: &mut FxHashMap<StructureId, Visit>,
    root: StructureId,
) -> Result<(), LoadError> {
    let mut stack: Vec<(StructureId, usize)> = vec![(root, 0)];
    visits.insert(root, Visit::Active);

    while let Some(top) = stack.last_mut() {
        let (id, field) = *top;
        top.1 += 1;

        let Some(ty) = structure_at(modules, id)
            .and_then(|s| s.fields.get(field))
            .map(|f| f.ty)
        else {
            stack.pop();
            visits.insert(id, Visit::Finished);
            continue;
        };

        let Type::Structure(child) = ty else {
            continue;
        };
        match visits.get(&child) {
            Some(Visit::Finished) => {}
            Some(Visit::Active) => {
                let start = stack.iter().position(|&(id, _)| id == child).unwrap_or(0);
                let path = stack[start..]
                    .iter()
                    .map(|&(id, _)| cycle_entry(modules, id))
                    .collect();
                return Err(LoadError::StructureCycle { path });
            }
            None => {
                if structure_at(modules, child).is_some_and(|s| s.layout_state().is_done()) {
                    visits.insert(child, Visit::Finished);
                } else {
                    visits.insert(child, Visit::Active);
                    stack.push((child, 0));
                }
            }
        }
    }
    Ok(())
}

/// Lay out every structure of `targets`.
///
/// On error, no structure is left `Computing`; structures finished before
/// the failure keep their layouts.
pub(crate) fn compute_layouts(
    modules: &mut [ModuleInfo],
    targets: &[ModuleId],
) -> Result<(), LoadError> {
    let mut engine = LayoutEngine { modules };
    for &module in targets {
        for index in 0..structure_count(engine.modules, module) {
            engine.layout(StructureId::new(module, index))?;
        }
    }
    Ok(())
}

struct LayoutEngine<'a> {
    modules: &'a mut [ModuleInfo],
}

/// A field's element type and array count, copied out of the structure so
/// the arena can be borrowed mutably while embedded structures are laid out.
type FieldShape = (Type, u64);

impl LayoutEngine<'_> {
    fn layout(&mut self, id: StructureId) -> Result<Layout, LoadError> {
        let structure = structure_at(self.modules, id).ok_or(LoadError::DanglingStructure(id))?;
        match structure.layout_state() {
            LayoutState::Done(layout) => return Ok(layout),
            LayoutState::Computing => {
                return Err(LoadError::StructureCycle {
                    path: vec![cycle_entry(self.modules, id)],
                });
            }
            LayoutState::NotComputed => {}
        }
        let name = structure.name.clone();
        let shapes: SmallVec<[FieldShape; 8]> =
            structure.fields.iter().map(|f| (f.ty, f.count)).collect();

        self.set_state(id, LayoutState::Computing);
        match ensure_sufficient_stack(|| self.place_fields(id, &name, &shapes)) {
            Ok((layout, offsets)) => {
                if let Some(structure) = self.structure_mut(id) {
                    for (field, offset) in structure.fields.iter_mut().zip(offsets) {
                        field.offset = offset;
                    }
                    structure.type_info.layout = LayoutState::Done(layout);
                }
                tracing::trace!(
                    structure = %name,
                    size = layout.size,
                    raw_size = layout.raw_size,
                    raw_alignment = layout.raw_alignment,
                    "structure laid out"
                );
                Ok(layout)
            }
            Err(err) => {
                self.set_state(id, LayoutState::NotComputed);
                Err(err)
            }
        }
    }

    fn place_fields(
        &mut self,
        id: StructureId,
        name: &str,
        shapes: &[FieldShape],
    ) -> Result<(Layout, SmallVec<[usize; 8]>), LoadError> {
        let mut offsets = SmallVec::with_capacity(shapes.len());
        let mut offset = 0usize;
        let mut alignment = 1usize;

        for (index, &(ty, count)) in shapes.iter().enumerate() {
            let element = self.element_layout(ty).map_err(|err| match err {
                FieldError::Invalid => LoadError::InvalidFieldType {
                    structure: name.to_owned(),
                    field: index,
                },
                FieldError::Load(err) => err,
            })?;

            let (extent, align) = if count >= 1 {
                let count = usize::try_from(count).map_err(|_| self.overflow(id, name))?;
                let extent = element
                    .raw_size
                    .checked_mul(count)
                    .and_then(|bytes| bytes.checked_add(ARRAY_HEADER_SIZE))
                    .ok_or_else(|| self.overflow(id, name))?;
                (extent, element.raw_alignment.max(POINTER_SIZE))
            } else {
                (element.raw_size, element.raw_alignment)
            };

            offset = round_up(offset, align).ok_or_else(|| self.overflow(id, name))?;
            offsets.push(offset);
            offset = offset
                .checked_add(extent)
                .ok_or_else(|| self.overflow(id, name))?;
            alignment = alignment.max(align);
        }

        let size = object_size(offset).ok_or_else(|| self.overflow(id, name))?;
        let layout = Layout {
            size,
            raw_size: offset,
            raw_alignment: alignment,
        };
        Ok((layout, offsets))
    }

    fn element_layout(&mut self, ty: Type) -> Result<Layout, FieldError> {
        match ty {
            Type::Fundamental(fundamental) if fundamental.is_storable() => fundamental
                .info()
                .layout
                .layout()
                .ok_or(FieldError::Invalid),
            Type::Structure(child) => self.layout(child).map_err(FieldError::Load),
            Type::Fundamental(_) | Type::Mapped(_) => Err(FieldError::Invalid),
        }
    }

    fn structure_mut(&mut self, id: StructureId) -> Option<&mut StructureInfo> {
        self.modules
            .get_mut(id.module.index())
            .and_then(ModuleInfo::common_mut)
            .and_then(|common| common.structures.get_mut(id.index as usize))
    }

    fn set_state(&mut self, id: StructureId, state: LayoutState) {
        if let Some(structure) = self.structure_mut(id) {
            structure.type_info.layout = state;
        }
    }

    fn overflow(&self, id: StructureId, name: &str) -> LoadError {
        let module = self
            .modules
            .get(id.module.index())
            .and_then(ModuleInfo::view)
            .map(|m| m.path().clone());
        match module {
            Some(module) => LoadError::LayoutOverflow {
                module,
                structure: name.to_owned(),
            },
            None => LoadError::DanglingStructure(id),
        }
    }
}

enum FieldError {
    /// The field's type has no storage.
    Invalid,
    Load(LoadError),
}

#[cfg(test)]
mod tests;
