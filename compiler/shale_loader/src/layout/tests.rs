#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use pretty_assertions::assert_eq;
use shale_ir::abi::{object_size, OBJECT_HEADER_SIZE};
use shale_ir::{Field, ModulePath};

use super::*;
use crate::error::LoadErrorKind;
use crate::module::VirtualModule;

const M: ModuleId = ModuleId::new(0);

fn local(index: u32) -> Type {
    Type::Structure(StructureId::new(M, index))
}

fn arena(structures: Vec<(&str, Vec<Field>)>) -> Vec<ModuleInfo> {
    let mut module = VirtualModule::new(M, ModulePath::virtual_path("/m"));
    for (name, fields) in structures {
        module.add_structure(name, fields);
    }
    vec![ModuleInfo::Virtual(module)]
}

fn lay_out(modules: &mut [ModuleInfo]) -> Result<(), LoadError> {
    check_cycles(modules, &[M])?;
    compute_layouts(modules, &[M])
}

fn layout_of(modules: &[ModuleInfo], index: u32) -> Layout {
    structure_at(modules, StructureId::new(M, index))
        .and_then(|s| s.layout_state().layout())
        .unwrap()
}

fn offsets(modules: &[ModuleInfo], index: u32) -> Vec<usize> {
    structure_at(modules, StructureId::new(M, index))
        .unwrap()
        .fields
        .iter()
        .map(|f| f.offset)
        .collect()
}

#[test]
fn point_and_line() {
    let mut modules = arena(vec![
        ("Point", vec![Field::scalar(Type::INT); 2]),
        ("Line", vec![Field::scalar(local(0)); 2]),
    ]);
    lay_out(&mut modules).unwrap();

    let point = layout_of(&modules, 0);
    assert_eq!((point.raw_size, point.raw_alignment), (8, 4));
    assert_eq!(point.size, object_size(8).unwrap());
    assert_eq!(offsets(&modules, 0), [0, 4]);

    let line = layout_of(&modules, 1);
    assert_eq!((line.raw_size, line.raw_alignment), (16, 4));
    assert_eq!(offsets(&modules, 1), [0, 8]);
}

#[test]
fn fields_are_aligned_without_tail_padding() {
    let mut modules = arena(vec![(
        "Mixed",
        vec![
            Field::scalar(Type::INT),
            Field::scalar(Type::DOUBLE),
            Field::scalar(Type::SINGLE),
        ],
    )]);
    lay_out(&mut modules).unwrap();

    assert_eq!(offsets(&modules, 0), [0, 8, 16]);
    let mixed = layout_of(&modules, 0);
    assert_eq!((mixed.raw_size, mixed.raw_alignment), (20, 8));
    assert_eq!(mixed.size, object_size(20).unwrap());
    assert!(mixed.size >= mixed.raw_size + OBJECT_HEADER_SIZE);
}

#[test]
fn inline_arrays_carry_a_count_word() {
    let mut modules = arena(vec![(
        "Buffer",
        vec![Field::scalar(Type::INT), Field::array(Type::INT, 3)],
    )]);
    lay_out(&mut modules).unwrap();

    assert_eq!(offsets(&modules, 0), [0, POINTER_SIZE]);
    let buffer = layout_of(&modules, 0);
    assert_eq!(buffer.raw_size, POINTER_SIZE + ARRAY_HEADER_SIZE + 12);
    assert_eq!(buffer.raw_alignment, POINTER_SIZE);
}

#[test]
fn empty_structure_has_header_only() {
    let mut modules = arena(vec![("Unit", Vec::new())]);
    lay_out(&mut modules).unwrap();
    assert_eq!(
        layout_of(&modules, 0),
        Layout {
            size: object_size(0).unwrap(),
            raw_size: 0,
            raw_alignment: 1,
        }
    );
}

#[test]
fn self_containment_is_a_cycle() {
    let mut modules = arena(vec![("Node", vec![Field::scalar(Type::INT), Field::scalar(local(0))])]);
    let err = lay_out(&mut modules).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::StructureCycle);
    let names: Vec<&str> = err.cycle().unwrap().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Node"]);
    assert_eq!(err.to_string(), "structure contains itself: Node -> Node");
}

#[test]
fn array_of_self_is_a_cycle() {
    let mut modules = arena(vec![("Tree", vec![Field::array(local(0), 2)])]);
    let err = lay_out(&mut modules).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::StructureCycle);
}

#[test]
fn mutual_containment_reports_the_whole_path() {
    let mut modules = arena(vec![
        ("Leaf", vec![Field::scalar(Type::LONG)]),
        ("A", vec![Field::scalar(local(0)), Field::scalar(local(2))]),
        ("B", vec![Field::scalar(local(3))]),
        ("C", vec![Field::scalar(local(1))]),
    ]);
    let err = lay_out(&mut modules).unwrap_err();
    let ids: Vec<u32> = err.cycle().unwrap().iter().map(|e| e.id.index).collect();
    assert_eq!(ids, [1, 2, 3]);
    // The check runs before any layout.
    assert_eq!(
        structure_at(&modules, StructureId::new(M, 0)).unwrap().layout_state(),
        LayoutState::NotComputed
    );
}

#[test]
fn pointers_break_containment() {
    let mut modules = arena(vec![(
        "List",
        vec![Field::scalar(Type::INT), Field::scalar(Type::GC_POINTER)],
    )]);
    lay_out(&mut modules).unwrap();
    assert_eq!(layout_of(&modules, 0).raw_size, 2 * POINTER_SIZE);
}

#[test]
fn storage_less_field_types_are_rejected() {
    let mut modules = arena(vec![("Bad", vec![Field::scalar(Type::INT), Field::scalar(Type::NONE)])]);
    let err = lay_out(&mut modules).unwrap_err();
    assert!(matches!(err, LoadError::InvalidFieldType { field: 1, .. }));
    assert_eq!(
        structure_at(&modules, StructureId::new(M, 0)).unwrap().layout_state(),
        LayoutState::NotComputed
    );
}

#[test]
fn dangling_structure_is_reported() {
    let mut modules = arena(vec![("Bad", vec![Field::scalar(local(9))])]);
    let err = lay_out(&mut modules).unwrap_err();
    assert!(matches!(err, LoadError::DanglingStructure(id) if id.index == 9));
}

#[test]
fn oversized_arrays_overflow() {
    let mut modules = arena(vec![("Huge", vec![Field::array(Type::LONG, u64::MAX)])]);
    let err = lay_out(&mut modules).unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::Overflow);
}

#[test]
fn deep_nesting_is_laid_out() {
    let depth = 10_000u32;
    let mut structures = vec![("S0".to_owned(), vec![Field::scalar(Type::INT)])];
    for i in 1..depth {
        structures.push((format!("S{i}"), vec![Field::scalar(local(i - 1))]));
    }
    let mut module = VirtualModule::new(M, ModulePath::virtual_path("/deep"));
    // Declare the outermost first so layout recurses the full depth.
    for (name, fields) in structures.into_iter().rev() {
        let fields = fields
            .into_iter()
            .map(|f| match f.ty {
                Type::Structure(id) => Field::scalar(local(depth - 1 - id.index)),
                _ => f,
            })
            .collect();
        module.add_structure(name, fields);
    }
    let mut modules = vec![ModuleInfo::Virtual(module)];
    lay_out(&mut modules).unwrap();
    assert_eq!(layout_of(&modules, 0).raw_size, 4);
}
