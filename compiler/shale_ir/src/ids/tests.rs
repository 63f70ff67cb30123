use super::*;

#[test]
fn module_id_roundtrips_index() {
    let id = ModuleId::new(7);
    assert_eq!(id.index(), 7);
    assert_eq!(id.raw(), 7);
    assert!(id.is_assigned());
}

#[test]
fn module_zero_is_an_ordinary_id() {
    assert!(ModuleId::new(0).is_assigned());
    assert_ne!(ModuleId::new(0), ModuleId::PENDING);
}

#[test]
fn pending_debug_and_display() {
    assert_eq!(format!("{:?}", ModuleId::PENDING), "ModuleId::PENDING");
    assert_eq!(ModuleId::PENDING.to_string(), "#pending");
    assert_eq!(ModuleId::new(3).to_string(), "#3");
}

#[test]
fn structure_id_restamp_keeps_index() {
    let pending = StructureId::new(ModuleId::PENDING, 4);
    let stamped = pending.with_module(ModuleId::new(2));
    assert_eq!(stamped.index, 4);
    assert_eq!(stamped.module, ModuleId::new(2));
    assert_eq!(stamped.to_string(), "#2:4");
}
