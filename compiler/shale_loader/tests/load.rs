//! Loading module files end to end.

#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

mod common;

use pretty_assertions::assert_eq;
use shale_bytecode::{ModuleDescriptor, ModuleWriter};
use shale_ir::abi::ARRAY_HEADER_SIZE;
use shale_ir::{
    Field, FunctionBody, Instructions, ModuleId, ModulePath, Opcode, StructureId, Type, Version,
};
use shale_loader::{Loader, LoaderConfig, Module, ModuleInfo};

use common::{app, base, Fixture};

#[test]
fn app_loads_base_transitively() {
    let fixture = Fixture::new();
    let base_path = fixture.write("base.shb", &base());
    let app_path = fixture.write("app.shb", &app("base.shb"));

    let mut loader = Loader::new();
    let app_id = loader.load(&app_path).unwrap();
    assert_eq!(loader.module_count(), 2);

    let base_id = loader.find(&ModulePath::File(base_path)).unwrap();
    let point = StructureId::new(base_id, 0);
    let line = loader.module(app_id).unwrap().structure_by_name("Line").unwrap();
    assert_eq!(line.fields[0].ty, Type::Structure(point));
    assert_eq!(line.fields[1].ty, Type::Structure(point));

    let point = loader.layout(Type::Structure(point)).unwrap();
    assert_eq!((point.raw_size, point.raw_alignment), (8, 4));
    let line = line.layout_state().layout().unwrap();
    assert_eq!((line.raw_size, line.raw_alignment), (16, 4));
}

#[test]
fn loading_a_path_twice_returns_the_same_module() {
    let fixture = Fixture::new();
    let base_path = fixture.write("base.shb", &base());
    let app_path = fixture.write("app.shb", &app("base.shb"));

    let mut loader = Loader::new();
    let first = loader.load(&app_path).unwrap();
    let again = loader.load(fixture.root().join("./app.shb")).unwrap();
    assert_eq!(first, again);

    // Already registered as a dependency.
    let base_id = loader.load(&base_path).unwrap();
    assert_eq!(loader.module(first).unwrap().dependencies()[0].module, Some(base_id));
    assert_eq!(loader.module_count(), 2);
}

#[test]
fn shared_dependencies_are_loaded_once() {
    let fixture = Fixture::new();
    fixture.write("point.shb", &base());
    fixture.write("left.shb", &app("point.shb"));
    fixture.write("right.shb", &app("./sub/../point.shb"));

    let mut top = ModuleDescriptor::new();
    top.add_dependency("left.shb");
    top.add_dependency("right.shb");
    let top = fixture.write("top.shb", &top);

    let mut loader = Loader::new();
    loader.load(&top).unwrap();
    assert_eq!(loader.module_count(), 4);
    let names: Vec<String> = loader
        .modules()
        .map(|m| m.path().to_string())
        .collect();
    assert!(names[0].ends_with("top.shb"));
    assert!(names[3].ends_with("point.shb"));
}

#[test]
fn library_directories_satisfy_absolute_specs() {
    let fixture = Fixture::new();
    fixture.write("lib/geometry/point.shb", &base());
    let app_path = fixture.write("src/app.shb", &app("/geometry/point.shb"));

    let mut loader = Loader::with_config(LoaderConfig::new().library_dir(fixture.root().join("lib")));
    let app_id = loader.load(&app_path).unwrap();

    let dependency = loader.module(app_id).unwrap().dependencies()[0].module.unwrap();
    let path = loader.module(dependency).unwrap().path().clone();
    assert_eq!(
        path,
        ModulePath::File(fixture.root().join("lib/geometry/point.shb"))
    );
}

#[test]
fn later_library_directories_are_searched_too() {
    let fixture = Fixture::new();
    fixture.write("second/point.shb", &base());
    let app_path = fixture.write("app.shb", &app("/point.shb"));

    let mut loader = Loader::new();
    loader.add_library_directory(fixture.root().join("first"));
    loader.add_library_directory(fixture.root().join("second"));
    loader.load(&app_path).unwrap();
    assert_eq!(loader.config().library_dirs.len(), 2);
    assert_eq!(loader.module_count(), 2);
}

#[test]
fn file_modules_link_against_virtual_modules() {
    let fixture = Fixture::new();
    let mut loader = Loader::new();
    let host = loader.create("/host/io").unwrap();
    host.add_structure("Buffer", vec![Field::scalar(Type::POINTER), Field::scalar(Type::LONG)]);
    let print = host.add_function("print", 1, false, FunctionBody::Host);
    let host = host.id();
    loader.build(host).unwrap();

    let mut module = ModuleDescriptor::new();
    let dep = module.add_dependency("/host/io");
    let buffer = module.mappings.add_structure(dep, "Buffer");
    module.mappings.add_function(dep, "print");
    module.add_structure("Stream", vec![Field::scalar(Type::Mapped(buffer)), Field::scalar(Type::INT)]);
    let path = fixture.write("stream.shb", &module);

    let id = loader.load(&path).unwrap();
    let stream = loader.module(id).unwrap();
    assert_eq!(stream.function_link(0), Some(print));
    assert!(loader.function(print).unwrap().is_host());
    assert_eq!(
        stream.structure(0).unwrap().fields[0].ty,
        Type::Structure(StructureId::new(host, 0))
    );
}

#[test]
fn entry_point_and_constants_are_exposed() {
    let fixture = Fixture::new();
    let mut module = ModuleDescriptor::new();
    let five = module.constant_pool.add_int(5);
    module.constant_pool.add_double(0.5);
    let mut body = Instructions::new();
    body.push(Opcode::Push, five);
    body.push(Opcode::Ret, 0);
    module.add_function("five", 0, true, body);
    module.entry_point.push(Opcode::Call, 0);
    module.entry_point.push(Opcode::Pop, 0);
    let path = fixture.write("five.shb", &module);

    let mut loader = Loader::new();
    let id = loader.load(&path).unwrap();
    let loaded = loader.module(id).unwrap();

    let pool = loaded.constant_pool().unwrap();
    assert_eq!(pool.ints(), [5]);
    assert_eq!(pool.constant_type(pool.double_offset()), Some(Type::DOUBLE));
    assert_eq!(loaded.entry_point().unwrap().len(), 2);

    let five = loaded.function_by_name("five").unwrap();
    assert_eq!(five.module, id);
    let opcodes: Vec<Opcode> = five.instructions().unwrap().iter().map(|i| i.opcode).collect();
    assert_eq!(opcodes, [Opcode::Push, Opcode::Ret]);
}

#[test]
fn older_instruction_sets_load_with_the_same_opcodes() {
    let fixture = Fixture::new();
    let mut module = ModuleDescriptor::new();
    module.entry_point.push(Opcode::ToD, 0);
    module.entry_point.push(Opcode::New, 3);
    module.entry_point.push(Opcode::Delete, 0);
    let path = fixture.write_with(
        "old.shb",
        &module,
        ModuleWriter::new().instruction_set(Version::V0_4_0),
    );

    let mut loader = Loader::new();
    let id = loader.load(&path).unwrap();
    let Some(ModuleInfo::File(loaded)) = loader.module_info(id) else {
        panic!("expected a file module");
    };
    assert_eq!(loaded.instruction_set_version(), Version::V0_4_0);
    assert_eq!(loaded.file_version(), Version::LATEST);
    let entry = loaded.entry_point().unwrap();
    let opcodes: Vec<Opcode> = entry.iter().map(|i| i.opcode).collect();
    assert_eq!(opcodes, [Opcode::ToD, Opcode::New, Opcode::Delete]);
    assert_eq!(entry.get(1).map(|i| i.operand), Some(3));
}

#[test]
fn version_boundaries_are_accepted() {
    let fixture = Fixture::new();
    let mut loader = Loader::new();
    for (name, version) in [("least.shb", Version::LEAST), ("latest.shb", Version::LATEST)] {
        let writer = ModuleWriter::new().file_version(version).instruction_set(version);
        let path = fixture.write_with(name, &base(), writer);
        loader.load(&path).unwrap();
    }
    assert_eq!(loader.module_count(), 2);
}

/// Every field starts at or after the end of the previous one and ends
/// within the raw size.
#[test]
fn field_offsets_respect_extents() {
    let fixture = Fixture::new();
    let mut module = ModuleDescriptor::new();
    let point = module.add_structure("Point", vec![Field::scalar(Type::INT); 2]);
    module.add_structure(
        "Mixed",
        vec![
            Field::scalar(Type::INT),
            Field::array(Type::SINGLE, 3),
            Field::scalar(Type::DOUBLE),
            Field::scalar(Type::Structure(StructureId::new(ModuleId::PENDING, point))),
            Field::array(Type::Structure(StructureId::new(ModuleId::PENDING, point)), 2),
            Field::scalar(Type::GC_POINTER),
            Field::scalar(Type::INT),
        ],
    );
    let path = fixture.write("mixed.shb", &module);

    let mut loader = Loader::new();
    let id = loader.load(&path).unwrap();
    for structure in loader.module(id).unwrap().structures() {
        let layout = structure.layout_state().layout().unwrap();
        let mut end = 0;
        for field in &structure.fields {
            let element = loader.layout(field.ty).unwrap();
            let extent = if field.is_array() {
                ARRAY_HEADER_SIZE + element.raw_size * usize::try_from(field.count).unwrap()
            } else {
                element.raw_size
            };
            assert!(field.offset >= end, "{}: field overlaps its predecessor", structure.name);
            assert_eq!(field.offset % element.raw_alignment, 0);
            end = field.offset + extent;
        }
        assert!(end <= layout.raw_size);
        assert!(layout.size > layout.raw_size);
    }
}
