//! Module file fixtures.

#![allow(dead_code, reason = "each test binary uses a subset of the fixtures")]
#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use std::path::PathBuf;

use shale_bytecode::{ModuleDescriptor, ModuleWriter};
use shale_ir::{Field, Type};
use tempfile::TempDir;

/// A scratch directory of module files.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> PathBuf {
        std::fs::canonicalize(self.dir.path()).unwrap()
    }

    pub fn write(&self, name: &str, module: &ModuleDescriptor) -> PathBuf {
        self.write_with(name, module, ModuleWriter::new())
    }

    pub fn write_with(&self, name: &str, module: &ModuleDescriptor, writer: ModuleWriter) -> PathBuf {
        self.write_bytes(name, &writer.encode(module).unwrap())
    }

    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

/// `Point { x: int, y: int }`.
pub fn base() -> ModuleDescriptor {
    let mut module = ModuleDescriptor::new();
    module.add_structure("Point", vec![Field::scalar(Type::INT); 2]);
    module
}

/// `Line { a: Point, b: Point }`, with `Point` imported from `dependency`.
pub fn app(dependency: &str) -> ModuleDescriptor {
    let mut module = ModuleDescriptor::new();
    let dep = module.add_dependency(dependency);
    let point = module.mappings.add_structure(dep, "Point");
    module.add_structure("Line", vec![Field::scalar(Type::Mapped(point)); 2]);
    module
}
