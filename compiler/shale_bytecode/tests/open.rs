//! Reading module files from disk.

#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use shale_bytecode::{DecodeErrorKind, ModuleDescriptor, ModuleWriter, Parser};
use shale_ir::{Field, Type};

#[test]
fn open_parse_and_take_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("point.shb");

    let mut module = ModuleDescriptor::new();
    module.add_structure("Point", vec![Field::scalar(Type::INT), Field::scalar(Type::INT)]);
    ModuleWriter::new().write_file(&module, &path).unwrap();

    // Open through a non-canonical spelling of the same file.
    let mut parser = Parser::open(dir.path().join(".").join("point.shb")).unwrap();
    let canonical = std::fs::canonicalize(&path).unwrap();
    assert_eq!(parser.path(), Some(canonical.as_path()));

    parser.parse().unwrap();
    let decoded = parser.into_result().unwrap();
    assert_eq!(decoded.path.as_deref(), Some(canonical.as_path()));
    assert_eq!(decoded.structures, module.structures);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let Err(err) = Parser::open(dir.path().join("absent.shb")) else {
        panic!("opening a missing file succeeded");
    };
    assert_eq!(err.kind(), DecodeErrorKind::Io);
}

#[test]
fn garbage_file_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.shb");
    std::fs::write(&path, b"not a module").unwrap();

    let mut parser = Parser::open(&path).unwrap();
    assert_eq!(parser.parse().unwrap_err().kind(), DecodeErrorKind::Format);
}
