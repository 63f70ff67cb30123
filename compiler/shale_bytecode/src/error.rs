//! Decode and encode errors.

use std::fmt;
use std::path::PathBuf;

use shale_ir::{Opcode, Version};

/// Which header version field was rejected.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VersionField {
    FileFormat,
    InstructionSet,
}

impl fmt::Display for VersionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionField::FileFormat => "file format",
            VersionField::InstructionSet => "instruction set",
        })
    }
}

/// Coarse classification of a [`DecodeError`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DecodeErrorKind {
    /// The file could not be opened or read.
    Io,
    /// Not a module file.
    Format,
    /// A module file of an unsupported version.
    Version,
    /// Structurally inconsistent content past the header.
    Malformed,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a module file (magic {found:02x?})")]
    InvalidMagic { found: Vec<u8> },

    #[error(
        "unsupported {field} version ordinal {found} (supported {}..={})",
        Version::LEAST,
        Version::LATEST
    )]
    UnsupportedVersion { field: VersionField, found: u16 },

    #[error("unexpected end of data at offset {offset}: {needed} more bytes required")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid field type code {code} at offset {offset}")]
    InvalidTypeCode { code: u32, offset: usize },

    #[error("type code {code} at offset {offset} names structure mapping {index}, but only {count} exist")]
    DanglingMapping {
        code: u32,
        index: u32,
        count: u32,
        offset: usize,
    },

    #[error("mapping `{name}` names dependency {index}, but only {count} are declared")]
    DanglingDependency { name: String, index: u32, count: u32 },

    #[error("invalid opcode byte {byte:#04x} for instruction set {version} at offset {offset}")]
    InvalidOpcode {
        byte: u8,
        version: Version,
        offset: usize,
    },

    #[error("invalid flag byte {value} at offset {offset}")]
    InvalidFlag { value: u8, offset: usize },

    #[error("array field with zero elements at offset {offset}")]
    EmptyArrayField { offset: usize },

    #[error("label {label} targets instruction {target}, but the stream has {count}")]
    LabelOutOfRange { label: u32, target: u64, count: u64 },

    #[error("length {length} at offset {offset} exceeds the remaining data")]
    LengthOverflow { length: u64, offset: usize },

    #[error("{count} trailing bytes after the entry point")]
    TrailingBytes { count: usize },

    #[error("no module has been parsed")]
    NotParsed,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::Io { .. } => DecodeErrorKind::Io,
            DecodeError::InvalidMagic { .. } => DecodeErrorKind::Format,
            DecodeError::UnsupportedVersion { .. } => DecodeErrorKind::Version,
            DecodeError::UnexpectedEof { .. }
            | DecodeError::InvalidUtf8 { .. }
            | DecodeError::InvalidTypeCode { .. }
            | DecodeError::DanglingMapping { .. }
            | DecodeError::DanglingDependency { .. }
            | DecodeError::InvalidOpcode { .. }
            | DecodeError::InvalidFlag { .. }
            | DecodeError::EmptyArrayField { .. }
            | DecodeError::LabelOutOfRange { .. }
            | DecodeError::LengthOverflow { .. }
            | DecodeError::TrailingBytes { .. }
            | DecodeError::NotParsed => DecodeErrorKind::Malformed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("cannot write `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("opcode `{opcode}` does not exist in instruction set {version}")]
    OpcodeUnavailable { opcode: Opcode, version: Version },

    #[error("field {field} of structure `{structure}` has a type with no on-disk code")]
    UnencodableType { structure: String, field: usize },

    #[error("function `{name}` is host-implemented and has no bytecode")]
    HostFunction { name: String },

    #[error("too many {what} to encode")]
    TooLarge { what: &'static str },
}
