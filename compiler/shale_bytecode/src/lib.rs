//! Shale Bytecode - Module File Format
//!
//! Binary decoding and encoding of Shale module files. All multi-byte values
//! are little-endian on disk regardless of host.
//!
//! # Layout
//!
//! ```text
//! magic              4 bytes  74 68 74 68
//! file version       u16      ordinal into the known-version table
//! instruction set    u16      ordinal into the known-version table
//! dependencies       u32 count, then strings
//! structure mappings u32 count, then (u32 dependency, string name)
//! function mappings  u32 count, then (u32 dependency, string name)
//! constant pool      u32 count + u32s, u64s, f32 bits, f64 bits
//! structures         u32 count, then (string name, u32 field count, fields)
//! functions          u32 count, then (string name, u16 arity, u8 has result, stream)
//! entry point        stream
//! ```
//!
//! A string is a u32 byte length followed by UTF-8. A field is a u32 word
//! whose top bit marks an inline array (followed by a u64 element count) and
//! whose low 31 bits are the type code. A stream is a u32 label count, the
//! labels as u64 instruction indices, a u64 instruction count, then each
//! opcode byte with a u32 operand when the opcode carries one.

mod descriptor;
mod error;
mod parser;
mod reader;
mod writer;

pub use descriptor::ModuleDescriptor;
pub use error::{DecodeError, DecodeErrorKind, EncodeError, VersionField};
pub use parser::{decode, Parser};
pub use writer::ModuleWriter;

/// File signature.
pub const MAGIC: [u8; 4] = [0x74, 0x68, 0x74, 0x68];

/// Field word bit marking an inline array.
pub const ARRAY_FLAG: u32 = 1 << 31;

/// Field word bits holding the type code.
pub const TYPE_CODE_MASK: u32 = !ARRAY_FLAG;
