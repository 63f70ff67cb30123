//! Module file encoder, the inverse of [`crate::parser`].

use std::path::Path;

use shale_ir::{encode_opcode, Field, FunctionBody, Instructions, Mapping, Type, TypeCode, Version};

use crate::descriptor::ModuleDescriptor;
use crate::error::EncodeError;
use crate::{ARRAY_FLAG, MAGIC};

/// Serializes module descriptors for a target version pair.
///
/// Any known version can be targeted, including ones the decoder no longer
/// accepts. Opcodes absent from the target instruction set are an error.
#[derive(Copy, Clone, Debug)]
pub struct ModuleWriter {
    file_version: Version,
    instruction_set: Version,
}

impl Default for ModuleWriter {
    fn default() -> Self {
        ModuleWriter {
            file_version: Version::LATEST,
            instruction_set: Version::LATEST,
        }
    }
}

impl ModuleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn file_version(mut self, version: Version) -> Self {
        self.file_version = version;
        self
    }

    #[must_use]
    pub fn instruction_set(mut self, version: Version) -> Self {
        self.instruction_set = version;
        self
    }

    pub fn encode(&self, module: &ModuleDescriptor) -> Result<Vec<u8>, EncodeError> {
        let mut out = Encoder {
            buf: Vec::new(),
            version: self.instruction_set,
        };
        out.write_bytes(&MAGIC);
        out.write_u16(self.file_version.ordinal());
        out.write_u16(self.instruction_set.ordinal());

        out.write_count(module.dependencies.len(), "dependencies")?;
        for dependency in &module.dependencies {
            out.write_string(&dependency.path)?;
        }

        out.write_mappings(module.mappings.structures())?;
        out.write_mappings(module.mappings.functions())?;

        let pool = &module.constant_pool;
        out.write_count(pool.ints().len(), "constants")?;
        pool.ints().iter().for_each(|&v| out.write_u32(v));
        out.write_count(pool.longs().len(), "constants")?;
        pool.longs().iter().for_each(|&v| out.write_u64(v));
        out.write_count(pool.singles().len(), "constants")?;
        pool.singles().iter().for_each(|&v| out.write_u32(v.to_bits()));
        out.write_count(pool.doubles().len(), "constants")?;
        pool.doubles().iter().for_each(|&v| out.write_u64(v.to_bits()));

        let structure_count = module.structures.len();
        out.write_count(structure_count, "structures")?;
        for structure in &module.structures {
            out.write_string(&structure.name)?;
            out.write_count(structure.fields.len(), "fields")?;
            for (index, field) in structure.fields.iter().enumerate() {
                let word = field_word(field, structure_count).ok_or_else(|| {
                    EncodeError::UnencodableType {
                        structure: structure.name.clone(),
                        field: index,
                    }
                })?;
                out.write_u32(word);
                if field.is_array() {
                    out.write_u64(field.count);
                }
            }
        }

        out.write_count(module.functions.len(), "functions")?;
        for function in &module.functions {
            let FunctionBody::Bytecode(body) = &function.body else {
                return Err(EncodeError::HostFunction {
                    name: function.name.clone(),
                });
            };
            out.write_string(&function.name)?;
            out.write_u16(function.arity);
            out.write_u8(u8::from(function.has_result));
            out.write_instructions(body)?;
        }

        out.write_instructions(&module.entry_point)?;
        Ok(out.buf)
    }

    pub fn write_file(
        &self,
        module: &ModuleDescriptor,
        path: impl AsRef<Path>,
    ) -> Result<(), EncodeError> {
        let path = path.as_ref();
        let bytes = self.encode(module)?;
        std::fs::write(path, bytes).map_err(|source| EncodeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// On-disk field word, or `None` for types with no code.
fn field_word(field: &Field, structure_count: usize) -> Option<u32> {
    let code = match field.ty {
        Type::Fundamental(fundamental) if fundamental.is_storable() => {
            fundamental.info().code.raw()
        }
        Type::Fundamental(_) => return None,
        // Only structures of the module being written have a local code.
        Type::Structure(id) if !id.module.is_assigned() => TypeCode::Structure(id.index).raw(),
        Type::Structure(_) => return None,
        Type::Mapped(index) => {
            let local = u32::try_from(structure_count).ok()?.checked_add(index)?;
            TypeCode::STRUCTURE_BASE.checked_add(local)?
        }
    };
    if code > TypeCode::MAX_RAW {
        return None;
    }
    Some(if field.is_array() { code | ARRAY_FLAG } else { code })
}

struct Encoder {
    buf: Vec<u8>,
    version: Version,
}

impl Encoder {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, count: usize, what: &'static str) -> Result<(), EncodeError> {
        let count = u32::try_from(count).map_err(|_| EncodeError::TooLarge { what })?;
        self.write_u32(count);
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        self.write_count(s.len(), "string bytes")?;
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    fn write_mappings(&mut self, mappings: &[Mapping]) -> Result<(), EncodeError> {
        self.write_count(mappings.len(), "mappings")?;
        for mapping in mappings {
            self.write_u32(mapping.dependency);
            self.write_string(&mapping.name)?;
        }
        Ok(())
    }

    fn write_instructions(&mut self, body: &Instructions) -> Result<(), EncodeError> {
        self.write_count(body.labels().len(), "labels")?;
        for &label in body.labels() {
            self.write_u64(label);
        }
        self.write_u64(body.len());
        for instruction in body {
            let byte = encode_opcode(instruction.opcode, self.version).ok_or(
                EncodeError::OpcodeUnavailable {
                    opcode: instruction.opcode,
                    version: self.version,
                },
            )?;
            self.write_u8(byte);
            if instruction.opcode.has_operand() {
                self.write_u32(instruction.operand);
            }
        }
        Ok(())
    }
}
