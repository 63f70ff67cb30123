//! Module file decoder.
//!
//! Decode order: magic, file-format version, instruction-set version,
//! dependencies, structure mappings, function mappings, constant pool,
//! structures, functions, entry point. Every count is checked against the
//! remaining input before anything is allocated, and every index is checked
//! against the table it points into.

use std::path::{Path, PathBuf};

use shale_ir::{
    decode_opcode, ConstantPool, Dependency, Field, FunctionBody, FunctionInfo, FundamentalType,
    Instructions, Mapping, Mappings, ModuleId, StructureId, StructureInfo, Type, TypeCode,
    Version,
};

use crate::descriptor::ModuleDescriptor;
use crate::error::{DecodeError, VersionField};
use crate::reader::ByteReader;
use crate::{ARRAY_FLAG, MAGIC, TYPE_CODE_MASK};

/// Decoder for one module file.
///
/// Single use: `open` (or `from_bytes`), `parse`, then `into_result`.
pub struct Parser {
    bytes: Vec<u8>,
    path: Option<PathBuf>,
    result: Option<ModuleDescriptor>,
}

impl Parser {
    /// Read a whole module file and record its canonical path.
    pub fn open(path: impl AsRef<Path>) -> Result<Parser, DecodeError> {
        let path = path.as_ref();
        let io_error = |source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = std::fs::canonicalize(path).map_err(io_error)?;
        let bytes = std::fs::read(&canonical).map_err(io_error)?;
        Ok(Parser {
            bytes,
            path: Some(canonical),
            result: None,
        })
    }

    /// Decode from memory. The descriptor will carry no path.
    pub fn from_bytes(bytes: Vec<u8>) -> Parser {
        Parser {
            bytes,
            path: None,
            result: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = ?self.path, len = self.bytes.len()))]
    pub fn parse(&mut self) -> Result<(), DecodeError> {
        let mut descriptor = decode(&self.bytes)?;
        descriptor.path.clone_from(&self.path);
        tracing::debug!(
            dependencies = descriptor.dependencies.len(),
            structures = descriptor.structures.len(),
            functions = descriptor.functions.len(),
            constants = descriptor.constant_pool.len(),
            "module decoded"
        );
        self.result = Some(descriptor);
        Ok(())
    }

    /// Move the decoded descriptor out.
    pub fn into_result(self) -> Result<ModuleDescriptor, DecodeError> {
        self.result.ok_or(DecodeError::NotParsed)
    }
}

/// Decode a complete module image.
pub fn decode(bytes: &[u8]) -> Result<ModuleDescriptor, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let magic = bytes.get(..MAGIC.len());
    if magic != Some(&MAGIC[..]) {
        return Err(DecodeError::InvalidMagic {
            found: bytes.iter().take(MAGIC.len()).copied().collect(),
        });
    }
    reader.read_exact(MAGIC.len())?;

    let file_version = read_version(&mut reader, VersionField::FileFormat)?;
    let instruction_set_version = read_version(&mut reader, VersionField::InstructionSet)?;

    let mut decoder = Decoder {
        reader,
        version: instruction_set_version,
    };
    let dependencies = decoder.dependencies()?;
    let mappings = decoder.mappings(&dependencies)?;
    let constant_pool = decoder.constant_pool()?;
    let structures = decoder.structures(&mappings)?;
    let functions = decoder.functions()?;
    let entry_point = decoder.instructions()?;

    let trailing = decoder.reader.remaining();
    if trailing != 0 {
        return Err(DecodeError::TrailingBytes { count: trailing });
    }

    Ok(ModuleDescriptor {
        path: None,
        file_version,
        instruction_set_version,
        dependencies,
        mappings,
        constant_pool,
        structures,
        functions,
        entry_point,
    })
}

fn read_version(reader: &mut ByteReader<'_>, field: VersionField) -> Result<Version, DecodeError> {
    let found = reader.read_u16()?;
    Version::from_ordinal(found)
        .filter(|version| version.is_supported())
        .ok_or(DecodeError::UnsupportedVersion { field, found })
}

struct Decoder<'a> {
    reader: ByteReader<'a>,
    version: Version,
}

impl Decoder<'_> {
    fn dependencies(&mut self) -> Result<Vec<Dependency>, DecodeError> {
        let count = self.reader.read_count(4)?;
        let mut dependencies = Vec::with_capacity(count);
        for _ in 0..count {
            dependencies.push(Dependency::new(self.reader.read_string()?));
        }
        Ok(dependencies)
    }

    fn mapping_table(&mut self, dependencies: usize) -> Result<Vec<Mapping>, DecodeError> {
        let count = self.reader.read_count(8)?;
        let dependency_count = u32::try_from(dependencies).unwrap_or(u32::MAX);
        let mut mappings = Vec::with_capacity(count);
        for _ in 0..count {
            let dependency = self.reader.read_u32()?;
            let name = self.reader.read_string()?;
            if dependency >= dependency_count {
                return Err(DecodeError::DanglingDependency {
                    name,
                    index: dependency,
                    count: dependency_count,
                });
            }
            mappings.push(Mapping { dependency, name });
        }
        Ok(mappings)
    }

    fn mappings(&mut self, dependencies: &[Dependency]) -> Result<Mappings, DecodeError> {
        let structures = self.mapping_table(dependencies.len())?;
        let functions = self.mapping_table(dependencies.len())?;
        Ok(Mappings::new(structures, functions))
    }

    fn constant_pool(&mut self) -> Result<ConstantPool, DecodeError> {
        let reader = &mut self.reader;

        let count = reader.read_count(4)?;
        let ints = (0..count).map(|_| reader.read_u32()).collect::<Result<Vec<_>, _>>()?;
        let count = reader.read_count(8)?;
        let longs = (0..count).map(|_| reader.read_u64()).collect::<Result<Vec<_>, _>>()?;
        let count = reader.read_count(4)?;
        let singles = (0..count).map(|_| reader.read_f32()).collect::<Result<Vec<_>, _>>()?;
        let count = reader.read_count(8)?;
        let doubles = (0..count).map(|_| reader.read_f64()).collect::<Result<Vec<_>, _>>()?;

        Ok(ConstantPool::new(ints, longs, singles, doubles))
    }

    fn structures(&mut self, mappings: &Mappings) -> Result<Vec<StructureInfo>, DecodeError> {
        // Name length plus field count.
        let count = self.reader.read_count(8)?;
        let structure_count = u32::try_from(count).unwrap_or(u32::MAX);
        let mut structures = Vec::with_capacity(count);
        for index in 0..structure_count {
            let name = self.reader.read_string()?;
            let field_count = self.reader.read_count(4)?;
            let mut fields = Vec::with_capacity(field_count);
            for _ in 0..field_count {
                fields.push(self.field(structure_count, mappings)?);
            }
            structures.push(StructureInfo::new(name, ModuleId::PENDING, index, fields));
        }
        Ok(structures)
    }

    fn field(&mut self, structure_count: u32, mappings: &Mappings) -> Result<Field, DecodeError> {
        let offset = self.reader.position();
        let word = self.reader.read_u32()?;
        let code = word & TYPE_CODE_MASK;
        let ty = resolve_type(code, offset, structure_count, mappings)?;

        if word & ARRAY_FLAG == 0 {
            return Ok(Field::scalar(ty));
        }
        let count_offset = self.reader.position();
        let count = self.reader.read_u64()?;
        if count == 0 {
            return Err(DecodeError::EmptyArrayField {
                offset: count_offset,
            });
        }
        Ok(Field::array(ty, count))
    }

    fn functions(&mut self) -> Result<Vec<FunctionInfo>, DecodeError> {
        // Name length, arity, flag, label count, instruction count.
        let count = self.reader.read_count(4 + 2 + 1 + 4 + 8)?;
        let mut functions = Vec::with_capacity(count);
        for index in 0..u32::try_from(count).unwrap_or(u32::MAX) {
            let name = self.reader.read_string()?;
            let arity = self.reader.read_u16()?;
            let has_result = self.reader.read_bool()?;
            let body = self.instructions()?;
            functions.push(FunctionInfo::new(
                name,
                index,
                arity,
                has_result,
                FunctionBody::Bytecode(body),
            ));
        }
        Ok(functions)
    }

    fn instructions(&mut self) -> Result<Instructions, DecodeError> {
        let label_count = self.reader.read_count(8)?;
        let labels = (0..label_count)
            .map(|_| self.reader.read_u64())
            .collect::<Result<Vec<_>, _>>()?;

        let count = self.reader.read_count_u64(1)?;
        let mut body = Instructions::new();
        for _ in 0..count {
            let offset = self.reader.position();
            let byte = self.reader.read_u8()?;
            let opcode = decode_opcode(byte, self.version).ok_or(DecodeError::InvalidOpcode {
                byte,
                version: self.version,
                offset,
            })?;
            let operand = if opcode.has_operand() {
                self.reader.read_u32()?
            } else {
                0
            };
            body.push(opcode, operand);
        }

        for (label, target) in labels.into_iter().enumerate() {
            if target >= body.len() {
                return Err(DecodeError::LabelOutOfRange {
                    label: u32::try_from(label).unwrap_or(u32::MAX),
                    target,
                    count: body.len(),
                });
            }
            body.add_label(target);
        }
        Ok(body)
    }
}

/// Resolve a field's type code: fundamentals first, then structures of this
/// module (forward references allowed), then structure mappings.
fn resolve_type(
    code: u32,
    offset: usize,
    structure_count: u32,
    mappings: &Mappings,
) -> Result<Type, DecodeError> {
    let invalid = DecodeError::InvalidTypeCode { code, offset };
    match TypeCode::from_raw(code) {
        Some(TypeCode::Structure(index)) if index < structure_count => Ok(Type::Structure(
            StructureId::new(ModuleId::PENDING, index),
        )),
        Some(TypeCode::Structure(index)) => {
            let mapping = index - structure_count;
            let count = u32::try_from(mappings.structures().len()).unwrap_or(u32::MAX);
            if mapping < count {
                Ok(Type::Mapped(mapping))
            } else {
                Err(DecodeError::DanglingMapping {
                    code,
                    index: mapping,
                    count,
                    offset,
                })
            }
        }
        Some(other) => match FundamentalType::from_code(other) {
            Some(fundamental) if fundamental.is_storable() => Ok(Type::Fundamental(fundamental)),
            _ => Err(invalid),
        },
        None => Err(invalid),
    }
}
