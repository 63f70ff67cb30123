//! Instruction streams.

use crate::opcode::Opcode;

/// One decoded instruction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    pub opcode: Opcode,
    /// Inline operand; 0 for opcodes without one.
    pub operand: u32,
    /// Byte offset of the opcode inside the canonical stream.
    pub offset: u64,
}

/// An instruction sequence and its jump targets.
///
/// A label is an instruction index. Offsets are always those of the
/// canonical encoding, so they do not depend on the version a stream was
/// decoded from.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instructions {
    labels: Vec<u64>,
    instructions: Vec<Instruction>,
    /// Offset the next pushed instruction will receive.
    end: u64,
}

impl Instructions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction at the running offset and return its index.
    /// The operand is dropped for opcodes that carry none.
    pub fn push(&mut self, opcode: Opcode, operand: u32) -> u64 {
        let operand = if opcode.has_operand() { operand } else { 0 };
        self.instructions.push(Instruction {
            opcode,
            operand,
            offset: self.end,
        });
        self.end += opcode.encoded_len() as u64;
        self.len() - 1
    }

    /// Reserve a new label pointing at `target`; returns the label number.
    pub fn add_label(&mut self, target: u64) -> u32 {
        self.labels.push(target);
        u32::try_from(self.labels.len() - 1).unwrap_or(u32::MAX)
    }

    /// Retarget an existing label. Returns `false` if the label is unknown.
    pub fn set_label(&mut self, label: u32, target: u64) -> bool {
        match self.labels.get_mut(label as usize) {
            Some(slot) => {
                *slot = target;
                true
            }
            None => false,
        }
    }

    /// Instruction index a label names.
    #[inline]
    pub fn label(&self, label: u32) -> Option<u64> {
        self.labels.get(label as usize).copied()
    }

    /// Byte offset of the instruction a label names.
    pub fn label_offset(&self, label: u32) -> Option<u64> {
        let target = self.label(label)?;
        self.get(target).map(|instruction| instruction.offset)
    }

    #[inline]
    pub fn get(&self, index: u64) -> Option<&Instruction> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.instructions.get(index))
    }

    #[inline]
    pub fn labels(&self) -> &[u64] {
        &self.labels
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.instructions.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Size of the canonical encoding in bytes.
    #[inline]
    pub fn byte_len(&self) -> u64 {
        self.end
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.instructions.clear();
        self.end = 0;
    }
}

impl<'a> IntoIterator for &'a Instructions {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
