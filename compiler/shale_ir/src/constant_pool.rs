//! Per-module literal table.
//!
//! Four homogeneous collections concatenated into one flat index space in a
//! fixed order: int, long, single, double. Each kind's offset is the total
//! count of the kinds before it.
//!
//! Insertion never deduplicates; callers that want sharing look a value up
//! first with the matching `find_*`. Float lookups compare bit patterns.

use crate::types::Type;

/// One literal, tagged with its kind.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Int(u32),
    Long(u64),
    Single(f32),
    Double(f64),
}

impl Constant {
    pub const fn ty(self) -> Type {
        match self {
            Constant::Int(_) => Type::INT,
            Constant::Long(_) => Type::LONG,
            Constant::Single(_) => Type::SINGLE,
            Constant::Double(_) => Type::DOUBLE,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantPool {
    ints: Vec<u32>,
    longs: Vec<u64>,
    singles: Vec<f32>,
    doubles: Vec<f64>,
}

fn position<T>(values: &[T], mut matches: impl FnMut(&T) -> bool) -> Option<u32> {
    values
        .iter()
        .position(|value| matches(value))
        .and_then(|index| u32::try_from(index).ok())
}

fn last_index(len: usize) -> u32 {
    u32::try_from(len.saturating_sub(1)).unwrap_or(u32::MAX)
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl ConstantPool {
    pub fn new(ints: Vec<u32>, longs: Vec<u64>, singles: Vec<f32>, doubles: Vec<f64>) -> Self {
        ConstantPool {
            ints,
            longs,
            singles,
            doubles,
        }
    }

    pub fn clear(&mut self) {
        self.ints.clear();
        self.longs.clear();
        self.singles.clear();
        self.doubles.clear();
    }

    // Kind-local insertion. Returns the index within the kind.

    pub fn add_int(&mut self, value: u32) -> u32 {
        self.ints.push(value);
        last_index(self.ints.len())
    }

    pub fn add_long(&mut self, value: u64) -> u32 {
        self.longs.push(value);
        last_index(self.longs.len())
    }

    pub fn add_single(&mut self, value: f32) -> u32 {
        self.singles.push(value);
        last_index(self.singles.len())
    }

    pub fn add_double(&mut self, value: f64) -> u32 {
        self.doubles.push(value);
        last_index(self.doubles.len())
    }

    // Kind-local lookup of the first matching value.

    pub fn find_int(&self, value: u32) -> Option<u32> {
        position(&self.ints, |&v| v == value)
    }

    pub fn find_long(&self, value: u64) -> Option<u32> {
        position(&self.longs, |&v| v == value)
    }

    pub fn find_single(&self, value: f32) -> Option<u32> {
        position(&self.singles, |v| v.to_bits() == value.to_bits())
    }

    pub fn find_double(&self, value: f64) -> Option<u32> {
        position(&self.doubles, |v| v.to_bits() == value.to_bits())
    }

    // Flat index space.

    #[inline]
    pub fn int_offset(&self) -> u32 {
        0
    }

    #[inline]
    pub fn long_offset(&self) -> u32 {
        self.int_offset() + self.int_count()
    }

    #[inline]
    pub fn single_offset(&self) -> u32 {
        self.long_offset() + self.long_count()
    }

    #[inline]
    pub fn double_offset(&self) -> u32 {
        self.single_offset() + self.single_count()
    }

    #[inline]
    pub fn int_count(&self) -> u32 {
        count(self.ints.len())
    }

    #[inline]
    pub fn long_count(&self) -> u32 {
        count(self.longs.len())
    }

    #[inline]
    pub fn single_count(&self) -> u32 {
        count(self.singles.len())
    }

    #[inline]
    pub fn double_count(&self) -> u32 {
        count(self.doubles.len())
    }

    /// Total number of constants across all kinds.
    #[inline]
    pub fn len(&self) -> u32 {
        self.double_offset() + self.double_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Constant at a flat index.
    pub fn get(&self, index: u32) -> Option<Constant> {
        if index < self.long_offset() {
            self.ints.get(index as usize).copied().map(Constant::Int)
        } else if index < self.single_offset() {
            let local = index - self.long_offset();
            self.longs.get(local as usize).copied().map(Constant::Long)
        } else if index < self.double_offset() {
            let local = index - self.single_offset();
            self.singles.get(local as usize).copied().map(Constant::Single)
        } else {
            let local = index - self.double_offset();
            self.doubles.get(local as usize).copied().map(Constant::Double)
        }
    }

    /// Type of the constant at a flat index.
    pub fn constant_type(&self, index: u32) -> Option<Type> {
        self.get(index).map(Constant::ty)
    }

    #[inline]
    pub fn ints(&self) -> &[u32] {
        &self.ints
    }

    #[inline]
    pub fn longs(&self) -> &[u64] {
        &self.longs
    }

    #[inline]
    pub fn singles(&self) -> &[f32] {
        &self.singles
    }

    #[inline]
    pub fn doubles(&self) -> &[f64] {
        &self.doubles
    }
}

#[cfg(test)]
mod tests;
