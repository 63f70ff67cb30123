//! Format and instruction-set versions, and opcode translation between
//! historical encodings and canonical opcodes.
//!
//! Each version knows the rules that upgrade its opcode bytes to the next
//! version's numbering. A rule `(threshold, delta)` shifts every byte at or
//! above `threshold` by `delta`. Decoding applies the rules oldest to newest;
//! encoding undoes them newest to oldest. Supporting a new instruction set
//! means appending a version and its rules, not writing new logic.

use std::fmt;

use crate::opcode::{Opcode, OPCODE_COUNT};

/// A known version. On disk each version field is this ordinal as a `u16`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Version {
    V0_1_0,
    V0_2_0,
    V0_3_0,
    V0_4_0,
    V0_5_0,
}

/// One opcode renumbering step between adjacent versions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CompatRule {
    /// First byte, in the older numbering, that moves.
    pub threshold: u8,
    pub delta: u8,
}

impl Version {
    pub const ALL: [Version; 5] = [
        Version::V0_1_0,
        Version::V0_2_0,
        Version::V0_3_0,
        Version::V0_4_0,
        Version::V0_5_0,
    ];

    /// Oldest version the decoder accepts.
    pub const LEAST: Version = Version::V0_4_0;

    /// Newest version; its opcode numbering is canonical.
    pub const LATEST: Version = Version::V0_5_0;

    pub fn from_ordinal(ordinal: u16) -> Option<Version> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    #[inline]
    pub const fn ordinal(self) -> u16 {
        self as u16
    }

    /// `(major, minor, patch)`.
    pub const fn triple(self) -> (u16, u16, u16) {
        match self {
            Version::V0_1_0 => (0, 1, 0),
            Version::V0_2_0 => (0, 2, 0),
            Version::V0_3_0 => (0, 3, 0),
            Version::V0_4_0 => (0, 4, 0),
            Version::V0_5_0 => (0, 5, 0),
        }
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        (Self::LEAST..=Self::LATEST).contains(&self)
    }

    /// Rules translating this version's opcode bytes into the next
    /// version's numbering.
    ///
    /// Every supported instruction set shares the canonical numbering, so
    /// no version carries rules yet.
    pub const fn upgrade_rules(self) -> &'static [CompatRule] {
        match self {
            Version::V0_1_0
            | Version::V0_2_0
            | Version::V0_3_0
            | Version::V0_4_0
            | Version::V0_5_0 => &[],
        }
    }

    /// Versions from `self` (inclusive) up to the latest (exclusive).
    fn upgrade_path(self) -> &'static [Version] {
        let start = self.ordinal() as usize;
        let end = Self::LATEST.ordinal() as usize;
        Self::ALL.get(start..end).unwrap_or(&[])
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch) = self.triple();
        write!(f, "{major}.{minor}.{patch}")
    }
}

/// Translate an on-disk opcode byte written for `version` into a canonical
/// opcode. Returns `None` for bytes that name no opcode.
pub fn decode_opcode(byte: u8, version: Version) -> Option<Opcode> {
    upgrade(byte, version.upgrade_path().iter().map(|step| step.upgrade_rules()))
}

/// Encode a canonical opcode for `version`. Returns `None` if the opcode did
/// not exist yet in that version.
pub fn encode_opcode(opcode: Opcode, version: Version) -> Option<u8> {
    downgrade(opcode, version.upgrade_path().iter().map(|step| step.upgrade_rules()))
}

/// Apply `steps` oldest to newest.
fn upgrade<'a>(byte: u8, steps: impl Iterator<Item = &'a [CompatRule]>) -> Option<Opcode> {
    let mut value = u16::from(byte);
    for rules in steps {
        for rule in rules {
            if value >= u16::from(rule.threshold) {
                value += u16::from(rule.delta);
            }
        }
    }
    if usize::from(value) >= OPCODE_COUNT {
        return None;
    }
    u8::try_from(value).ok().and_then(Opcode::from_canonical)
}

/// Undo `steps` newest to oldest.
fn downgrade<'a>(
    opcode: Opcode,
    steps: impl DoubleEndedIterator<Item = &'a [CompatRule]>,
) -> Option<u8> {
    let mut value = u16::from(opcode.canonical());
    for rules in steps.rev() {
        for rule in rules.iter().rev() {
            let threshold = u16::from(rule.threshold);
            let delta = u16::from(rule.delta);
            if value >= threshold + delta {
                value -= delta;
            } else if value >= threshold {
                return None;
            }
        }
    }
    u8::try_from(value).ok()
}

#[cfg(test)]
mod tests;
