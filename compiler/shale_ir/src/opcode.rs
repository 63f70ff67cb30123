//! Canonical opcode enumeration and per-opcode properties.
//!
//! Canonical numbering is the newest instruction set's. Older on-disk
//! encodings are translated in `version`.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Static opcode properties.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct OpcodeFlags: u8 {
        /// Followed by an inline 32-bit operand.
        const OPERAND = 1 << 0;
        /// Conditional or unconditional branch; the operand is a label.
        const JUMP = 1 << 1;
        /// The operand is a function index.
        const CALL = 1 << 2;
        /// Allocates an object; the operand is a type code.
        const ALLOCATION = 1 << 3;
        /// Decodes, but has no execution semantics.
        const UNSUPPORTED = 1 << 4;
    }
}

/// Static description of one opcode.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub flags: OpcodeFlags,
}

const NONE: OpcodeFlags = OpcodeFlags::empty();
const OPERAND: OpcodeFlags = OpcodeFlags::OPERAND;
const JUMP: OpcodeFlags = OpcodeFlags::OPERAND.union(OpcodeFlags::JUMP);
const CALL: OpcodeFlags = OpcodeFlags::OPERAND.union(OpcodeFlags::CALL);
const ALLOC: OpcodeFlags = OpcodeFlags::OPERAND.union(OpcodeFlags::ALLOCATION);
const UNSUPPORTED: OpcodeFlags = OpcodeFlags::UNSUPPORTED;

macro_rules! opcodes {
    ($($variant:ident = $mnemonic:literal, $flags:expr;)*) => {
        /// A canonical instruction kind.
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u8)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// Every opcode, indexed by canonical value.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];
        }

        /// Property table indexed by canonical value.
        static OPCODE_TABLE: &[OpcodeInfo] = &[
            $(OpcodeInfo { mnemonic: $mnemonic, flags: $flags },)*
        ];
    };
}

opcodes! {
    Nop = "nop", NONE;
    Push = "push", OPERAND;
    Pop = "pop", NONE;
    Load = "load", OPERAND;
    Store = "store", OPERAND;
    Lea = "lea", OPERAND;
    FLea = "flea", OPERAND;
    TLoad = "tload", NONE;
    TStore = "tstore", NONE;
    Copy = "copy", NONE;
    Swap = "swap", NONE;

    Add = "add", NONE;
    Sub = "sub", NONE;
    Mul = "mul", NONE;
    IMul = "imul", NONE;
    Div = "div", NONE;
    IDiv = "idiv", NONE;
    Mod = "mod", NONE;
    IMod = "imod", NONE;
    Neg = "neg", NONE;
    Inc = "inc", NONE;
    Dec = "dec", NONE;

    And = "and", NONE;
    Or = "or", NONE;
    Xor = "xor", NONE;
    Not = "not", NONE;
    Shl = "shl", NONE;
    Sal = "sal", NONE;
    Shr = "shr", NONE;
    Sar = "sar", NONE;

    Cmp = "cmp", NONE;
    ICmp = "icmp", NONE;
    Jmp = "jmp", JUMP;
    Je = "je", JUMP;
    Jne = "jne", JUMP;
    Ja = "ja", JUMP;
    Jae = "jae", JUMP;
    Jb = "jb", JUMP;
    Jbe = "jbe", JUMP;
    Call = "call", CALL;
    Ret = "ret", NONE;

    ToB = "tob", UNSUPPORTED;
    ToSh = "tosh", UNSUPPORTED;
    ToI = "toi", NONE;
    ToL = "tol", NONE;
    ToSi = "tosi", NONE;
    ToD = "tod", NONE;
    ToP = "top", OPERAND;

    Null = "null", NONE;
    New = "new", ALLOC;
    Delete = "delete", NONE;
    GCNull = "gcnull", NONE;
    GCNew = "gcnew", ALLOC;

    APush = "apush", OPERAND;
    ANew = "anew", ALLOC;
    AGCNew = "agcnew", ALLOC;
    ALea = "alea", NONE;
    Count = "count", NONE;
}

/// Number of canonical opcodes.
pub const OPCODE_COUNT: usize = Opcode::ALL.len();

impl Opcode {
    /// Opcode with canonical value `value`, if any.
    #[inline]
    pub fn from_canonical(value: u8) -> Option<Opcode> {
        Self::ALL.get(usize::from(value)).copied()
    }

    #[inline]
    pub const fn canonical(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn info(self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[self as usize]
    }

    #[inline]
    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    #[inline]
    pub fn flags(self) -> OpcodeFlags {
        self.info().flags
    }

    /// Whether a 32-bit operand follows the opcode byte.
    #[inline]
    pub fn has_operand(self) -> bool {
        self.flags().contains(OpcodeFlags::OPERAND)
    }

    #[inline]
    pub fn is_jump(self) -> bool {
        self.flags().contains(OpcodeFlags::JUMP)
    }

    /// Encoded size in bytes: the opcode byte plus its operand, if any.
    #[inline]
    pub fn encoded_len(self) -> usize {
        if self.has_operand() {
            5
        } else {
            1
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
