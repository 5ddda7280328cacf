//! Static machine descriptions shared by every host.
//!
//! Each architecture is described once as a `'static` [`MachineProfile`];
//! console and GUI hosts reach the same instance through [`ProfileId`].

use std::fmt;

use crate::{width_mask, MemoryWindow, Register};

/// Placeholder mnemonic for opcode patterns missing from a profile table.
pub const UNKNOWN_MNEMONIC: &str = "???";

/// Identifier of a registered machine profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ProfileId {
    /// 16-bit word hypothetical accumulator machine.
    Hypothetical,
    /// Simplified IAS machine with 40-bit words.
    Ias,
}

impl ProfileId {
    /// Every registered profile in menu order.
    pub const ALL: [Self; 2] = [Self::Hypothetical, Self::Ias];

    /// Returns the shared profile description.
    #[must_use]
    pub const fn profile(self) -> &'static MachineProfile {
        match self {
            Self::Hypothetical => &HYPOTHETICAL,
            Self::Ias => &IAS,
        }
    }

    /// Short command-line key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Hypothetical => "hypothetical",
            Self::Ias => "ias",
        }
    }

    /// Parses a command-line key (`hypothetical`, `hyp`, `ias`).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "hypothetical" | "hyp" => Some(Self::Hypothetical),
            "ias" => Some(Self::Ias),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hypothetical => "hypothetical machine",
            Self::Ias => "IAS machine",
        })
    }
}

/// Lists every registered profile.
#[must_use]
pub const fn list_profiles() -> &'static [ProfileId] {
    &ProfileId::ALL
}

/// Declared register and its bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterSpec {
    /// Register role.
    pub register: Register,
    /// Width in bits; every write is masked to it.
    pub width: u32,
}

const fn reg(register: Register, width: u32) -> RegisterSpec {
    RegisterSpec { register, width }
}

/// Operand addressing shown next to a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandForm {
    /// `M(X)`
    Memory,
    /// `-M(X)`
    Negated,
    /// `|M(X)|`
    Absolute,
    /// `-|M(X)|`
    NegatedAbsolute,
    /// `M(X,0:19)`
    LeftHalf,
    /// `M(X,20:39)`
    RightHalf,
    /// `M(X,8:19)`
    AddressField,
    /// No memory operand.
    Implied,
}

impl OperandForm {
    fn render(self, mnemonic: &str, address: &str) -> String {
        match self {
            Self::Memory => format!("{mnemonic} M({address})"),
            Self::Negated => format!("{mnemonic} -M({address})"),
            Self::Absolute => format!("{mnemonic} |M({address})|"),
            Self::NegatedAbsolute => format!("{mnemonic} -|M({address})|"),
            Self::LeftHalf => format!("{mnemonic} M({address},0:19)"),
            Self::RightHalf => format!("{mnemonic} M({address},20:39)"),
            Self::AddressField => format!("{mnemonic} M({address},8:19)"),
            Self::Implied => mnemonic.to_string(),
        }
    }
}

/// One row of a profile opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeEntry {
    /// Opcode field value.
    pub code: u8,
    /// Mnemonic name.
    pub mnemonic: &'static str,
    /// Operand addressing form.
    pub operand: OperandForm,
}

const fn op(code: u8, mnemonic: &'static str, operand: OperandForm) -> OpcodeEntry {
    OpcodeEntry {
        code,
        mnemonic,
        operand,
    }
}

impl OpcodeEntry {
    /// Table-style template with `X` standing for the operand address.
    #[must_use]
    pub fn template(&self) -> String {
        self.operand.render(self.mnemonic, "X")
    }
}

/// Which 20-bit instruction of a two-instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionHalf {
    /// High-order instruction, executed first.
    Left,
    /// Low-order instruction, buffered in IBR.
    Right,
}

impl InstructionHalf {
    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Packed instruction layout: `opcode | address` per instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionFormat {
    /// Bits of one instruction.
    pub instruction_bits: u32,
    /// Bits of the opcode field (high-order end of an instruction).
    pub opcode_bits: u32,
    /// Bits of the address field (low-order end of an instruction).
    pub address_bits: u32,
    /// Instructions packed into one memory word (1 or 2).
    pub per_word: u32,
}

impl InstructionFormat {
    /// Extracts one instruction from a memory word.
    ///
    /// Single-instruction words return the whole instruction for
    /// [`InstructionHalf::Left`] and zero for [`InstructionHalf::Right`].
    #[must_use]
    pub const fn instruction(&self, word: u64, half: InstructionHalf) -> u64 {
        let mask = width_mask(self.instruction_bits);
        match (self.per_word, half) {
            (2, InstructionHalf::Left) => (word >> self.instruction_bits) & mask,
            (2, InstructionHalf::Right) | (_, InstructionHalf::Left) => word & mask,
            (_, InstructionHalf::Right) => 0,
        }
    }

    /// Opcode field of a single instruction.
    ///
    /// Opcode fields are at most 8 bits wide in every profile.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn opcode(&self, instruction: u64) -> u8 {
        ((instruction >> self.address_bits) & width_mask(self.opcode_bits)) as u8
    }

    /// Address field of a single instruction.
    #[must_use]
    pub const fn address(&self, instruction: u64) -> u64 {
        instruction & width_mask(self.address_bits)
    }

    /// Mask selecting the address field.
    #[must_use]
    pub const fn address_mask(&self) -> u64 {
        width_mask(self.address_bits)
    }
}

/// How addresses are written in rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressRadix {
    /// `0x` prefixed upper-case hex, zero padded to `digits`.
    Hex {
        /// Minimum number of hex digits.
        digits: usize,
    },
    /// Plain decimal.
    Decimal,
}

/// Placement of the two halves of a multiply or divide result.
///
/// Only consulted by ALU combine steps that name a secondary destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SplitPolicy {
    /// Primary receives the truncated product or the quotient; secondary is cleared.
    #[default]
    Simplified,
    /// Primary receives the high-order product half or the quotient;
    /// secondary receives the low-order half or the remainder.
    Faithful,
}

/// Immutable description of one target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineProfile {
    id: ProfileId,
    title: &'static str,
    word_bits: u32,
    memory_words: usize,
    registers: &'static [RegisterSpec],
    opcodes: &'static [OpcodeEntry],
    format: InstructionFormat,
    radix: AddressRadix,
    windows: [MemoryWindow; 2],
    split_policy: SplitPolicy,
}

impl MachineProfile {
    /// Registry identifier.
    #[must_use]
    pub const fn id(&self) -> ProfileId {
        self.id
    }

    /// Banner title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Word size in bits.
    #[must_use]
    pub const fn word_bits(&self) -> u32 {
        self.word_bits
    }

    /// Address space size in words.
    #[must_use]
    pub const fn memory_words(&self) -> usize {
        self.memory_words
    }

    /// Declared registers in display order.
    #[must_use]
    pub const fn registers(&self) -> &'static [RegisterSpec] {
        self.registers
    }

    /// Width of `register`, if the profile declares it.
    #[must_use]
    pub fn register_width(&self, register: Register) -> Option<u32> {
        self.registers
            .iter()
            .find(|spec| spec.register == register)
            .map(|spec| spec.width)
    }

    /// Opcode table in ascending code order.
    #[must_use]
    pub const fn opcodes(&self) -> &'static [OpcodeEntry] {
        self.opcodes
    }

    /// Instruction packing layout.
    #[must_use]
    pub const fn format(&self) -> InstructionFormat {
        self.format
    }

    /// Instruction and data windows shown by the renderer.
    #[must_use]
    pub const fn windows(&self) -> [MemoryWindow; 2] {
        self.windows
    }

    /// Multiply/divide result placement.
    #[must_use]
    pub const fn split_policy(&self) -> SplitPolicy {
        self.split_policy
    }

    /// Returns a copy of this profile using a different split policy.
    #[must_use]
    pub const fn with_split_policy(mut self, policy: SplitPolicy) -> Self {
        self.split_policy = policy;
        self
    }

    /// Table entry for an opcode value.
    #[must_use]
    pub fn opcode_entry(&self, code: u8) -> Option<&'static OpcodeEntry> {
        self.opcodes.iter().find(|entry| entry.code == code)
    }

    /// Mnemonic for an opcode value, or [`UNKNOWN_MNEMONIC`].
    #[must_use]
    pub fn mnemonic(&self, code: u8) -> &'static str {
        self.opcode_entry(code)
            .map_or(UNKNOWN_MNEMONIC, |entry| entry.mnemonic)
    }

    /// Mnemonic for an exact binary opcode pattern such as `"0101"`.
    ///
    /// The pattern must have exactly the profile's opcode width.
    #[must_use]
    pub fn mnemonic_for_pattern(&self, pattern: &str) -> &'static str {
        let width_matches = usize::try_from(self.format.opcode_bits)
            .is_ok_and(|bits| bits == pattern.len());
        if !width_matches || !pattern.bytes().all(|b| b == b'0' || b == b'1') {
            return UNKNOWN_MNEMONIC;
        }
        u8::from_str_radix(pattern, 2).map_or(UNKNOWN_MNEMONIC, |code| self.mnemonic(code))
    }

    /// Renders an address in the profile's radix.
    #[must_use]
    pub fn format_address(&self, address: u64) -> String {
        match self.radix {
            AddressRadix::Hex { digits } => format!("0x{address:0digits$X}"),
            AddressRadix::Decimal => address.to_string(),
        }
    }

    /// Disassembles one instruction, e.g. `LOAD M(0x200)`.
    #[must_use]
    pub fn disassemble(&self, instruction: u64) -> String {
        let code = self.format.opcode(instruction);
        let address = self.format_address(self.format.address(instruction));
        self.opcode_entry(code).map_or_else(
            || format!("{UNKNOWN_MNEMONIC} M({address})"),
            |entry| entry.operand.render(entry.mnemonic, &address),
        )
    }

    /// Disassembles a memory word, including a non-zero right instruction.
    #[must_use]
    pub fn disassemble_word(&self, word: u64) -> String {
        let left = self.disassemble(self.format.instruction(word, InstructionHalf::Left));
        if self.format.per_word < 2 {
            return left;
        }
        let right = self.format.instruction(word, InstructionHalf::Right);
        if right == 0 {
            left
        } else {
            format!("{left} ; {}", self.disassemble(right))
        }
    }
}

const HYPOTHETICAL_REGISTERS: [RegisterSpec; 5] = [
    reg(Register::Pc, 12),
    reg(Register::Mar, 12),
    reg(Register::Mbr, 16),
    reg(Register::Ir, 16),
    reg(Register::Ac, 16),
];

const HYPOTHETICAL_OPCODES: [OpcodeEntry; 10] = [
    op(0x1, "LOAD", OperandForm::Memory),
    op(0x2, "STOR", OperandForm::Memory),
    op(0x3, "LOADIO", OperandForm::Memory),
    op(0x4, "STORIO", OperandForm::Memory),
    op(0x5, "ADD", OperandForm::Memory),
    op(0x6, "SUB", OperandForm::Memory),
    op(0x7, "JUMP", OperandForm::Memory),
    op(0x8, "JNEG", OperandForm::Memory),
    op(0x9, "JPOS", OperandForm::Memory),
    op(0xA, "JZERO", OperandForm::Memory),
];

const IAS_REGISTERS: [RegisterSpec; 7] = [
    reg(Register::Pc, 12),
    reg(Register::Mar, 12),
    reg(Register::Mbr, 40),
    reg(Register::Ir, 20),
    reg(Register::Ibr, 20),
    reg(Register::Ac, 40),
    reg(Register::Mq, 40),
];

const IAS_OPCODES: [OpcodeEntry; 18] = [
    op(0x01, "LOAD", OperandForm::Memory),
    op(0x02, "LOAD", OperandForm::Negated),
    op(0x03, "LOAD", OperandForm::Absolute),
    op(0x04, "LOAD", OperandForm::NegatedAbsolute),
    op(0x05, "STOR", OperandForm::Memory),
    op(0x06, "JUMP", OperandForm::LeftHalf),
    op(0x07, "JUMP", OperandForm::RightHalf),
    op(0x08, "JUMP+", OperandForm::LeftHalf),
    op(0x09, "JUMP+", OperandForm::RightHalf),
    op(0x0A, "ADD", OperandForm::Memory),
    op(0x0B, "ADD", OperandForm::Absolute),
    op(0x0C, "SUB", OperandForm::Memory),
    op(0x0D, "SUB", OperandForm::Absolute),
    op(0x0E, "MUL", OperandForm::Memory),
    op(0x0F, "DIV", OperandForm::Memory),
    op(0x10, "LSH", OperandForm::Implied),
    op(0x11, "RSH", OperandForm::Implied),
    op(0x12, "STOR", OperandForm::AddressField),
];

static HYPOTHETICAL: MachineProfile = MachineProfile {
    id: ProfileId::Hypothetical,
    title: "HYPOTHETICAL MACHINE",
    word_bits: 16,
    memory_words: 4096,
    registers: &HYPOTHETICAL_REGISTERS,
    opcodes: &HYPOTHETICAL_OPCODES,
    format: InstructionFormat {
        instruction_bits: 16,
        opcode_bits: 4,
        address_bits: 12,
        per_word: 1,
    },
    radix: AddressRadix::Hex { digits: 3 },
    windows: [
        MemoryWindow::instructions(0x100, 0x123),
        MemoryWindow::data(0x200, 0x223),
    ],
    split_policy: SplitPolicy::Simplified,
};

static IAS: MachineProfile = MachineProfile {
    id: ProfileId::Ias,
    title: "IAS COMPUTER",
    word_bits: 40,
    memory_words: 1000,
    registers: &IAS_REGISTERS,
    opcodes: &IAS_OPCODES,
    format: InstructionFormat {
        instruction_bits: 20,
        opcode_bits: 8,
        address_bits: 12,
        per_word: 2,
    },
    radix: AddressRadix::Decimal,
    windows: [MemoryWindow::instructions(0, 5), MemoryWindow::data(10, 13)],
    split_policy: SplitPolicy::Simplified,
};
