//! Structured micro-step descriptors.
//!
//! A step's behavior is fully determined by its [`MicroOp`] variant and
//! operands. Display text is generated from that data and never parsed back.

use std::fmt;

use crate::{InstructionHalf, Register};

/// Half of the instruction cycle a micro-step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Phase {
    /// Instruction fetch.
    Fetch,
    /// Decode and execute.
    Execute,
}

impl Phase {
    /// Label prefix used in step descriptions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fetch => "Fetch cycle",
            Self::Execute => "Execute cycle",
        }
    }
}

/// ALU operations available to combine steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Integer division.
    Div,
}

impl AluOp {
    /// Noun used in "ALU performing ..." labels.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Add => "addition",
            Self::Sub => "subtraction",
            Self::Mul => "multiplication",
            Self::Div => "division",
        }
    }

    /// Returns `true` for operations that may split their result.
    #[must_use]
    pub const fn splits_result(self) -> bool {
        matches!(self, Self::Mul | Self::Div)
    }
}

/// Coarse step classification consumed by the control-unit tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepKind {
    /// Register transfer or memory access.
    Transfer,
    /// Instruction decode.
    Decode,
    /// ALU activity for the given operation.
    Alu(AluOp),
}

impl StepKind {
    /// Returns `true` for ALU and decode steps.
    #[must_use]
    pub const fn is_alu_or_decode(self) -> bool {
        matches!(self, Self::Decode | Self::Alu(_))
    }
}

/// Register-transfer semantics of one micro-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MicroOp {
    /// Points at a register without changing it.
    Observe {
        /// Register being observed.
        register: Register,
    },
    /// `to <- from`
    CopyRegister {
        /// Source register.
        from: Register,
        /// Destination register.
        to: Register,
    },
    /// `dest <- M[address]`
    ReadMemory {
        /// Register holding the address.
        address: Register,
        /// Destination register.
        dest: Register,
    },
    /// `M[address] <- value`
    WriteMemory {
        /// Register holding the address.
        address: Register,
        /// Register holding the value.
        value: Register,
    },
    /// `register <- register + 1`
    IncrementRegister {
        /// Register to increment.
        register: Register,
    },
    /// `to <- half(from)` for two-instruction words.
    LoadInstructionHalf {
        /// Instruction selected from the word.
        half: InstructionHalf,
        /// Register holding the word.
        from: Register,
        /// Destination register.
        to: Register,
    },
    /// Marks the control unit as decoding the instruction in `register`.
    DecodeOpcode {
        /// Register holding the instruction.
        register: Register,
    },
    /// `dest <- source & mask`
    ExtractAddress {
        /// Register holding the instruction.
        source: Register,
        /// Address field mask.
        mask: u64,
        /// Destination register.
        dest: Register,
    },
    /// Announces the ALU operation about to be performed.
    AluSignal {
        /// Operation being started.
        op: AluOp,
    },
    /// `dest <- left op right`, optionally splitting into `secondary`.
    AluCombine {
        /// Operation performed.
        op: AluOp,
        /// Left operand register.
        left: Register,
        /// Right operand register.
        right: Register,
        /// Primary destination (high half or quotient).
        dest: Register,
        /// Secondary destination (low half or remainder) for multiply/divide.
        secondary: Option<Register>,
    },
}

impl MicroOp {
    /// Coarse classification for the control-unit tracker.
    #[must_use]
    pub const fn kind(&self) -> StepKind {
        match self {
            Self::DecodeOpcode { .. } => StepKind::Decode,
            Self::AluSignal { op } | Self::AluCombine { op, .. } => StepKind::Alu(*op),
            Self::Observe { .. }
            | Self::CopyRegister { .. }
            | Self::ReadMemory { .. }
            | Self::WriteMemory { .. }
            | Self::IncrementRegister { .. }
            | Self::LoadInstructionHalf { .. }
            | Self::ExtractAddress { .. } => StepKind::Transfer,
        }
    }

    /// Registers whose current value the step consumes.
    #[must_use]
    pub fn reads(&self) -> Vec<Register> {
        match *self {
            Self::Observe { register }
            | Self::IncrementRegister { register }
            | Self::DecodeOpcode { register } => vec![register],
            Self::CopyRegister { from, .. } | Self::LoadInstructionHalf { from, .. } => vec![from],
            Self::ReadMemory { address, .. } => vec![address],
            Self::WriteMemory { address, value } => vec![address, value],
            Self::ExtractAddress { source, .. } => vec![source],
            Self::AluSignal { .. } => Vec::new(),
            Self::AluCombine { left, right, .. } => vec![left, right],
        }
    }

    /// Registers the step writes.
    #[must_use]
    pub fn writes(&self) -> Vec<Register> {
        match *self {
            Self::CopyRegister { to, .. } | Self::LoadInstructionHalf { to, .. } => vec![to],
            Self::ReadMemory { dest, .. } | Self::ExtractAddress { dest, .. } => vec![dest],
            Self::IncrementRegister { register } => vec![register],
            Self::AluCombine {
                op,
                dest,
                secondary,
                ..
            } => match secondary {
                Some(low) if op.splits_result() => vec![dest, low],
                _ => vec![dest],
            },
            Self::Observe { .. }
            | Self::WriteMemory { .. }
            | Self::DecodeOpcode { .. }
            | Self::AluSignal { .. } => Vec::new(),
        }
    }
}

/// One indivisible unit of the fetch or execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MicroStep {
    /// Cycle phase.
    pub phase: Phase,
    /// Semantics and operands.
    pub op: MicroOp,
}

impl MicroStep {
    /// Fetch-phase step.
    #[must_use]
    pub const fn fetch(op: MicroOp) -> Self {
        Self {
            phase: Phase::Fetch,
            op,
        }
    }

    /// Execute-phase step.
    #[must_use]
    pub const fn execute(op: MicroOp) -> Self {
        Self {
            phase: Phase::Execute,
            op,
        }
    }

    /// Coarse classification for the control-unit tracker.
    #[must_use]
    pub const fn kind(&self) -> StepKind {
        self.op.kind()
    }

    /// Fixed, value-free label, e.g. `Fetch cycle - Copy PC to MAR`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.phase.label(), self.action())
    }

    fn action(&self) -> String {
        match self.op {
            MicroOp::Observe { register } => {
                format!("{register} holds the address of the instruction")
            }
            MicroOp::CopyRegister { from, to } => format!("Copy {from} to {to}"),
            MicroOp::ReadMemory { dest, .. } => match self.phase {
                Phase::Fetch => format!("Read instruction word from memory into {dest}"),
                Phase::Execute => format!("Read data from memory into {dest}"),
            },
            MicroOp::WriteMemory { address, value } => {
                format!("Write {value} to memory at {address}")
            }
            MicroOp::IncrementRegister { register } => format!("Increment {register}"),
            MicroOp::LoadInstructionHalf { half, from, to } => {
                format!("Transfer {} instruction of {from} to {to}", half.name())
            }
            MicroOp::DecodeOpcode { register } => format!("Decode instruction in {register}"),
            MicroOp::ExtractAddress { source, dest, .. } => {
                format!("Extract operand address from {source} into {dest}")
            }
            MicroOp::AluSignal { op } => format!("ALU performing {}", op.noun()),
            MicroOp::AluCombine {
                op,
                left,
                right,
                dest,
                secondary,
            } => combine_action(op, left, right, dest, secondary),
        }
    }
}

fn combine_action(
    op: AluOp,
    left: Register,
    right: Register,
    dest: Register,
    secondary: Option<Register>,
) -> String {
    let base = match op {
        AluOp::Add => format!("Add {right} to {left}"),
        AluOp::Sub => format!("Subtract {right} from {left}"),
        AluOp::Mul => format!("Multiply {left} by {right}"),
        AluOp::Div => format!("Divide {left} by {right}"),
    };
    match (op, secondary) {
        (AluOp::Mul, Some(low)) => format!("{base}; high part to {dest}, low part to {low}"),
        (AluOp::Div, Some(rem)) => format!("{base}; quotient to {dest}, remainder to {rem}"),
        _ if dest == left => base,
        _ => format!("{base} into {dest}"),
    }
}

impl fmt::Display for MicroStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
