//! Micro-step execution.
//!
//! Each step runs in two phases:
//! 1. Read operands and compute every register and memory effect
//! 2. Commit the effects
//!
//! Phase 1 never mutates state, so a faulting step leaves no partial side
//! effects behind.

mod alu;
mod machine;

pub use alu::{combine, AluInputs, AluOutput};
pub use machine::{AppliedStep, Machine, StepEngine};

use std::fmt::Write as _;

use crate::memory::Memory;
use crate::state::{truncate_to_width, RegisterFile};
use crate::{AluOp, MachineProfile, MicroOp, MicroStep, Phase, Register, SimError};

/// Side effects of one micro-step, computed before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepEffect {
    /// Register writes in commit order, already masked to register width.
    pub register_writes: Vec<(Register, u64)>,
    /// `(address, value)` read from memory.
    pub memory_read: Option<(u64, u64)>,
    /// `(address, value)` to store, already masked to word width.
    pub memory_write: Option<(u64, u64)>,
    /// Description with the values actually moved or computed.
    pub description: String,
}

/// Computes the effect of `step` against the current state without mutating it.
///
/// # Errors
///
/// Returns [`SimError::AddressOutOfRange`], [`SimError::DivisionByZero`] or
/// [`SimError::RegisterNotPresent`] when the step cannot be applied.
pub fn execute_step(
    step: &MicroStep,
    profile: &MachineProfile,
    registers: &RegisterFile,
    memory: &Memory,
) -> Result<StepEffect, SimError> {
    let ctx = Operands {
        profile,
        registers,
        phase: step.phase,
    };
    let mut effect = StepEffect::default();

    let action = match step.op {
        MicroOp::Observe { register } => {
            let value = ctx.read(register)?;
            format!(
                "{register} holds the address of the instruction ({})",
                ctx.show(register, value)
            )
        }
        MicroOp::CopyRegister { from, to } => {
            let value = ctx.masked(to, ctx.read(from)?)?;
            effect.register_writes.push((to, value));
            format!("Copy {from} ({}) to {to}", ctx.show(from, value))
        }
        MicroOp::ReadMemory { address, dest } => {
            read_memory(&ctx, memory, address, dest, &mut effect)?
        }
        MicroOp::WriteMemory { address, value } => {
            write_memory(&ctx, memory, address, value, &mut effect)?
        }
        MicroOp::IncrementRegister { register } => {
            let next = ctx.masked(register, ctx.read(register)?.wrapping_add(1))?;
            effect.register_writes.push((register, next));
            format!("Increment {register} to {}", ctx.show(register, next))
        }
        MicroOp::LoadInstructionHalf { half, from, to } => {
            let instruction = profile.format().instruction(ctx.read(from)?, half);
            let value = ctx.masked(to, instruction)?;
            effect.register_writes.push((to, value));
            format!(
                "Transfer {} instruction of {from} to {to} ({})",
                half.name(),
                ctx.show(to, value)
            )
        }
        MicroOp::DecodeOpcode { register } => {
            let instruction = ctx.read(register)?;
            format!("Decode instruction {}", profile.disassemble(instruction))
        }
        MicroOp::ExtractAddress { source, mask, dest } => {
            let value = ctx.masked(dest, ctx.read(source)? & mask)?;
            effect.register_writes.push((dest, value));
            format!(
                "Extract operand address ({}) from {source} into {dest}",
                ctx.show(dest, value)
            )
        }
        MicroOp::AluSignal { op } => format!("ALU performing {}", op.noun()),
        MicroOp::AluCombine {
            op,
            left,
            right,
            dest,
            secondary,
        } => alu_combine(
            &ctx,
            Combine {
                op,
                left,
                right,
                dest,
                secondary,
            },
            &mut effect,
        )?,
    };

    effect.description = format!("{} - {action}", step.phase.label());
    Ok(effect)
}

fn read_memory(
    ctx: &Operands<'_>,
    memory: &Memory,
    address: Register,
    dest: Register,
    effect: &mut StepEffect,
) -> Result<String, SimError> {
    let at = ctx.read(address)?;
    let word = memory.read(at)?;
    let value = ctx.masked(dest, word)?;
    effect.memory_read = Some((at, word));
    effect.register_writes.push((dest, value));
    let what = match ctx.phase {
        Phase::Fetch => "instruction word",
        Phase::Execute => "data",
    };
    Ok(format!(
        "Read {what} from memory ({}) into {dest}: {}",
        ctx.profile.format_address(at),
        ctx.show(dest, value)
    ))
}

fn write_memory(
    ctx: &Operands<'_>,
    memory: &Memory,
    address: Register,
    value: Register,
    effect: &mut StepEffect,
) -> Result<String, SimError> {
    let at = ctx.read(address)?;
    memory.check(at)?;
    let word = truncate_to_width(u128::from(ctx.read(value)?), memory.word_bits());
    effect.memory_write = Some((at, word));
    Ok(format!(
        "Write {value} ({}) to memory ({})",
        ctx.show(value, word),
        ctx.profile.format_address(at)
    ))
}

/// Operands of an [`MicroOp::AluCombine`] step.
#[derive(Clone, Copy)]
struct Combine {
    op: AluOp,
    left: Register,
    right: Register,
    dest: Register,
    secondary: Option<Register>,
}

fn alu_combine(
    ctx: &Operands<'_>,
    combine_op: Combine,
    effect: &mut StepEffect,
) -> Result<String, SimError> {
    let Combine {
        op,
        left,
        right,
        dest,
        secondary,
    } = combine_op;
    let secondary = secondary.filter(|_| op.splits_result());
    let lhs = ctx.read(left)?;
    let rhs = ctx.read(right)?;
    let out = combine(AluInputs {
        op,
        left: lhs,
        right: rhs,
        right_register: right,
        primary_width: ctx.width(dest)?,
        secondary_width: secondary.map(|r| ctx.width(r)).transpose()?,
        policy: ctx.profile.split_policy(),
    })?;
    effect.register_writes.push((dest, out.primary));
    let mut text = match op {
        AluOp::Add => format!("Add {right} ({rhs}) to {left} ({lhs}) = {}", out.primary),
        AluOp::Sub => {
            format!("Subtract {right} ({rhs}) from {left} ({lhs}) = {}", out.primary)
        }
        AluOp::Mul => format!("Multiply {left} ({lhs}) by {right} ({rhs}) = {}", out.full),
        AluOp::Div => format!("Divide {left} ({lhs}) by {right} ({rhs}) = {}", out.full),
    };
    if let (Some(low), Some(value)) = (secondary, out.secondary) {
        effect.register_writes.push((low, value));
        let _ = write!(text, "; {dest} <- {}, {low} <- {value}", out.primary);
    } else if dest != left {
        let _ = write!(text, " into {dest}");
    }
    Ok(text)
}

/// Applies a computed effect. Register writes go through width masking again.
///
/// # Errors
///
/// Propagates [`SimError::RegisterNotPresent`] and
/// [`SimError::AddressOutOfRange`]; neither occurs for an effect produced by
/// [`execute_step`] against the same state.
pub fn commit(
    effect: &StepEffect,
    profile: &MachineProfile,
    registers: &mut RegisterFile,
    memory: &mut Memory,
) -> Result<(), SimError> {
    if let Some((address, value)) = effect.memory_write {
        memory.write(address, value)?;
    }
    for &(register, value) in &effect.register_writes {
        registers.set(profile, register, value)?;
    }
    Ok(())
}

struct Operands<'a> {
    profile: &'a MachineProfile,
    registers: &'a RegisterFile,
    phase: Phase,
}

impl Operands<'_> {
    const fn missing(&self, register: Register) -> SimError {
        SimError::RegisterNotPresent {
            register,
            profile: self.profile.id(),
        }
    }

    fn read(&self, register: Register) -> Result<u64, SimError> {
        self.registers
            .get(register)
            .ok_or_else(|| self.missing(register))
    }

    fn width(&self, register: Register) -> Result<u32, SimError> {
        self.registers
            .width(register)
            .ok_or_else(|| self.missing(register))
    }

    fn masked(&self, register: Register, value: u64) -> Result<u64, SimError> {
        Ok(truncate_to_width(u128::from(value), self.width(register)?))
    }

    /// Addresses in the profile radix, instruction-bearing values in hex,
    /// data values in decimal.
    fn show(&self, register: Register, value: u64) -> String {
        let hex = matches!(register, Register::Ir | Register::Ibr) || self.phase == Phase::Fetch;
        if register.holds_address() {
            self.profile.format_address(value)
        } else if hex {
            let digits = self
                .registers
                .width(register)
                .unwrap_or_else(|| self.profile.word_bits())
                .div_ceil(4) as usize;
            format!("0x{value:0digits$X}")
        } else {
            value.to_string()
        }
    }
}
