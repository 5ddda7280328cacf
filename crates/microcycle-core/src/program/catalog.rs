//! Versioned demonstration programs shipped with each profile.
//!
//! Every program is spelled out as fetch/execute micro-step blocks built from
//! the helpers below, so the instruction words in memory and the steps that
//! walk through them stay in agreement.

use crate::{AluOp, InstructionHalf, MicroOp, MicroStep, Program, ProfileId, Register, SimError};

/// Catalog row returned by [`list_programs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProgramEntry {
    /// Zero-based program id within the profile.
    pub id: usize,
    /// Display name.
    pub name: &'static str,
}

type Builder = fn(&'static str) -> Program;

static HYPOTHETICAL_PROGRAMS: [(&str, Builder); 3] = [
    ("Basic Sum (5 + 10)", hypothetical_sum),
    ("Basic Subtraction (20 - 8)", hypothetical_subtraction),
    ("Triple Sum (4 + 7 + 9)", hypothetical_triple_sum),
];

static IAS_PROGRAMS: [(&str, Builder); 2] = [
    ("Basic Sum (5 + 10)", ias_sum),
    ("Multiply and Divide (20 * 4, 20 / 4)", ias_multiply_divide),
];

const fn programs(profile: ProfileId) -> &'static [(&'static str, Builder)] {
    match profile {
        ProfileId::Hypothetical => &HYPOTHETICAL_PROGRAMS,
        ProfileId::Ias => &IAS_PROGRAMS,
    }
}

/// Lists the programs shipped with a profile, in menu order.
#[must_use]
pub fn list_programs(profile: ProfileId) -> Vec<ProgramEntry> {
    programs(profile)
        .iter()
        .enumerate()
        .map(|(id, &(name, _))| ProgramEntry { id, name })
        .collect()
}

/// Builds program `id` of a profile's catalog.
///
/// # Errors
///
/// Returns [`SimError::UnknownProgramId`] when `id` is out of range.
pub fn load_program(profile: ProfileId, id: usize) -> Result<Program, SimError> {
    programs(profile)
        .get(id)
        .map(|&(name, build)| build(name))
        .ok_or(SimError::UnknownProgramId { profile, id })
}

/// Packs `opcode | address` into the left (or only) instruction of a word,
/// using the profile's field widths.
const fn encode(profile: ProfileId, opcode: u64, address: u64) -> u64 {
    let format = profile.profile().format();
    let instruction = (opcode << format.address_bits) | (address & format.address_mask());
    if format.per_word > 1 {
        instruction << format.instruction_bits
    } else {
        instruction
    }
}

const fn hyp_word(opcode: u64, address: u64) -> u64 {
    encode(ProfileId::Hypothetical, opcode, address)
}

const fn ias_word(opcode: u64, address: u64) -> u64 {
    encode(ProfileId::Ias, opcode, address)
}

const fn hyp_fetch() -> [MicroStep; 4] {
    [
        MicroStep::fetch(MicroOp::CopyRegister {
            from: Register::Pc,
            to: Register::Mar,
        }),
        MicroStep::fetch(MicroOp::ReadMemory {
            address: Register::Mar,
            dest: Register::Mbr,
        }),
        MicroStep::fetch(MicroOp::IncrementRegister {
            register: Register::Pc,
        }),
        MicroStep::fetch(MicroOp::CopyRegister {
            from: Register::Mbr,
            to: Register::Ir,
        }),
    ]
}

const fn ias_fetch() -> [MicroStep; 5] {
    [
        MicroStep::fetch(MicroOp::CopyRegister {
            from: Register::Pc,
            to: Register::Mar,
        }),
        MicroStep::fetch(MicroOp::ReadMemory {
            address: Register::Mar,
            dest: Register::Mbr,
        }),
        MicroStep::fetch(MicroOp::IncrementRegister {
            register: Register::Pc,
        }),
        MicroStep::fetch(MicroOp::LoadInstructionHalf {
            half: InstructionHalf::Left,
            from: Register::Mbr,
            to: Register::Ir,
        }),
        MicroStep::fetch(MicroOp::LoadInstructionHalf {
            half: InstructionHalf::Right,
            from: Register::Mbr,
            to: Register::Ibr,
        }),
    ]
}

const fn decode_operand(mask: u64) -> [MicroStep; 2] {
    [
        MicroStep::execute(MicroOp::DecodeOpcode {
            register: Register::Ir,
        }),
        MicroStep::execute(MicroOp::ExtractAddress {
            source: Register::Ir,
            mask,
            dest: Register::Mar,
        }),
    ]
}

const fn read_operand() -> MicroStep {
    MicroStep::execute(MicroOp::ReadMemory {
        address: Register::Mar,
        dest: Register::Mbr,
    })
}

const fn load_accumulator() -> [MicroStep; 2] {
    [
        read_operand(),
        MicroStep::execute(MicroOp::CopyRegister {
            from: Register::Mbr,
            to: Register::Ac,
        }),
    ]
}

const fn accumulate(op: AluOp) -> [MicroStep; 3] {
    [
        read_operand(),
        MicroStep::execute(MicroOp::AluSignal { op }),
        MicroStep::execute(MicroOp::AluCombine {
            op,
            left: Register::Ac,
            right: Register::Mbr,
            dest: Register::Ac,
            secondary: None,
        }),
    ]
}

const fn multiply() -> [MicroStep; 3] {
    [
        read_operand(),
        MicroStep::execute(MicroOp::AluSignal { op: AluOp::Mul }),
        MicroStep::execute(MicroOp::AluCombine {
            op: AluOp::Mul,
            left: Register::Ac,
            right: Register::Mbr,
            dest: Register::Ac,
            secondary: Some(Register::Mq),
        }),
    ]
}

const fn divide() -> [MicroStep; 3] {
    [
        read_operand(),
        MicroStep::execute(MicroOp::AluSignal { op: AluOp::Div }),
        MicroStep::execute(MicroOp::AluCombine {
            op: AluOp::Div,
            left: Register::Ac,
            right: Register::Mbr,
            dest: Register::Mq,
            secondary: Some(Register::Ac),
        }),
    ]
}

const fn store_from(source: Register) -> [MicroStep; 2] {
    [
        MicroStep::execute(MicroOp::CopyRegister {
            from: source,
            to: Register::Mbr,
        }),
        MicroStep::execute(MicroOp::WriteMemory {
            address: Register::Mar,
            value: Register::Mbr,
        }),
    ]
}

const fn observe_pc() -> MicroStep {
    MicroStep::fetch(MicroOp::Observe {
        register: Register::Pc,
    })
}

/// Decode plus operand-address extraction with the profile's address field.
const fn decode_for(profile: ProfileId) -> [MicroStep; 2] {
    decode_operand(profile.profile().format().address_mask())
}

/// One hypothetical-machine instruction: fetch, decode, then `execute`.
fn hyp_instruction(execute: &[MicroStep]) -> Vec<MicroStep> {
    let mut steps = hyp_fetch().to_vec();
    steps.extend(decode_for(ProfileId::Hypothetical));
    steps.extend_from_slice(execute);
    steps
}

/// One IAS left-half instruction: fetch, decode, then `execute`.
fn ias_instruction(execute: &[MicroStep]) -> Vec<MicroStep> {
    let mut steps = ias_fetch().to_vec();
    steps.extend(decode_for(ProfileId::Ias));
    steps.extend_from_slice(execute);
    steps
}

// Hypothetical opcodes: LOAD=1 STOR=2 ADD=5 SUB=6.

fn hypothetical_sum(name: &'static str) -> Program {
    Program::new(name)
        .with_word(0x100, hyp_word(0x1, 0x200))
        .with_word(0x101, hyp_word(0x5, 0x201))
        .with_word(0x102, hyp_word(0x2, 0x202))
        .with_word(0x200, 5)
        .with_word(0x201, 10)
        .with_word(0x202, 0)
        .with_register(Register::Pc, 0x100)
        .with_steps([observe_pc()])
        .with_steps(hyp_instruction(&load_accumulator()))
        .with_steps(hyp_instruction(&accumulate(AluOp::Add)))
        .with_steps(hyp_instruction(&store_from(Register::Ac)))
}

fn hypothetical_subtraction(name: &'static str) -> Program {
    Program::new(name)
        .with_word(0x110, hyp_word(0x1, 0x210))
        .with_word(0x111, hyp_word(0x6, 0x211))
        .with_word(0x112, hyp_word(0x2, 0x212))
        .with_word(0x210, 20)
        .with_word(0x211, 8)
        .with_word(0x212, 0)
        .with_register(Register::Pc, 0x110)
        .with_steps([observe_pc()])
        .with_steps(hyp_instruction(&load_accumulator()))
        .with_steps(hyp_instruction(&accumulate(AluOp::Sub)))
        .with_steps(hyp_instruction(&store_from(Register::Ac)))
}

fn hypothetical_triple_sum(name: &'static str) -> Program {
    Program::new(name)
        .with_word(0x120, hyp_word(0x1, 0x220))
        .with_word(0x121, hyp_word(0x5, 0x221))
        .with_word(0x122, hyp_word(0x5, 0x222))
        .with_word(0x123, hyp_word(0x2, 0x223))
        .with_word(0x220, 4)
        .with_word(0x221, 7)
        .with_word(0x222, 9)
        .with_word(0x223, 0)
        .with_register(Register::Pc, 0x120)
        .with_steps(hyp_instruction(&load_accumulator()))
        .with_steps(hyp_instruction(&accumulate(AluOp::Add)))
        .with_steps(hyp_instruction(&accumulate(AluOp::Add)))
        .with_steps(hyp_instruction(&store_from(Register::Ac)))
}

// IAS opcodes: LOAD M(X)=0x01 STOR M(X)=0x05 ADD M(X)=0x0A MUL=0x0E DIV=0x0F.

fn ias_sum(name: &'static str) -> Program {
    Program::new(name)
        .with_word(0, ias_word(0x01, 10))
        .with_word(1, ias_word(0x0A, 11))
        .with_word(2, ias_word(0x05, 12))
        .with_word(10, 5)
        .with_word(11, 10)
        .with_word(12, 0)
        .with_register(Register::Pc, 0)
        .with_steps([observe_pc()])
        .with_steps(ias_instruction(&load_accumulator()))
        .with_steps(ias_instruction(&accumulate(AluOp::Add)))
        .with_steps(ias_instruction(&store_from(Register::Ac)))
}

fn ias_multiply_divide(name: &'static str) -> Program {
    Program::new(name)
        .with_word(0, ias_word(0x01, 10))
        .with_word(1, ias_word(0x0E, 11))
        .with_word(2, ias_word(0x05, 12))
        .with_word(3, ias_word(0x01, 10))
        .with_word(4, ias_word(0x0F, 11))
        .with_word(5, ias_word(0x05, 13))
        .with_word(10, 20)
        .with_word(11, 4)
        .with_word(12, 0)
        .with_word(13, 0)
        .with_register(Register::Pc, 0)
        .with_steps([observe_pc()])
        .with_steps(ias_instruction(&load_accumulator()))
        .with_steps(ias_instruction(&multiply()))
        .with_steps(ias_instruction(&store_from(Register::Ac)))
        .with_steps(ias_instruction(&load_accumulator()))
        .with_steps(ias_instruction(&divide()))
        .with_steps(ias_instruction(&store_from(Register::Mq)))
}

#[cfg(test)]
mod tests {
    use super::{encode, list_programs, load_program};
    use crate::{MicroOp, ProfileId, SimError, StepKind};

    #[test]
    fn catalog_sizes_match_profiles() {
        assert_eq!(list_programs(ProfileId::Hypothetical).len(), 3);
        assert_eq!(list_programs(ProfileId::Ias).len(), 2);
    }

    #[test]
    fn entries_are_numbered_in_menu_order() {
        let entries = list_programs(ProfileId::Hypothetical);
        let ids: Vec<usize> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(entries[2].name, "Triple Sum (4 + 7 + 9)");
    }

    #[test]
    fn out_of_range_id_is_unknown() {
        assert_eq!(
            load_program(ProfileId::Ias, 2),
            Err(SimError::UnknownProgramId {
                profile: ProfileId::Ias,
                id: 2,
            })
        );
    }

    #[test]
    fn every_program_is_consistent_with_its_profile() {
        for profile in ProfileId::ALL {
            for entry in list_programs(profile) {
                let program = load_program(profile, entry.id).expect("catalog id");
                assert_eq!(program.name(), entry.name);
                assert!(
                    program.validate(profile.profile()).is_ok(),
                    "{profile} / {}",
                    entry.name
                );
            }
        }
    }

    #[test]
    fn reference_step_counts_are_preserved() {
        let count = |profile, id| {
            load_program(profile, id)
                .expect("catalog id")
                .steps()
                .len()
        };
        assert_eq!(count(ProfileId::Hypothetical, 0), 26);
        assert_eq!(count(ProfileId::Hypothetical, 1), 26);
        assert_eq!(count(ProfileId::Hypothetical, 2), 34);
        assert_eq!(count(ProfileId::Ias, 0), 29);
        assert_eq!(count(ProfileId::Ias, 1), 57);
    }

    #[test]
    fn address_extraction_uses_the_profile_address_field() {
        for profile in ProfileId::ALL {
            let expected = profile.profile().format().address_mask();
            for entry in list_programs(profile) {
                let program = load_program(profile, entry.id).expect("catalog id");
                for step in program.steps() {
                    if let MicroOp::ExtractAddress { mask, .. } = step.op {
                        assert_eq!(mask, expected, "{profile} / {}", entry.name);
                    }
                }
            }
        }
    }

    #[test]
    fn instruction_words_follow_the_profile_layout() {
        assert_eq!(encode(ProfileId::Hypothetical, 0x5, 0x201), 0x5201);
        assert_eq!(encode(ProfileId::Ias, 0x0E, 11), 0x0E00B << 20);
        assert_eq!(
            ProfileId::Ias.profile().disassemble_word(encode(ProfileId::Ias, 0x0F, 11)),
            "DIV M(11)"
        );
    }

    #[test]
    fn triple_sum_has_four_alu_steps() {
        let program = load_program(ProfileId::Hypothetical, 2).expect("catalog id");
        let alu_steps = program
            .steps()
            .iter()
            .filter(|step| matches!(step.kind(), StepKind::Alu(_)))
            .count();
        assert_eq!(alu_steps, 4);
    }
}
