//! Demonstration programs and their micro-step sequences.

/// Fixed per-profile program catalog.
pub mod catalog;
/// Structured micro-step descriptors.
pub mod step;

pub use catalog::{list_programs, load_program, ProgramEntry};
pub use step::{AluOp, MicroOp, MicroStep, Phase, StepKind};

use crate::{MachineProfile, Register, SimError};

/// Immutable program record: initial state plus the ordered micro-steps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Program {
    name: String,
    memory: Vec<(u64, u64)>,
    registers: Vec<(Register, u64)>,
    steps: Vec<MicroStep>,
}

impl Program {
    /// Starts an empty program.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            memory: Vec::new(),
            registers: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Adds an initial memory write.
    #[must_use]
    pub fn with_word(mut self, address: u64, value: u64) -> Self {
        self.memory.push((address, value));
        self
    }

    /// Adds an initial register override.
    #[must_use]
    pub fn with_register(mut self, register: Register, value: u64) -> Self {
        self.registers.push((register, value));
        self
    }

    /// Appends micro-steps.
    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = MicroStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial memory writes in declaration order.
    #[must_use]
    pub fn initial_memory(&self) -> &[(u64, u64)] {
        &self.memory
    }

    /// Initial register overrides in declaration order.
    #[must_use]
    pub fn initial_registers(&self) -> &[(Register, u64)] {
        &self.registers
    }

    /// Ordered micro-steps.
    #[must_use]
    pub fn steps(&self) -> &[MicroStep] {
        &self.steps
    }

    /// Checks the program against a profile before it is loaded.
    ///
    /// Every named register must exist in the profile, every initial memory
    /// write must be in range, and no step may read a register that neither an
    /// initial override nor an earlier step populated.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimError::RegisterNotPresent`],
    /// [`SimError::AddressOutOfRange`] or [`SimError::InconsistentProgram`]
    /// found.
    pub fn validate(&self, profile: &MachineProfile) -> Result<(), SimError> {
        let present = |register: Register| {
            profile
                .register_width(register)
                .map(|_| ())
                .ok_or_else(|| SimError::RegisterNotPresent {
                    register,
                    profile: profile.id(),
                })
        };

        for &(address, _) in &self.memory {
            let in_range = usize::try_from(address).is_ok_and(|a| a < profile.memory_words());
            if !in_range {
                return Err(SimError::AddressOutOfRange {
                    address,
                    size: profile.memory_words(),
                });
            }
        }

        let mut populated = Vec::with_capacity(profile.registers().len());
        for &(register, _) in &self.registers {
            present(register)?;
            populated.push(register);
        }

        for (index, step) in self.steps.iter().enumerate() {
            for register in step.op.reads() {
                present(register)?;
                if !populated.contains(&register) {
                    return Err(SimError::InconsistentProgram {
                        step: index,
                        register,
                    });
                }
            }
            for register in step.op.writes() {
                present(register)?;
                if !populated.contains(&register) {
                    populated.push(register);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AluOp, MicroOp, MicroStep, Program};
    use crate::{ProfileId, Register, SimError};

    #[test]
    fn builder_keeps_declaration_order() {
        let program = Program::new("demo")
            .with_word(0x200, 5)
            .with_word(0x201, 10)
            .with_register(Register::Pc, 0x100)
            .with_steps([MicroStep::fetch(MicroOp::Observe {
                register: Register::Pc,
            })]);

        assert_eq!(program.name(), "demo");
        assert_eq!(program.initial_memory(), &[(0x200, 5), (0x201, 10)]);
        assert_eq!(program.initial_registers(), &[(Register::Pc, 0x100)]);
        assert_eq!(program.steps().len(), 1);
    }

    #[test]
    fn reading_an_unpopulated_register_is_inconsistent() {
        let program = Program::new("bad").with_steps([MicroStep::execute(
            MicroOp::ExtractAddress {
                source: Register::Ir,
                mask: 0xFFF,
                dest: Register::Mar,
            },
        )]);

        assert_eq!(
            program.validate(ProfileId::Hypothetical.profile()),
            Err(SimError::InconsistentProgram {
                step: 0,
                register: Register::Ir,
            })
        );
    }

    #[test]
    fn foreign_registers_are_rejected() {
        let program = Program::new("bad")
            .with_register(Register::Ac, 20)
            .with_register(Register::Mbr, 4)
            .with_steps([MicroStep::execute(MicroOp::AluCombine {
                op: AluOp::Mul,
                left: Register::Ac,
                right: Register::Mbr,
                dest: Register::Ac,
                secondary: Some(Register::Mq),
            })]);

        assert_eq!(
            program.validate(ProfileId::Hypothetical.profile()),
            Err(SimError::RegisterNotPresent {
                register: Register::Mq,
                profile: ProfileId::Hypothetical,
            })
        );
        assert!(program.validate(ProfileId::Ias.profile()).is_ok());
    }

    #[test]
    fn initial_words_must_fit_memory() {
        let program = Program::new("bad").with_word(1000, 1);
        assert_eq!(
            program.validate(ProfileId::Ias.profile()),
            Err(SimError::AddressOutOfRange {
                address: 1000,
                size: 1000,
            })
        );
    }
}
