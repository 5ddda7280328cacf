use tracing::{debug, info, warn};

use super::{commit, execute_step, StepEffect};
use crate::control::{track, ControlUnitState};
use crate::memory::Memory;
use crate::state::{EngineState, RegisterFile};
use crate::{MachineProfile, MicroStep, Program, SimError};

/// Result of one successfully applied micro-step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    /// Zero-based index of the step that was applied.
    pub index: usize,
    /// The step itself.
    pub step: MicroStep,
    /// Effects that were committed.
    pub effect: StepEffect,
    /// Unit status while the step ran.
    pub control: ControlUnitState,
    /// Engine state after the step.
    pub state: EngineState,
}

/// One loaded simulation: profile, program, register file, memory, unit
/// status and step cursor.
///
/// Invariant: `0 <= cursor <= steps.len()`, and the cursor only moves by one
/// per successful [`Machine::advance`] or back to zero on [`Machine::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    profile: MachineProfile,
    program: Program,
    registers: RegisterFile,
    memory: Memory,
    control: ControlUnitState,
    cursor: usize,
    state: EngineState,
    latched_fault: Option<SimError>,
}

impl Machine {
    /// Validates `program` against `profile` and loads it.
    ///
    /// # Errors
    ///
    /// Returns the first validation error of [`Program::validate`].
    pub fn load(profile: &MachineProfile, program: Program) -> Result<Self, SimError> {
        program.validate(profile)?;
        let mut machine = Self {
            profile: *profile,
            registers: RegisterFile::for_profile(profile),
            memory: Memory::new(profile.memory_words(), profile.word_bits()),
            program,
            control: ControlUnitState::IDLE,
            cursor: 0,
            state: EngineState::Loaded,
            latched_fault: None,
        };
        machine.restore_initial_state()?;
        info!(
            profile = %machine.profile.id(),
            program = machine.program.name(),
            steps = machine.total(),
            "program loaded"
        );
        Ok(machine)
    }

    fn restore_initial_state(&mut self) -> Result<(), SimError> {
        self.registers = RegisterFile::for_profile(&self.profile);
        for &(register, value) in self.program.initial_registers() {
            self.registers.set(&self.profile, register, value)?;
        }
        self.memory.clear();
        for &(address, value) in self.program.initial_memory() {
            self.memory.write(address, value)?;
        }
        self.control = ControlUnitState::IDLE;
        self.cursor = 0;
        self.latched_fault = None;
        self.state = if self.program.steps().is_empty() {
            EngineState::Completed
        } else {
            EngineState::Loaded
        };
        Ok(())
    }

    /// Applies the step under the cursor.
    ///
    /// A failing step commits nothing and leaves the cursor in place; the
    /// machine becomes [`EngineState::Aborted`] with the fault latched.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SessionFinished`] when the machine is completed or
    /// aborted, otherwise the fault raised by the step.
    pub fn advance(&mut self) -> Result<AppliedStep, SimError> {
        let finished = SimError::SessionFinished { state: self.state };
        if !self.state.can_advance() {
            return Err(finished);
        }
        let step = *self.program.steps().get(self.cursor).ok_or(finished)?;

        let effect = match execute_step(&step, &self.profile, &self.registers, &self.memory) {
            Ok(effect) => effect,
            Err(fault) => {
                warn!(cursor = self.cursor, %fault, "micro-step faulted; session aborted");
                self.state = EngineState::Aborted;
                self.latched_fault = Some(fault.clone());
                return Err(fault);
            }
        };
        commit(&effect, &self.profile, &mut self.registers, &mut self.memory)?;

        let index = self.cursor;
        self.control = track(self.control, step.kind());
        self.cursor += 1;
        self.state = EngineState::after_step(self.cursor, self.total());

        debug!(
            profile = self.profile.id().key(),
            cursor = index,
            kind = ?step.kind(),
            "{}",
            effect.description
        );
        if self.state == EngineState::Completed {
            info!(steps = self.total(), "simulation completed");
        }

        Ok(AppliedStep {
            index,
            step,
            effect,
            control: self.control,
            state: self.state,
        })
    }

    /// Stops the machine; no further steps may be applied until reset.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SessionFinished`] when already completed or aborted.
    pub fn abort(&mut self) -> Result<(), SimError> {
        if !self.state.can_advance() {
            return Err(SimError::SessionFinished { state: self.state });
        }
        self.state = EngineState::Aborted;
        info!(cursor = self.cursor, "simulation aborted");
        Ok(())
    }

    /// Restores the load-time state of the same program.
    ///
    /// # Errors
    ///
    /// Cannot fail for a machine built by [`Machine::load`]; initial words
    /// and registers were validated then.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.restore_initial_state()?;
        info!(program = self.program.name(), "simulation reset");
        Ok(())
    }

    /// Profile the program runs on.
    #[must_use]
    pub const fn profile(&self) -> &MachineProfile {
        &self.profile
    }

    /// Loaded program.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Current register values.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Current memory contents.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Unit status computed for the last applied step.
    #[must_use]
    pub const fn control(&self) -> ControlUnitState {
        self.control
    }

    /// Index of the next step to apply.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of steps in the program.
    #[must_use]
    pub fn total(&self) -> usize {
        self.program.steps().len()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Fault that aborted the machine, if any.
    #[must_use]
    pub const fn latched_fault(&self) -> Option<&SimError> {
        self.latched_fault.as_ref()
    }
}

/// Step engine slot that may or may not hold a loaded program.
///
/// Every operation other than [`StepEngine::load`] fails with
/// [`SimError::EngineNotLoaded`] until a program is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepEngine {
    machine: Option<Machine>,
}

impl StepEngine {
    /// Empty engine.
    #[must_use]
    pub const fn new() -> Self {
        Self { machine: None }
    }

    /// Loads `program`, replacing whatever was loaded before.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Program::validate`]; the previous
    /// machine is kept in that case.
    pub fn load(&mut self, profile: &MachineProfile, program: Program) -> Result<(), SimError> {
        self.machine = Some(Machine::load(profile, program)?);
        Ok(())
    }

    /// See [`Machine::advance`].
    ///
    /// # Errors
    ///
    /// [`SimError::EngineNotLoaded`] before the first load, otherwise as
    /// [`Machine::advance`].
    pub fn advance(&mut self) -> Result<AppliedStep, SimError> {
        self.machine_mut()?.advance()
    }

    /// See [`Machine::abort`].
    ///
    /// # Errors
    ///
    /// [`SimError::EngineNotLoaded`] before the first load, otherwise as
    /// [`Machine::abort`].
    pub fn abort(&mut self) -> Result<(), SimError> {
        self.machine_mut()?.abort()
    }

    /// See [`Machine::reset`].
    ///
    /// # Errors
    ///
    /// [`SimError::EngineNotLoaded`] before the first load.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.machine_mut()?.reset()
    }

    /// Loaded machine.
    ///
    /// # Errors
    ///
    /// [`SimError::EngineNotLoaded`] before the first load.
    pub fn machine(&self) -> Result<&Machine, SimError> {
        self.machine.as_ref().ok_or(SimError::EngineNotLoaded)
    }

    fn machine_mut(&mut self) -> Result<&mut Machine, SimError> {
        self.machine.as_mut().ok_or(SimError::EngineNotLoaded)
    }
}
