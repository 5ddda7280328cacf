//! Host-facing session API.

use std::fmt;

use crate::control::ControlUnitState;
use crate::execute::{AppliedStep, Machine};
use crate::program::{load_program, Program};
use crate::render::{snapshot, StateView};
use crate::{EngineState, MachineProfile, MicroStep, ProfileId, SimError};

/// Per-session options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SessionConfig {
    /// Dispatch [`TraceEvent`]s to the attached [`TraceSink`].
    pub tracing_enabled: bool,
    /// Include zero-valued memory cells in snapshots.
    pub show_zero_cells: bool,
}

/// Outcome of one `advance` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StepResult {
    /// Zero-based index of the applied step.
    pub index: usize,
    /// Description including the values moved or computed.
    pub description: String,
    /// `true` when this step was the last one.
    pub is_complete: bool,
    /// Unit status while the step ran.
    pub control: ControlUnitState,
}

/// Why a batch run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunBoundary {
    /// Every step was applied.
    Completed,
    /// A step faulted and the session aborted.
    Faulted(SimError),
}

/// Result of [`Session::run_to_completion`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Steps applied during this run.
    pub steps_applied: usize,
    /// Reason the run stopped.
    pub boundary: RunBoundary,
}

/// Events emitted in execution order while tracing is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// A step committed.
    StepApplied {
        /// Step index.
        index: usize,
        /// The step.
        step: MicroStep,
    },
    /// Memory touched by a committed step.
    MemoryAccess {
        /// Word address.
        address: u64,
        /// Value read or written.
        value: u64,
        /// `true` for writes.
        is_write: bool,
    },
    /// A step faulted.
    FaultRaised {
        /// Index of the faulting step.
        index: usize,
        /// The fault.
        fault: SimError,
    },
}

/// Receiver for [`TraceEvent`]s.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Opens a session on catalog program `program_id` of `profile_id`.
///
/// # Errors
///
/// [`SimError::UnknownProgramId`] when the catalog has no such program.
pub fn new_session(profile_id: ProfileId, program_id: usize) -> Result<Session, SimError> {
    Session::new(profile_id, program_id)
}

/// One simulation owned by a host.
pub struct Session {
    machine: Machine,
    config: SessionConfig,
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("machine", &self.machine)
            .field("config", &self.config)
            .field("sink", &self.sink.as_ref().map(|_| "TraceSink"))
            .finish()
    }
}

impl Session {
    /// Opens a session on a catalog program with default options.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownProgramId`] when the catalog has no such program.
    pub fn new(profile_id: ProfileId, program_id: usize) -> Result<Self, SimError> {
        let program = load_program(profile_id, program_id)?;
        Self::from_program(profile_id.profile(), program, SessionConfig::default())
    }

    /// Opens a session on an arbitrary program.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Program::validate`].
    pub fn from_program(
        profile: &MachineProfile,
        program: Program,
        config: SessionConfig,
    ) -> Result<Self, SimError> {
        Ok(Self {
            machine: Machine::load(profile, program)?,
            config,
            sink: None,
        })
    }

    /// Replaces the session options.
    #[must_use]
    pub const fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a trace sink. Events flow only while tracing is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    /// Applies the next micro-step.
    ///
    /// # Errors
    ///
    /// [`SimError::SessionFinished`] once completed or aborted, otherwise the
    /// fault raised by the step (the session is then aborted).
    pub fn advance(&mut self) -> Result<StepResult, SimError> {
        let index = self.machine.cursor();
        match self.machine.advance() {
            Ok(applied) => {
                self.trace_applied(&applied);
                Ok(StepResult {
                    index: applied.index,
                    description: applied.effect.description,
                    is_complete: applied.state == EngineState::Completed,
                    control: applied.control,
                })
            }
            Err(fault) => {
                if self.machine.latched_fault() == Some(&fault) {
                    self.emit(TraceEvent::FaultRaised {
                        index,
                        fault: fault.clone(),
                    });
                }
                Err(fault)
            }
        }
    }

    fn trace_applied(&mut self, applied: &AppliedStep) {
        self.emit(TraceEvent::StepApplied {
            index: applied.index,
            step: applied.step,
        });
        if let Some((address, value)) = applied.effect.memory_read {
            self.emit(TraceEvent::MemoryAccess {
                address,
                value,
                is_write: false,
            });
        }
        if let Some((address, value)) = applied.effect.memory_write {
            self.emit(TraceEvent::MemoryAccess {
                address,
                value,
                is_write: true,
            });
        }
    }

    fn emit(&mut self, event: TraceEvent) {
        if !self.config.tracing_enabled {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.on_event(event);
        }
    }

    /// Advances until the program completes or a step faults.
    ///
    /// # Errors
    ///
    /// [`SimError::SessionFinished`] when called on a finished session.
    pub fn run_to_completion(&mut self) -> Result<RunOutcome, SimError> {
        if self.machine.state().is_terminal() {
            return Err(SimError::SessionFinished {
                state: self.machine.state(),
            });
        }
        let mut steps_applied = 0;
        loop {
            match self.advance() {
                Ok(result) => {
                    steps_applied += 1;
                    if result.is_complete {
                        return Ok(RunOutcome {
                            steps_applied,
                            boundary: RunBoundary::Completed,
                        });
                    }
                }
                Err(fault) if fault.is_fatal() && self.machine.latched_fault().is_some() => {
                    return Ok(RunOutcome {
                        steps_applied,
                        boundary: RunBoundary::Faulted(fault),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Restores the load-time state.
    ///
    /// # Errors
    ///
    /// Cannot fail for a session built through this API.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.machine.reset()
    }

    /// Stops the session.
    ///
    /// # Errors
    ///
    /// [`SimError::SessionFinished`] when already completed or aborted.
    pub fn abort(&mut self) -> Result<(), SimError> {
        self.machine.abort()
    }

    /// Structured view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StateView {
        snapshot(&self.machine, self.config.show_zero_cells)
    }

    /// `(cursor, total steps)`.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.machine.cursor(), self.machine.total())
    }

    /// One-line banner describing where the session is.
    #[must_use]
    pub fn status_line(&self) -> String {
        let (cursor, total) = self.progress();
        match self.machine.state() {
            EngineState::Completed => "Simulation completed".to_owned(),
            EngineState::Aborted => "Simulation aborted".to_owned(),
            EngineState::Loaded => "Waiting to start".to_owned(),
            EngineState::Running => cursor
                .checked_sub(1)
                .and_then(|last| self.steps().get(last))
                .map_or_else(String::new, |step| {
                    format!("Step {cursor}/{total}: {}", step.label())
                }),
        }
    }

    /// Every micro-step of the loaded program.
    #[must_use]
    pub fn steps(&self) -> &[MicroStep] {
        self.machine.program().steps()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.machine.state()
    }

    /// Fault that aborted the session, if any.
    #[must_use]
    pub const fn latched_fault(&self) -> Option<&SimError> {
        self.machine.latched_fault()
    }

    /// Profile the session runs on.
    #[must_use]
    pub const fn profile(&self) -> &MachineProfile {
        self.machine.profile()
    }
}
