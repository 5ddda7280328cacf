//! Micro-step instruction-cycle simulator core.
//!
//! Steps a hypothetical accumulator machine and a simplified IAS machine
//! through the fetch and execute cycles one register transfer at a time.
//! Hosts open a [`Session`], call [`Session::advance`] at their own pace and
//! render [`Session::snapshot`] however they like.

/// Machine profiles and the shared profile registry.
pub mod profile;
pub use profile::{
    list_profiles, AddressRadix, InstructionFormat, InstructionHalf, MachineProfile, OpcodeEntry,
    OperandForm, ProfileId, RegisterSpec, SplitPolicy, UNKNOWN_MNEMONIC,
};

/// Register file and engine lifecycle state.
pub mod state;
pub use state::{
    truncate_to_width, width_mask, EngineState, Register, RegisterFile, REGISTER_KIND_COUNT,
};

/// Bounded word memory and display windows.
pub mod memory;
pub use memory::{CellKind, Memory, MemoryWindow};

/// Programs, micro-steps and the program catalog.
pub mod program;
pub use program::{
    list_programs, load_program, AluOp, MicroOp, MicroStep, Phase, Program, ProgramEntry,
    StepKind,
};

/// Control-unit status tracking.
pub mod control;
pub use control::{track, ControlUnitState, Unit, UnitStatus};

/// Micro-step execution and the step engine.
pub mod execute;
pub use execute::{AppliedStep, Machine, StepEffect, StepEngine};

/// State snapshots for hosts.
pub mod render;
pub use render::{snapshot, MemoryRow, RegisterRow, StateView, UnitRow};

/// Error taxonomy.
pub mod fault;
pub use fault::{ErrorClass, SimError};

/// Host-facing session API.
pub mod api;
pub use api::{
    new_session, RunBoundary, RunOutcome, Session, SessionConfig, StepResult, TraceEvent,
    TraceSink,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
