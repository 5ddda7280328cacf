//! Register file and engine run-state primitives.

/// Width-masked register storage.
pub mod registers;
/// Step engine lifecycle states.
pub mod run_state;

pub use registers::{truncate_to_width, width_mask, Register, RegisterFile, REGISTER_KIND_COUNT};
pub use run_state::EngineState;
