//! Derived ALU / control-unit status labels.

use std::fmt;

use crate::{AluOp, StepKind};

/// Functional units whose status is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Unit {
    /// Arithmetic-logic unit.
    Alu,
    /// Control unit.
    Control,
}

impl Unit {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alu => "ALU",
            Self::Control => "Control",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display-only status label of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UnitStatus {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Control unit decoding an instruction.
    Decoding,
    /// ALU adding.
    Adding,
    /// ALU subtracting.
    Subtracting,
    /// ALU multiplying.
    Multiplying,
    /// ALU dividing.
    Dividing,
}

impl UnitStatus {
    /// Status the ALU shows while performing `op`.
    #[must_use]
    pub const fn for_op(op: AluOp) -> Self {
        match op {
            AluOp::Add => Self::Adding,
            AluOp::Sub => Self::Subtracting,
            AluOp::Mul => Self::Multiplying,
            AluOp::Div => Self::Dividing,
        }
    }

    /// Upper-case display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Decoding => "DECODING",
            Self::Adding => "ADDING",
            Self::Subtracting => "SUBTRACTING",
            Self::Multiplying => "MULTIPLYING",
            Self::Dividing => "DIVIDING",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of every displayed unit after a micro-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControlUnitState {
    /// ALU status.
    pub alu: UnitStatus,
    /// Control-unit status.
    pub control: UnitStatus,
}

impl ControlUnitState {
    /// Both units idle.
    pub const IDLE: Self = Self {
        alu: UnitStatus::Idle,
        control: UnitStatus::Idle,
    };

    /// Status of one unit.
    #[must_use]
    pub const fn status(&self, unit: Unit) -> UnitStatus {
        match unit {
            Unit::Alu => self.alu,
            Unit::Control => self.control,
        }
    }

    /// `(unit, status)` pairs in display order.
    #[must_use]
    pub const fn rows(&self) -> [(Unit, UnitStatus); 2] {
        [(Unit::Alu, self.alu), (Unit::Control, self.control)]
    }
}

/// Computes unit status for the step of kind `current`.
///
/// An ALU step shows its operation on the ALU and a decode step shows
/// `Decoding` on the control unit. In `(current, next)` terms: the status set
/// by the current step survives into the next step only when the next step is
/// itself an ALU or decode step; otherwise every unit drops back to idle.
/// Callers therefore pass the state computed for the previous step (or
/// [`ControlUnitState::IDLE`] for the first step) together with the kind of
/// the step being applied, and never need to look ahead.
#[must_use]
pub const fn track(previous: ControlUnitState, current: StepKind) -> ControlUnitState {
    match current {
        StepKind::Alu(op) => ControlUnitState {
            alu: UnitStatus::for_op(op),
            control: previous.control,
        },
        StepKind::Decode => ControlUnitState {
            alu: previous.alu,
            control: UnitStatus::Decoding,
        },
        StepKind::Transfer => ControlUnitState::IDLE,
    }
}

#[cfg(test)]
mod tests {
    use super::{track, ControlUnitState, Unit, UnitStatus};
    use crate::{AluOp, StepKind};

    fn replay(kinds: &[StepKind]) -> Vec<ControlUnitState> {
        let mut state = ControlUnitState::IDLE;
        kinds
            .iter()
            .map(|kind| {
                state = track(state, *kind);
                state
            })
            .collect()
    }

    #[test]
    fn alu_status_lasts_for_adjacent_alu_steps() {
        let states = replay(&[
            StepKind::Transfer,
            StepKind::Alu(AluOp::Add),
            StepKind::Alu(AluOp::Add),
            StepKind::Transfer,
        ]);

        assert_eq!(states[0].alu, UnitStatus::Idle);
        assert_eq!(states[1].alu, UnitStatus::Adding);
        assert_eq!(states[2].alu, UnitStatus::Adding);
        assert_eq!(states[3], ControlUnitState::IDLE);
    }

    #[test]
    fn decoding_holds_into_a_following_alu_step() {
        let states = replay(&[StepKind::Decode, StepKind::Alu(AluOp::Mul)]);

        assert_eq!(states[0].control, UnitStatus::Decoding);
        assert_eq!(states[1].control, UnitStatus::Decoding);
        assert_eq!(states[1].alu, UnitStatus::Multiplying);
    }

    #[test]
    fn decoding_clears_on_a_transfer_step() {
        let states = replay(&[StepKind::Decode, StepKind::Transfer]);
        assert_eq!(states[0].status(Unit::Control), UnitStatus::Decoding);
        assert_eq!(states[1].status(Unit::Control), UnitStatus::Idle);
    }

    #[test]
    fn every_op_has_a_distinct_status() {
        let statuses = [AluOp::Add, AluOp::Sub, AluOp::Mul, AluOp::Div]
            .map(UnitStatus::for_op)
            .map(UnitStatus::label);
        assert_eq!(statuses, ["ADDING", "SUBTRACTING", "MULTIPLYING", "DIVIDING"]);
    }

    #[test]
    fn rows_follow_display_order() {
        let rows = ControlUnitState::IDLE.rows();
        assert_eq!(rows[0].0, Unit::Alu);
        assert_eq!(rows[1].0, Unit::Control);
    }
}
