use thiserror::Error;

use crate::{EngineState, ProfileId, Register};

/// Error classes used by hosts to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Invalid user selection; the host can re-prompt.
    Selection,
    /// Host called the engine out of order.
    Integration,
    /// Program data is malformed for the selected profile.
    ProgramData,
}

/// Stable error taxonomy surfaced across the core-to-host boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SimError {
    /// Program index is outside the profile's catalog.
    #[error("unknown program id {id} for {profile}")]
    UnknownProgramId {
        /// Profile whose catalog was queried.
        profile: ProfileId,
        /// Rejected program index.
        id: usize,
    },
    /// `advance`, `abort` or `reset` called before any program was loaded.
    #[error("no program is loaded into the step engine")]
    EngineNotLoaded,
    /// Session already reached a terminal state and cannot advance.
    #[error("session is {state} and cannot advance")]
    SessionFinished {
        /// Terminal state the session is in.
        state: EngineState,
    },
    /// A memory access targeted an address past the end of memory.
    #[error("address {address} is outside memory of {size} words")]
    AddressOutOfRange {
        /// Requested word address.
        address: u64,
        /// Memory size in words.
        size: usize,
    },
    /// ALU division with a zero divisor.
    #[error("division by zero: {register} holds 0")]
    DivisionByZero {
        /// Register that supplied the divisor.
        register: Register,
    },
    /// Program data names a register the profile does not define.
    #[error("register {register} is not part of the {profile} register set")]
    RegisterNotPresent {
        /// Offending register.
        register: Register,
        /// Profile that lacks it.
        profile: ProfileId,
    },
    /// A micro-step reads a register no earlier step or initial value populated.
    #[error("step {step} reads {register} before any step populates it")]
    InconsistentProgram {
        /// Zero-based index of the offending step.
        step: usize,
        /// Register read before it was written.
        register: Register,
    },
}

impl SimError {
    /// Returns the host-facing class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownProgramId { .. } => ErrorClass::Selection,
            Self::EngineNotLoaded | Self::SessionFinished { .. } => ErrorClass::Integration,
            Self::AddressOutOfRange { .. }
            | Self::DivisionByZero { .. }
            | Self::RegisterNotPresent { .. }
            | Self::InconsistentProgram { .. } => ErrorClass::ProgramData,
        }
    }

    /// Errors that end the session instead of allowing a retry.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self.class(), ErrorClass::Selection)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorClass, SimError};
    use crate::{EngineState, ProfileId, Register};

    #[test]
    fn selection_errors_are_recoverable() {
        let err = SimError::UnknownProgramId {
            profile: ProfileId::Hypothetical,
            id: 9,
        };
        assert_eq!(err.class(), ErrorClass::Selection);
        assert!(!err.is_fatal());
    }

    #[test]
    fn class_mapping_matches_taxonomy() {
        assert_eq!(SimError::EngineNotLoaded.class(), ErrorClass::Integration);
        assert_eq!(
            SimError::SessionFinished {
                state: EngineState::Completed
            }
            .class(),
            ErrorClass::Integration
        );
        assert_eq!(
            SimError::AddressOutOfRange {
                address: 1000,
                size: 1000
            }
            .class(),
            ErrorClass::ProgramData
        );
        assert_eq!(
            SimError::DivisionByZero {
                register: Register::Mbr
            }
            .class(),
            ErrorClass::ProgramData
        );
        assert!(SimError::EngineNotLoaded.is_fatal());
    }

    #[test]
    fn messages_name_the_offending_operand() {
        let err = SimError::DivisionByZero {
            register: Register::Mbr,
        };
        assert_eq!(err.to_string(), "division by zero: MBR holds 0");

        let err = SimError::RegisterNotPresent {
            register: Register::Mq,
            profile: ProfileId::Hypothetical,
        };
        assert_eq!(
            err.to_string(),
            "register MQ is not part of the hypothetical machine register set"
        );
    }
}
