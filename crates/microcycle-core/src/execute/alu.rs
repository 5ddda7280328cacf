//! Width-masked ALU arithmetic for combine steps.

use crate::state::truncate_to_width;
use crate::{AluOp, Register, SimError, SplitPolicy};

/// Operand values and destination widths of one ALU combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluInputs {
    /// Operation to perform.
    pub op: AluOp,
    /// Left operand value.
    pub left: u64,
    /// Right operand value.
    pub right: u64,
    /// Register that supplied the right operand, reported on division by zero.
    pub right_register: Register,
    /// Width of the primary destination.
    pub primary_width: u32,
    /// Width of the secondary destination, when the step names one.
    pub secondary_width: Option<u32>,
    /// Result placement for multiply and divide.
    pub policy: SplitPolicy,
}

/// Values an ALU combine will store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    /// Unmasked mathematical result (sum, difference, product or quotient).
    pub full: u128,
    /// Value for the primary destination, already masked.
    pub primary: u64,
    /// Value for the secondary destination, already masked.
    pub secondary: Option<u64>,
}

/// Computes an ALU combine without touching any state.
///
/// Subtraction wraps modulo the primary width. Multiplication is performed
/// at full precision before masking. Add and subtract never write the
/// secondary destination.
///
/// # Errors
///
/// Returns [`SimError::DivisionByZero`] when dividing by zero.
pub fn combine(inputs: AluInputs) -> Result<AluOutput, SimError> {
    let left = u128::from(inputs.left);
    let right = u128::from(inputs.right);
    let pw = inputs.primary_width;

    match inputs.op {
        AluOp::Add => {
            let full = left + right;
            Ok(single(full, truncate_to_width(full, pw)))
        }
        AluOp::Sub => {
            let full = left.wrapping_sub(right);
            Ok(single(full, truncate_to_width(full, pw)))
        }
        AluOp::Mul => {
            let full = left * right;
            let (primary, secondary) = match (inputs.secondary_width, inputs.policy) {
                (None, _) => (truncate_to_width(full, pw), None),
                (Some(_), SplitPolicy::Simplified) => (truncate_to_width(full, pw), Some(0)),
                (Some(sw), SplitPolicy::Faithful) => (
                    truncate_to_width(full >> sw, pw),
                    Some(truncate_to_width(full, sw)),
                ),
            };
            Ok(AluOutput {
                full,
                primary,
                secondary,
            })
        }
        AluOp::Div => {
            if right == 0 {
                return Err(SimError::DivisionByZero {
                    register: inputs.right_register,
                });
            }
            let quotient = left / right;
            let remainder = left % right;
            let secondary = match (inputs.secondary_width, inputs.policy) {
                (None, _) => None,
                (Some(_), SplitPolicy::Simplified) => Some(0),
                (Some(sw), SplitPolicy::Faithful) => Some(truncate_to_width(remainder, sw)),
            };
            Ok(AluOutput {
                full: quotient,
                primary: truncate_to_width(quotient, pw),
                secondary,
            })
        }
    }
}

const fn single(full: u128, primary: u64) -> AluOutput {
    AluOutput {
        full,
        primary,
        secondary: None,
    }
}
