//! Prints one FNV-1a fingerprint per catalog program so runs on different
//! hosts can be compared line by line.

use microcycle_core::{
    list_profiles, list_programs, new_session, EngineState, SimError, StateView,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;
use tracing as _;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn hash_view(hash: &mut u64, view: &StateView) {
    for row in &view.registers {
        hash_bytes(hash, &row.value.to_le_bytes());
    }
    for row in &view.memory {
        hash_bytes(hash, &row.address.to_le_bytes());
        hash_bytes(hash, &row.value.to_le_bytes());
    }
    for row in &view.units {
        hash_bytes(hash, row.status.label().as_bytes());
    }
}

fn fingerprint(profile: microcycle_core::ProfileId, program: usize) -> Result<String, SimError> {
    let mut session = new_session(profile, program)?;
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    hash_view(&mut hash, &session.snapshot());

    while session.state() != EngineState::Completed {
        let step = session.advance()?;
        hash_bytes(&mut hash, step.description.as_bytes());
        hash_view(&mut hash, &session.snapshot());
    }

    Ok(format!("{hash:016x}"))
}

fn main() -> Result<(), SimError> {
    for &profile in list_profiles() {
        for entry in list_programs(profile) {
            println!(
                "{} {} {}",
                profile.key(),
                entry.id,
                fingerprint(profile, entry.id)?
            );
        }
    }
    Ok(())
}
