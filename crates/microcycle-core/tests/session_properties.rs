//! Width masking, idempotence and determinism properties.

use microcycle_core::{
    list_profiles, list_programs, new_session, width_mask, EngineState, MicroOp, MicroStep,
    ProfileId, Program, Register, Session, SessionConfig, SplitPolicy, StateView,
};
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;
use tracing as _;

fn replay(profile: ProfileId, program: usize) -> Vec<StateView> {
    let mut session = new_session(profile, program).unwrap();
    let mut views = vec![session.snapshot()];
    while session.state() != EngineState::Completed {
        session.advance().unwrap();
        views.push(session.snapshot());
    }
    views
}

fn assert_within_widths(view: &StateView, word_bits: u32) {
    for row in &view.registers {
        assert!(row.value <= width_mask(row.width), "{} overflowed", row.name);
    }
    for row in &view.memory {
        assert!(row.value <= width_mask(word_bits));
    }
}

#[test]
fn catalog_runs_are_deterministic() {
    for &profile in list_profiles() {
        for entry in list_programs(profile) {
            assert_eq!(replay(profile, entry.id), replay(profile, entry.id));
        }
    }
}

#[test]
fn every_snapshot_stays_within_declared_widths() {
    for &profile in list_profiles() {
        let word_bits = profile.profile().word_bits();
        for entry in list_programs(profile) {
            for view in replay(profile, entry.id) {
                assert_within_widths(&view, word_bits);
            }
        }
    }
}

#[test]
fn snapshot_is_idempotent() {
    let mut session = new_session(ProfileId::Ias, 1).unwrap();
    for _ in 0..7 {
        session.advance().unwrap();
    }
    assert_eq!(session.snapshot(), session.snapshot());
}

#[test]
fn faithful_profile_changes_only_the_split_registers() {
    let faithful = ProfileId::Ias
        .profile()
        .with_split_policy(SplitPolicy::Faithful);
    let program = microcycle_core::load_program(ProfileId::Ias, 1).unwrap();
    let mut session = Session::from_program(&faithful, program, SessionConfig::default()).unwrap();
    session.run_to_completion().unwrap();

    let view = session.snapshot();
    // 20 * 4 fits in the low word, so the high half stored to M[12] is 0.
    assert_eq!(view.register(Register::Mq), Some(5));
    assert_eq!(view.register(Register::Ac), Some(0));
}

proptest! {
    #[test]
    fn copies_are_masked_to_the_destination_width(value in any::<u64>()) {
        let profile = ProfileId::Hypothetical.profile();
        let program = Program::new("mask")
            .with_register(Register::Mbr, value)
            .with_steps([MicroStep::execute(MicroOp::CopyRegister {
                from: Register::Mbr,
                to: Register::Pc,
            })]);
        let mut session = Session::from_program(profile, program, SessionConfig::default()).unwrap();
        session.advance().unwrap();

        let view = session.snapshot();
        prop_assert_eq!(view.register(Register::Mbr), Some(value & 0xFFFF));
        prop_assert_eq!(view.register(Register::Pc), Some(value & 0xFFF));
    }

    #[test]
    fn increments_wrap_at_register_width(start in 0u64..0x1000, times in 1usize..40) {
        let profile = ProfileId::Hypothetical.profile();
        let program = Program::new("count")
            .with_register(Register::Pc, start)
            .with_steps(vec![
                MicroStep::fetch(MicroOp::IncrementRegister { register: Register::Pc });
                times
            ]);
        let mut session = Session::from_program(profile, program, SessionConfig::default()).unwrap();
        session.run_to_completion().unwrap();

        let expected = (start + u64::try_from(times).unwrap()) & 0xFFF;
        prop_assert_eq!(session.snapshot().register(Register::Pc), Some(expected));
    }
}

#[cfg(feature = "serde")]
#[test]
fn snapshots_serialize_round_trip() {
    let mut session = new_session(ProfileId::Hypothetical, 0).unwrap();
    session.advance().unwrap();
    let view = session.snapshot();

    let json = serde_json::to_string(&view).unwrap();
    let back: StateView = serde_json::from_str(&json).unwrap();
    assert_eq!(back, view);
    assert!(json.contains("\"Hypothetical\""));
}
