//! Display-agnostic state snapshots.
//!
//! A [`StateView`] is plain data; hosts turn it into terminal tables or
//! widgets without knowing anything about the machine.

use crate::control::{Unit, UnitStatus};
use crate::execute::Machine;
use crate::memory::CellKind;
use crate::{EngineState, MachineProfile, ProfileId, Register};

/// One register row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterRow {
    /// Register role.
    pub register: Register,
    /// Display name, e.g. `MBR`.
    pub name: String,
    /// Raw value.
    pub value: u64,
    /// `0x` hex padded to the register width.
    pub formatted: String,
    /// Declared width in bits.
    pub width: u32,
}

/// One functional-unit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UnitRow {
    /// Unit.
    pub unit: Unit,
    /// Status label.
    pub status: UnitStatus,
}

/// One memory-cell row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryRow {
    /// Word address.
    pub address: u64,
    /// Address in the profile radix.
    pub formatted_address: String,
    /// Raw word.
    pub value: u64,
    /// Hex for instruction words, decimal for data words.
    pub formatted_value: String,
    /// Disassembly for instruction words, the integer for data words.
    pub content: String,
    /// Window the cell belongs to.
    pub kind: CellKind,
}

/// Structured snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StateView {
    /// Profile being simulated.
    pub profile: ProfileId,
    /// Profile title for headings.
    pub title: String,
    /// Program name.
    pub program: String,
    /// Registers in profile order.
    pub registers: Vec<RegisterRow>,
    /// Units in display order.
    pub units: Vec<UnitRow>,
    /// Instruction window rows followed by data window rows.
    pub memory: Vec<MemoryRow>,
    /// `(cursor, total steps)`.
    pub progress: (usize, usize),
    /// Lifecycle state.
    pub state: EngineState,
}

impl StateView {
    /// Value of a register row, if the profile has it.
    #[must_use]
    pub fn register(&self, register: Register) -> Option<u64> {
        self.registers
            .iter()
            .find(|row| row.register == register)
            .map(|row| row.value)
    }

    /// Memory rows of one kind.
    pub fn cells(&self, kind: CellKind) -> impl Iterator<Item = &MemoryRow> + '_ {
        self.memory.iter().filter(move |row| row.kind == kind)
    }
}

/// Builds a snapshot of `machine`.
///
/// Zero-valued memory cells are left out unless `show_zero_cells` is set.
#[must_use]
pub fn snapshot(machine: &Machine, show_zero_cells: bool) -> StateView {
    let profile = machine.profile();

    let registers = machine
        .registers()
        .iter()
        .map(|(register, width, value)| RegisterRow {
            register,
            name: register.name().to_owned(),
            value,
            formatted: hex(value, width),
            width,
        })
        .collect();

    let units = machine
        .control()
        .rows()
        .into_iter()
        .map(|(unit, status)| UnitRow { unit, status })
        .collect();

    let words = machine.memory().words();
    let memory = profile
        .windows()
        .into_iter()
        .flat_map(|window| window.addresses().map(move |address| (window.kind, address)))
        .filter_map(|(kind, address)| {
            let value = *words.get(address)?;
            (show_zero_cells || value != 0).then(|| memory_row(profile, kind, address, value))
        })
        .collect();

    StateView {
        profile: profile.id(),
        title: profile.title().to_owned(),
        program: machine.program().name().to_owned(),
        registers,
        units,
        memory,
        progress: (machine.cursor(), machine.total()),
        state: machine.state(),
    }
}

fn memory_row(profile: &MachineProfile, kind: CellKind, address: usize, value: u64) -> MemoryRow {
    let address = address as u64;
    let (formatted_value, content) = match kind {
        CellKind::Instruction => (
            hex(value, profile.word_bits()),
            profile.disassemble_word(value),
        ),
        CellKind::Data => (value.to_string(), value.to_string()),
    };
    MemoryRow {
        address,
        formatted_address: profile.format_address(address),
        value,
        formatted_value,
        content,
        kind,
    }
}

fn hex(value: u64, width: u32) -> String {
    let digits = width.div_ceil(4) as usize;
    format!("0x{value:0digits$X}")
}

#[cfg(test)]
mod tests {
    use super::{hex, snapshot};
    use crate::control::UnitStatus;
    use crate::execute::Machine;
    use crate::memory::CellKind;
    use crate::program::load_program;
    use crate::{EngineState, ProfileId, Register};

    fn loaded(profile: ProfileId, id: usize) -> Machine {
        Machine::load(profile.profile(), load_program(profile, id).unwrap()).unwrap()
    }

    #[test]
    fn hex_pads_to_register_width() {
        assert_eq!(hex(0x100, 12), "0x100");
        assert_eq!(hex(5, 16), "0x0005");
        assert_eq!(hex(80, 40), "0x0000000050");
    }

    #[test]
    fn fresh_hypothetical_view_lists_program_and_operands() {
        let view = snapshot(&loaded(ProfileId::Hypothetical, 0), false);

        assert_eq!(view.state, EngineState::Loaded);
        assert_eq!(view.progress, (0, 26));
        assert_eq!(view.register(Register::Pc), Some(0x100));
        assert!(view.units.iter().all(|row| row.status == UnitStatus::Idle));

        let code: Vec<_> = view
            .cells(CellKind::Instruction)
            .map(|row| row.content.as_str())
            .collect();
        assert_eq!(code, ["LOAD M(0x200)", "ADD M(0x201)", "STOR M(0x202)"]);

        let data: Vec<_> = view.cells(CellKind::Data).map(|row| row.value).collect();
        assert_eq!(data, [5, 10]);
    }

    #[test]
    fn zero_cells_appear_on_request() {
        let view = snapshot(&loaded(ProfileId::Ias, 0), true);
        assert_eq!(view.cells(CellKind::Instruction).count(), 6);
        assert_eq!(view.cells(CellKind::Data).count(), 4);
        assert_eq!(view.memory[0].formatted_address, "0");
    }

    #[test]
    fn registers_follow_profile_order() {
        let view = snapshot(&loaded(ProfileId::Ias, 1), false);
        let names: Vec<_> = view.registers.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["PC", "MAR", "MBR", "IR", "IBR", "AC", "MQ"]);
        assert_eq!(view.registers[2].width, 40);
    }
}
