use std::fmt;

use crate::{MachineProfile, SimError};

/// Number of register roles known to any profile.
pub const REGISTER_KIND_COUNT: usize = 7;

/// Conventional register roles of the two modelled architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Register {
    /// Program counter.
    Pc = 0,
    /// Memory address register.
    Mar = 1,
    /// Memory buffer register.
    Mbr = 2,
    /// Instruction register.
    Ir = 3,
    /// Instruction buffer register (right half-word, IAS only).
    Ibr = 4,
    /// Accumulator.
    Ac = 5,
    /// Multiplier-quotient register (IAS only).
    Mq = 6,
}

impl Register {
    /// Every register role in display order.
    pub const ALL: [Self; REGISTER_KIND_COUNT] = [
        Self::Pc,
        Self::Mar,
        Self::Mbr,
        Self::Ir,
        Self::Ibr,
        Self::Ac,
        Self::Mq,
    ];

    /// Short conventional name (`PC`, `MAR`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Mar => "MAR",
            Self::Mbr => "MBR",
            Self::Ir => "IR",
            Self::Ibr => "IBR",
            Self::Ac => "AC",
            Self::Mq => "MQ",
        }
    }

    /// Looks a register up by its conventional name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|reg| reg.name().eq_ignore_ascii_case(name))
    }

    /// Registers whose value is a memory address rather than a word.
    #[must_use]
    pub const fn holds_address(self) -> bool {
        matches!(self, Self::Pc | Self::Mar)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest value representable in `width` bits.
#[must_use]
pub const fn width_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1_u64 << width) - 1
    }
}

/// Truncates a wide intermediate result to `width` bits.
///
/// The mask never exceeds 64 bits, so the narrowing cast keeps every bit.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn truncate_to_width(value: u128, width: u32) -> u64 {
    (value & width_mask(width) as u128) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
struct RegisterSlot {
    register: Register,
    width: u32,
    value: u64,
}

/// Width-checked register storage for one simulation instance.
///
/// Holds exactly the registers declared by the profile, in profile order.
/// Every write is masked to the register's declared width.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    slots: Vec<RegisterSlot>,
}

impl RegisterFile {
    /// Creates a zeroed register file for a profile.
    #[must_use]
    pub fn for_profile(profile: &MachineProfile) -> Self {
        Self {
            slots: profile
                .registers()
                .iter()
                .map(|spec| RegisterSlot {
                    register: spec.register,
                    width: spec.width,
                    value: 0,
                })
                .collect(),
        }
    }

    fn slot(&self, register: Register) -> Option<&RegisterSlot> {
        self.slots.iter().find(|slot| slot.register == register)
    }

    /// Returns `true` when the register exists in this file.
    #[must_use]
    pub fn contains(&self, register: Register) -> bool {
        self.slot(register).is_some()
    }

    /// Declared width of a register, if present.
    #[must_use]
    pub fn width(&self, register: Register) -> Option<u32> {
        self.slot(register).map(|slot| slot.width)
    }

    /// Reads a register value, if present.
    #[must_use]
    pub fn get(&self, register: Register) -> Option<u64> {
        self.slot(register).map(|slot| slot.value)
    }

    /// Writes a register, masking to its width. Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::RegisterNotPresent`] when the register is not part
    /// of `profile`'s register set.
    pub fn set(
        &mut self,
        profile: &MachineProfile,
        register: Register,
        value: u64,
    ) -> Result<u64, SimError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.register == register)
            .ok_or_else(|| SimError::RegisterNotPresent {
                register,
                profile: profile.id(),
            })?;
        slot.value = value & width_mask(slot.width);
        Ok(slot.value)
    }

    /// Iterates `(register, width, value)` in profile order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u32, u64)> + '_ {
        self.slots
            .iter()
            .map(|slot| (slot.register, slot.width, slot.value))
    }
}

#[cfg(test)]
mod tests {
    use super::{truncate_to_width, width_mask, Register, RegisterFile};
    use crate::{ProfileId, SimError};

    #[test]
    fn names_round_trip_case_insensitively() {
        for reg in Register::ALL {
            assert_eq!(Register::from_name(reg.name()), Some(reg));
            assert_eq!(
                Register::from_name(&reg.name().to_ascii_lowercase()),
                Some(reg)
            );
        }
        assert_eq!(Register::from_name("R0"), None);
    }

    #[test]
    fn width_mask_covers_common_widths() {
        assert_eq!(width_mask(12), 0xFFF);
        assert_eq!(width_mask(16), 0xFFFF);
        assert_eq!(width_mask(40), 0xFF_FFFF_FFFF);
        assert_eq!(width_mask(64), u64::MAX);
        assert_eq!(truncate_to_width(0x1_0000_0000_0000_0001, 16), 1);
    }

    #[test]
    fn file_holds_only_profile_registers() {
        let profile = ProfileId::Hypothetical.profile();
        let file = RegisterFile::for_profile(profile);

        let names: Vec<Register> = file.iter().map(|(reg, _, _)| reg).collect();
        assert_eq!(
            names,
            vec![
                Register::Pc,
                Register::Mar,
                Register::Mbr,
                Register::Ir,
                Register::Ac
            ]
        );
        assert!(!file.contains(Register::Mq));
        assert_eq!(file.width(Register::Pc), Some(12));
        assert_eq!(file.width(Register::Ac), Some(16));
    }

    #[test]
    fn writes_are_masked_to_declared_width() {
        let profile = ProfileId::Hypothetical.profile();
        let mut file = RegisterFile::for_profile(profile);

        let stored = file
            .set(profile, Register::Pc, 0x1FFF)
            .expect("PC is a hypothetical register");
        assert_eq!(stored, 0xFFF);
        assert_eq!(file.get(Register::Pc), Some(0xFFF));
    }

    #[test]
    fn writing_a_foreign_register_is_rejected() {
        let profile = ProfileId::Hypothetical.profile();
        let mut file = RegisterFile::for_profile(profile);

        assert_eq!(
            file.set(profile, Register::Ibr, 1),
            Err(SimError::RegisterNotPresent {
                register: Register::Ibr,
                profile: ProfileId::Hypothetical,
            })
        );
    }
}
