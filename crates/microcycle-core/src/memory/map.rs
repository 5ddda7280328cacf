//! Display windows over the word-addressed memory.

use std::ops::RangeInclusive;

/// Classification of a memory window for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CellKind {
    /// Words decoded as instructions.
    Instruction,
    /// Words shown as plain integers.
    Data,
}

/// Profile-declared inclusive address range rendered by the state renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryWindow {
    /// How cells in this window are decoded.
    pub kind: CellKind,
    /// Inclusive start address.
    pub start: usize,
    /// Inclusive end address.
    pub end: usize,
}

impl MemoryWindow {
    /// Creates an instruction window.
    #[must_use]
    pub const fn instructions(start: usize, end: usize) -> Self {
        Self {
            kind: CellKind::Instruction,
            start,
            end,
        }
    }

    /// Creates a data window.
    #[must_use]
    pub const fn data(start: usize, end: usize) -> Self {
        Self {
            kind: CellKind::Data,
            start,
            end,
        }
    }

    /// Returns `true` when `addr` falls inside the window.
    #[must_use]
    pub const fn contains(self, addr: usize) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Addresses covered by the window in ascending order.
    #[must_use]
    pub const fn addresses(self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}
