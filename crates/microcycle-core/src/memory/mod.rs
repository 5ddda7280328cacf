//! Bounded word-addressed memory and its display windows.

/// Profile-declared rendering windows.
pub mod map;

pub use map::{CellKind, MemoryWindow};

use crate::{width_mask, SimError};

/// Fixed-size array of word-sized cells, masked to the profile word size.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    words: Box<[u64]>,
    word_bits: u32,
}

impl Memory {
    /// Allocates a zeroed memory of `size` words of `word_bits` bits.
    #[must_use]
    pub fn new(size: usize, word_bits: u32) -> Self {
        Self {
            words: vec![0; size].into_boxed_slice(),
            word_bits,
        }
    }

    /// Number of addressable words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` for a zero-sized memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word size in bits.
    #[must_use]
    pub const fn word_bits(&self) -> u32 {
        self.word_bits
    }

    fn index(&self, address: u64) -> Result<usize, SimError> {
        usize::try_from(address)
            .ok()
            .filter(|index| *index < self.words.len())
            .ok_or(SimError::AddressOutOfRange {
                address,
                size: self.words.len(),
            })
    }

    /// Reads the word at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] when `address` is not below the
    /// memory size.
    pub fn read(&self, address: u64) -> Result<u64, SimError> {
        let index = self.index(address)?;
        Ok(self.words[index])
    }

    /// Checks that `address` is writable without touching memory.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] when `address` is not below the
    /// memory size.
    pub fn check(&self, address: u64) -> Result<(), SimError> {
        self.index(address).map(|_| ())
    }

    /// Writes `value` masked to the word size. Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] when `address` is not below the
    /// memory size.
    pub fn write(&mut self, address: u64, value: u64) -> Result<u64, SimError> {
        let index = self.index(address)?;
        let stored = value & width_mask(self.word_bits);
        self.words[index] = stored;
        Ok(stored)
    }

    /// Clears every cell to zero.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Raw view of every word in address order.
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::Memory;
    use crate::SimError;

    #[test]
    fn new_memory_is_zeroed() {
        let memory = Memory::new(4096, 16);
        assert_eq!(memory.len(), 4096);
        assert!(memory.words().iter().all(|word| *word == 0));
    }

    #[test]
    fn writes_are_masked_to_word_size() {
        let mut memory = Memory::new(16, 16);
        assert_eq!(memory.write(3, 0x1_2345), Ok(0x2345));
        assert_eq!(memory.read(3), Ok(0x2345));
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut memory = Memory::new(1000, 40);
        let expected = Err(SimError::AddressOutOfRange {
            address: 1000,
            size: 1000,
        });
        assert_eq!(memory.read(1000), expected);
        assert_eq!(memory.write(1000, 1), expected);
        assert!(memory.check(999).is_ok());
    }

    #[test]
    fn clear_resets_all_cells() {
        let mut memory = Memory::new(8, 16);
        memory.write(0, 7).expect("in range");
        memory.write(7, 9).expect("in range");
        memory.clear();
        assert!(memory.words().iter().all(|word| *word == 0));
    }
}
