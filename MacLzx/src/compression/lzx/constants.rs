//! Fixed LZX format constants and the position slot tables

use crate::error::{Error, Result};

/// Shortest match the format can express
pub const MIN_MATCH: usize = 2;

/// Number of literal symbols at the start of the main tree
pub const NUM_CHARS: usize = 256;

/// Match length header value meaning "read the rest from the length tree"
pub const NUM_PRIMARY_LENGTHS: usize = 7;

/// Number of length tree symbols transmitted per block
pub const NUM_SECONDARY_LENGTHS: usize = 249;

pub const PRETREE_NUM_ELEMENTS: usize = 20;
pub const ALIGNED_NUM_ELEMENTS: usize = 8;

pub const PRETREE_MAXSYMBOLS: usize = PRETREE_NUM_ELEMENTS;
pub const PRETREE_TABLEBITS: usize = 6;
pub const MAINTREE_MAXSYMBOLS: usize = NUM_CHARS + 50 * 8;
pub const MAINTREE_TABLEBITS: usize = 12;
pub const LENGTH_MAXSYMBOLS: usize = NUM_SECONDARY_LENGTHS + 1;
pub const LENGTH_TABLEBITS: usize = 12;
pub const ALIGNED_MAXSYMBOLS: usize = ALIGNED_NUM_ELEMENTS;
pub const ALIGNED_TABLEBITS: usize = 7;

/// Extra code length slots so run-length updates near the end never index out of bounds
pub const LENTABLE_SAFETY: usize = 64;

/// Longest Huffman code any LZX tree may use
pub const MAX_CODE_LENGTH: u32 = 16;

/// Main tree symbol 0xE8 (x86 `call`) having a code arms the Intel transform
pub const INTEL_CALL_OPCODE: u8 = 0xE8;

/// The Intel transform is only applied to the first 32768 frames of a stream
pub const INTEL_MAX_FRAMES: u32 = 32768;

/// Number of position slots in the largest (2 MB) window
pub const NUM_POSITION_SLOTS: usize = 51;

/// Entries in a decode table: the direct lookup area plus room for chained long codes
pub const fn decode_table_size(table_bits: usize, symbols: usize) -> usize {
    (1 << table_bits) + symbols * 2
}

const fn extra_bits_for(slot: usize) -> u8 {
    if slot < 4 {
        0
    } else if slot < 36 {
        (slot / 2 - 1) as u8
    } else {
        17
    }
}

/// Number of extra offset bits following each position slot
pub const EXTRA_BITS: [u8; NUM_POSITION_SLOTS] = {
    let mut table = [0; NUM_POSITION_SLOTS];
    let mut slot = 0;
    while slot < NUM_POSITION_SLOTS {
        table[slot] = extra_bits_for(slot);
        slot += 1;
    }
    table
};

/// Smallest formatted offset encoded by each position slot
pub const POSITION_BASE: [u32; NUM_POSITION_SLOTS] = {
    let mut table = [0; NUM_POSITION_SLOTS];
    let mut slot = 1;
    while slot < NUM_POSITION_SLOTS {
        table[slot] = table[slot - 1] + (1 << EXTRA_BITS[slot - 1]);
        slot += 1;
    }
    table
};

/// LZX block types as stored in the 3-bit block header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Verbatim = 1,
    Aligned = 2,
    Uncompressed = 3,
}

impl TryFrom<u32> for BlockType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(BlockType::Verbatim),
            2 => Ok(BlockType::Aligned),
            3 => Ok(BlockType::Uncompressed),
            block_type => Err(Error::InvalidBlockType { block_type }),
        }
    }
}

/// Sliding window size, fixed for the lifetime of a decoder.
///
/// LZX windows are powers of two from 32 KB (`2^15`) to 2 MB (`2^21`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowSize {
    bits: u8,
}

impl WindowSize {
    /// Smallest supported window, as a power of two
    pub const MIN_BITS: u8 = 15;
    /// Largest supported window, as a power of two
    pub const MAX_BITS: u8 = 21;

    /// Validate a window size given as a power of two.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedWindowSizeRange`] outside `15..=21`.
    pub fn from_bits(bits: u8) -> Result<Self> {
        if (Self::MIN_BITS..=Self::MAX_BITS).contains(&bits) {
            Ok(Self { bits })
        } else {
            Err(Error::UnsupportedWindowSizeRange {
                bits: u32::from(bits),
            })
        }
    }

    /// Validate a window size given in bytes.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedWindowSizeRange`] unless `bytes` is a power of
    /// two between 32 KB and 2 MB.
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        if !bytes.is_power_of_two() {
            return Err(Error::UnsupportedWindowSizeRange {
                bits: bytes.checked_ilog2().unwrap_or(0),
            });
        }
        let bits = bytes.trailing_zeros();
        u8::try_from(bits)
            .map_err(|_| Error::UnsupportedWindowSizeRange { bits })
            .and_then(Self::from_bits)
    }

    pub fn bits(self) -> u8 {
        self.bits
    }

    /// Window size in bytes
    pub fn bytes(self) -> usize {
        1 << self.bits
    }

    /// Number of position slots the window can address
    pub fn position_slots(self) -> usize {
        match self.bits {
            20 => 42,
            21 => 50,
            bits => usize::from(bits) * 2,
        }
    }

    /// Size of the main tree alphabet for this window
    pub fn main_elements(self) -> usize {
        NUM_CHARS + (self.position_slots() << 3)
    }
}

impl TryFrom<u8> for WindowSize {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_bits_table() {
        assert_eq!(&EXTRA_BITS[..8], &[0, 0, 0, 0, 1, 1, 2, 2]);
        assert_eq!(EXTRA_BITS[12], 5);
        assert_eq!(EXTRA_BITS[35], 16);
        assert!(EXTRA_BITS[36..].iter().all(|&bits| bits == 17));
    }

    #[test]
    fn test_position_base_table() {
        assert_eq!(&POSITION_BASE[..10], &[0, 1, 2, 3, 4, 6, 8, 12, 16, 24]);
        assert_eq!(POSITION_BASE[12], 64);
        assert_eq!(POSITION_BASE[19], 768);
        assert_eq!(POSITION_BASE[36], 262_144);
        assert_eq!(POSITION_BASE[50], 2_097_152);
    }

    #[test]
    fn test_window_size_range() {
        assert!(matches!(
            WindowSize::from_bits(14),
            Err(Error::UnsupportedWindowSizeRange { bits: 14 })
        ));
        assert!(WindowSize::try_from(22u8).is_err());

        let window = WindowSize::from_bits(16).unwrap();
        assert_eq!(window.bytes(), 65536);
        assert_eq!(window.position_slots(), 32);
        assert_eq!(window.main_elements(), 512);

        assert_eq!(WindowSize::from_bits(20).unwrap().position_slots(), 42);
        assert_eq!(WindowSize::from_bits(21).unwrap().main_elements(), MAINTREE_MAXSYMBOLS);
    }

    #[test]
    fn test_window_size_from_bytes() {
        assert_eq!(WindowSize::from_bytes(1 << 17).unwrap().bits(), 17);
        assert!(matches!(
            WindowSize::from_bytes(1 << 22),
            Err(Error::UnsupportedWindowSizeRange { bits: 22 })
        ));
        assert!(WindowSize::from_bytes(40_000).is_err());
        assert!(WindowSize::from_bytes(0).is_err());
    }

    #[test]
    fn test_block_type_from_header() {
        assert_eq!(BlockType::try_from(2).unwrap(), BlockType::Aligned);
        assert!(matches!(
            BlockType::try_from(0),
            Err(Error::InvalidBlockType { block_type: 0 })
        ));
        assert!(BlockType::try_from(7).is_err());
    }
}
