//! Canonical Huffman decode tables for the four LZX trees
//!
//! Each tree keeps its code lengths and a decode table in fixed-size arrays.
//! Codes no longer than `TABLE_BITS` are resolved with a single lookup: every
//! slot whose top bits match the code holds the symbol. Longer codes hang off
//! the direct area as chains of two-entry nodes, walked one bit at a time.
//! Any table entry `>= SYMBOLS` is a link to such a node.

use super::bit_reader::BitReader;
use super::constants::{
    ALIGNED_MAXSYMBOLS, ALIGNED_TABLEBITS, LENGTH_MAXSYMBOLS, LENGTH_TABLEBITS, LENTABLE_SAFETY,
    MAINTREE_MAXSYMBOLS, MAINTREE_TABLEBITS, MAX_CODE_LENGTH, PRETREE_MAXSYMBOLS,
    PRETREE_TABLEBITS, decode_table_size,
};
use crate::error::{Error, Result};

/// A Huffman tree with compile-time table capacities.
///
/// * `SYMBOLS` - alphabet size
/// * `TABLE_BITS` - width of the direct lookup
/// * `TABLE_SIZE` - `2^TABLE_BITS + 2 * SYMBOLS` decode table entries
/// * `LEN_SIZE` - code length slots, `SYMBOLS` plus a safety margin
pub struct HuffmanTree<
    const SYMBOLS: usize,
    const TABLE_BITS: usize,
    const TABLE_SIZE: usize,
    const LEN_SIZE: usize,
> {
    name: &'static str,
    table: [u16; TABLE_SIZE],
    lengths: [u8; LEN_SIZE],
    empty: bool,
}

pub type PreTree = HuffmanTree<
    PRETREE_MAXSYMBOLS,
    PRETREE_TABLEBITS,
    { decode_table_size(PRETREE_TABLEBITS, PRETREE_MAXSYMBOLS) },
    { PRETREE_MAXSYMBOLS + LENTABLE_SAFETY },
>;

pub type MainTree = HuffmanTree<
    MAINTREE_MAXSYMBOLS,
    MAINTREE_TABLEBITS,
    { decode_table_size(MAINTREE_TABLEBITS, MAINTREE_MAXSYMBOLS) },
    { MAINTREE_MAXSYMBOLS + LENTABLE_SAFETY },
>;

pub type LengthTree = HuffmanTree<
    LENGTH_MAXSYMBOLS,
    LENGTH_TABLEBITS,
    { decode_table_size(LENGTH_TABLEBITS, LENGTH_MAXSYMBOLS) },
    { LENGTH_MAXSYMBOLS + LENTABLE_SAFETY },
>;

pub type AlignedTree = HuffmanTree<
    ALIGNED_MAXSYMBOLS,
    ALIGNED_TABLEBITS,
    { decode_table_size(ALIGNED_TABLEBITS, ALIGNED_MAXSYMBOLS) },
    { ALIGNED_MAXSYMBOLS + LENTABLE_SAFETY },
>;

impl<const SYMBOLS: usize, const TABLE_BITS: usize, const TABLE_SIZE: usize, const LEN_SIZE: usize>
    HuffmanTree<SYMBOLS, TABLE_BITS, TABLE_SIZE, LEN_SIZE>
{
    /// Create a tree with every code length zero (an empty table).
    pub fn new(name: &'static str) -> Self {
        const {
            assert!(TABLE_SIZE == (1 << TABLE_BITS) + 2 * SYMBOLS);
            assert!(LEN_SIZE >= SYMBOLS + LENTABLE_SAFETY);
            // chain links start at 2^(TABLE_BITS - 1) and must not look like symbols
            assert!((1 << TABLE_BITS) / 2 >= SYMBOLS);
            assert!(TABLE_BITS as u32 <= MAX_CODE_LENGTH);
        }

        Self {
            name,
            table: [0; TABLE_SIZE],
            lengths: [0; LEN_SIZE],
            empty: true,
        }
    }

    /// Code lengths of the real alphabet
    pub fn lengths(&self) -> &[u8] {
        &self.lengths[..SYMBOLS]
    }

    /// All code length slots, including the safety margin
    pub fn lengths_mut(&mut self) -> &mut [u8] {
        &mut self.lengths
    }

    pub fn set_length(&mut self, symbol: usize, length: u8) {
        self.lengths[symbol] = length;
    }

    /// Whether the last rebuild saw no codes at all
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    fn invalid(&self) -> Error {
        Error::InvalidHuffmanTable { tree: self.name }
    }

    /// Rebuild the decode table from the current code lengths.
    ///
    /// Symbols are assigned canonical codes in order of increasing length, and
    /// by symbol number within a length. An all-zero length set produces an
    /// empty tree.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHuffmanTable`] if the lengths over-subscribe the
    /// code space or leave part of it unreachable.
    pub fn rebuild(&mut self) -> Result<()> {
        let table_bits = TABLE_BITS as u32;
        let mut pos: u32 = 0;
        let mut table_mask: u32 = 1 << table_bits;
        let mut bit_mask: u32 = table_mask >> 1;
        let mut next_node: u32 = bit_mask;
        let mut bit_num: u32 = 1;
        self.empty = true;

        while bit_num <= table_bits {
            for symbol in 0..SYMBOLS {
                if u32::from(self.lengths[symbol]) != bit_num {
                    continue;
                }
                let leaf = pos as usize;
                pos += bit_mask;
                if pos > table_mask {
                    return Err(self.invalid());
                }
                self.table[leaf..pos as usize].fill(symbol as u16);
            }
            bit_mask >>= 1;
            bit_num += 1;
        }

        if self.lengths().iter().any(|&length| u32::from(length) > table_bits) {
            self.table[pos as usize..table_mask as usize].fill(0);

            // track the position with 16 more bits of precision for long codes
            pos <<= 16;
            table_mask <<= 16;
            bit_mask = 1 << 15;

            while bit_num <= MAX_CODE_LENGTH {
                for symbol in 0..SYMBOLS {
                    if u32::from(self.lengths[symbol]) != bit_num {
                        continue;
                    }
                    let mut leaf = (pos >> 16) as usize;
                    for fill in 0..bit_num - table_bits {
                        if self.table[leaf] == 0 {
                            let node = (next_node << 1) as usize;
                            if node + 1 >= TABLE_SIZE {
                                return Err(self.invalid());
                            }
                            self.table[node] = 0;
                            self.table[node + 1] = 0;
                            self.table[leaf] = next_node as u16;
                            next_node += 1;
                        }
                        leaf = usize::from(self.table[leaf]) << 1;
                        if (pos >> (15 - fill)) & 1 == 1 {
                            leaf += 1;
                        }
                    }
                    self.table[leaf] = symbol as u16;

                    pos += bit_mask;
                    if pos > table_mask {
                        return Err(self.invalid());
                    }
                }
                bit_mask >>= 1;
                bit_num += 1;
            }
        }

        if pos == table_mask {
            self.empty = false;
            return Ok(());
        }

        if self.lengths().iter().any(|&length| length != 0) {
            return Err(self.invalid());
        }
        Ok(())
    }

    /// Decode one symbol from the bitstream.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHuffmanTable`] for an empty tree,
    /// [`Error::CorruptBitstream`] if a long code walk runs past 16 bits, and
    /// [`Error::UnexpectedEndOfInput`] if the code extends past the input.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        if self.empty {
            return Err(self.invalid());
        }

        reader.ensure(MAX_CODE_LENGTH)?;
        let table_bits = TABLE_BITS as u32;
        let mut symbol = self.table[reader.peek(table_bits) as usize];
        let mut depth = table_bits;

        while usize::from(symbol) >= SYMBOLS {
            if depth >= MAX_CODE_LENGTH {
                return Err(Error::corrupt(format!(
                    "{} tree code longer than {MAX_CODE_LENGTH} bits",
                    self.name
                )));
            }
            depth += 1;
            let index = (usize::from(symbol) << 1) | (reader.peek(depth) & 1) as usize;
            symbol = *self.table.get(index).ok_or_else(|| {
                Error::corrupt(format!("{} tree chain index {index} out of range", self.name))
            })?;
        }

        let length = self.lengths[usize::from(symbol)];
        if length == 0 {
            return Err(Error::corrupt(format!(
                "{} tree decoded unused symbol {symbol}",
                self.name
            )));
        }
        reader.consume(u32::from(length))?;
        Ok(symbol)
    }
}
