//! Pretree-coded code length updates
//!
//! Trees are never sent outright. Each block transmits a fresh pretree, then
//! uses it to code deltas against the lengths the tree had in the previous
//! block, with two zero-run symbols and one "same delta repeated" symbol.

use super::bit_reader::BitReader;
use super::constants::PRETREE_NUM_ELEMENTS;
use super::huffman::PreTree;
use crate::error::{Error, Result};

/// Delta symbols 0..=16 map an old length to `(old - delta) mod 17`
const MAX_DELTA: u16 = 16;
const ZERO_RUN_SHORT: u16 = 17;
const ZERO_RUN_LONG: u16 = 18;
const REPEAT_DELTA: u16 = 19;

fn apply_delta(old: u8, delta: u16) -> u8 {
    ((u16::from(old) + 17 - delta) % 17) as u8
}

fn fill_run(lengths: &mut [u8], pos: &mut usize, last: usize, run: usize, value: u8) -> Result<()> {
    let end = *pos + run;
    if end > last {
        return Err(Error::corrupt(format!(
            "code length run of {run} at {pos} passes the end of its range ({last})",
            pos = *pos
        )));
    }
    lengths[*pos..end].fill(value);
    *pos = end;
    Ok(())
}

/// Update `lengths[first..last]` from the bitstream.
///
/// The pretree is rebuilt from 20 raw 4-bit lengths first.
///
/// # Errors
/// Returns [`Error::CorruptBitstream`] if a run passes `last`, plus any
/// pretree build or decode error.
pub fn read_lengths(
    reader: &mut BitReader<'_>,
    pretree: &mut PreTree,
    lengths: &mut [u8],
    first: usize,
    last: usize,
) -> Result<()> {
    if first > last || last > lengths.len() {
        return Err(Error::corrupt(format!(
            "code length range {first}..{last} outside table of {}",
            lengths.len()
        )));
    }

    for symbol in 0..PRETREE_NUM_ELEMENTS {
        pretree.set_length(symbol, reader.read(4)? as u8);
    }
    pretree.rebuild()?;

    let mut pos = first;
    while pos < last {
        match pretree.decode(reader)? {
            ZERO_RUN_SHORT => {
                let run = reader.read(4)? as usize + 4;
                fill_run(lengths, &mut pos, last, run, 0)?;
            }
            ZERO_RUN_LONG => {
                let run = reader.read(5)? as usize + 20;
                fill_run(lengths, &mut pos, last, run, 0)?;
            }
            REPEAT_DELTA => {
                let run = reader.read(1)? as usize + 4;
                let delta = pretree.decode(reader)?;
                if delta > MAX_DELTA {
                    return Err(Error::corrupt(format!(
                        "pretree symbol {delta} cannot be repeated"
                    )));
                }
                let length = apply_delta(lengths[pos], delta);
                fill_run(lengths, &mut pos, last, run, length)?;
            }
            delta => {
                lengths[pos] = apply_delta(lengths[pos], delta);
                pos += 1;
            }
        }
    }

    Ok(())
}
