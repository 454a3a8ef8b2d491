//! Block headers and token decoding
//!
//! A frame is decoded as a sequence of runs. Each run stays inside one block:
//! when the current block is used up a new header is read, which for verbatim
//! and aligned blocks also carries fresh tree lengths.

use super::bit_reader::BitReader;
use super::constants::{
    ALIGNED_NUM_ELEMENTS, BlockType, EXTRA_BITS, INTEL_CALL_OPCODE, MIN_MATCH, NUM_CHARS,
    NUM_PRIMARY_LENGTHS, NUM_SECONDARY_LENGTHS, POSITION_BASE,
};
use super::lengths::read_lengths;
use super::state::DecoderState;
use super::window::RecentOffsets;
use crate::error::{Error, Result};

/// Decode exactly `frame_len` bytes into the window.
///
/// The first call also consumes the stream header.
pub(crate) fn decode_frame(
    state: &mut DecoderState,
    reader: &mut BitReader<'_>,
    frame_len: usize,
) -> Result<()> {
    if !state.header_read {
        read_stream_header(state, reader)?;
    }

    let mut remaining = frame_len;
    while remaining > 0 {
        if state.block_remaining == 0 {
            read_block_header(state, reader)?;
            continue;
        }

        let Some(block_type) = state.block_type else {
            return Err(Error::corrupt("block data without a block header"));
        };
        let run = remaining.min(state.block_remaining as usize);

        match block_type {
            BlockType::Uncompressed => {
                let bytes = reader.read_bytes(run)?;
                state.window.extend(bytes);
            }
            BlockType::Verbatim | BlockType::Aligned => {
                decode_tokens(state, reader, block_type, run)?;
            }
        }

        state.block_remaining -= run as u32;
        remaining -= run;
    }

    Ok(())
}

/// One-time header: an Intel flag, then the translation size if it is set.
fn read_stream_header(state: &mut DecoderState, reader: &mut BitReader<'_>) -> Result<()> {
    let mut file_size = 0;
    if reader.read(1)? == 1 {
        let high = reader.read(16)?;
        let low = reader.read(16)?;
        file_size = (high << 16) | low;
    }
    state.intel.set_file_size(file_size);
    state.header_read = true;

    tracing::debug!("LZX stream header: Intel translation size {}", file_size);
    Ok(())
}

fn read_block_header(state: &mut DecoderState, reader: &mut BitReader<'_>) -> Result<()> {
    // an odd-length uncompressed block is followed by one pad byte
    if state.block_type == Some(BlockType::Uncompressed) && state.block_length & 1 == 1 {
        reader.skip_byte()?;
    }

    let raw_type = reader.read(3)?;
    let high = reader.read(16)?;
    let low = reader.read(8)?;
    let block_type = BlockType::try_from(raw_type)?;
    let block_length = (high << 8) | low;

    tracing::debug!("LZX block: {:?}, {} bytes", block_type, block_length);

    match block_type {
        BlockType::Aligned => {
            for symbol in 0..ALIGNED_NUM_ELEMENTS {
                state.aligned_tree.set_length(symbol, reader.read(3)? as u8);
            }
            state.aligned_tree.rebuild()?;
            read_trees(state, reader)?;
        }
        BlockType::Verbatim => read_trees(state, reader)?,
        BlockType::Uncompressed => {
            state.intel.arm();
            reader.align_for_raw()?;
            let r0 = reader.read_u32_le()?;
            let r1 = reader.read_u32_le()?;
            let r2 = reader.read_u32_le()?;
            if r0 == 0 || r1 == 0 || r2 == 0 {
                return Err(Error::corrupt(format!(
                    "uncompressed block repeat offsets must be non-zero, got {r0}, {r1}, {r2}"
                )));
            }
            state.offsets = RecentOffsets::new(r0, r1, r2);
        }
    }

    state.block_type = Some(block_type);
    state.block_length = block_length;
    state.block_remaining = block_length;
    Ok(())
}

/// Main tree (literals, then match headers) followed by the length tree.
fn read_trees(state: &mut DecoderState, reader: &mut BitReader<'_>) -> Result<()> {
    read_lengths(
        reader,
        &mut state.pretree,
        state.main_tree.lengths_mut(),
        0,
        NUM_CHARS,
    )?;
    read_lengths(
        reader,
        &mut state.pretree,
        state.main_tree.lengths_mut(),
        NUM_CHARS,
        state.main_elements,
    )?;
    state.main_tree.rebuild()?;

    if state.main_tree.lengths()[usize::from(INTEL_CALL_OPCODE)] != 0 {
        state.intel.arm();
    }

    read_lengths(
        reader,
        &mut state.pretree,
        state.length_tree.lengths_mut(),
        0,
        NUM_SECONDARY_LENGTHS,
    )?;
    state.length_tree.rebuild()?;

    tracing::debug!(
        "LZX trees rebuilt: {} main symbols, length tree {}",
        state.main_elements,
        if state.length_tree.is_empty() { "empty" } else { "present" }
    );
    Ok(())
}

/// Literals and matches for `run` bytes of a verbatim or aligned block.
fn decode_tokens(
    state: &mut DecoderState,
    reader: &mut BitReader<'_>,
    block_type: BlockType,
    run: usize,
) -> Result<()> {
    let mut remaining = run;

    while remaining > 0 {
        let symbol = usize::from(state.main_tree.decode(reader)?);
        if symbol < NUM_CHARS {
            state.window.push(symbol as u8);
            remaining -= 1;
            continue;
        }

        let header = symbol - NUM_CHARS;
        let mut length = header & NUM_PRIMARY_LENGTHS;
        if length == NUM_PRIMARY_LENGTHS {
            length += usize::from(state.length_tree.decode(reader)?);
        }
        length += MIN_MATCH;

        let slot = header >> 3;
        let offset = if slot < 3 {
            state.offsets.get(slot)
        } else {
            let extra = read_offset_extra(state, reader, block_type, slot)?;
            POSITION_BASE[slot] - 2 + extra
        };
        state.offsets.promote(offset);

        if length > remaining {
            return Err(Error::corrupt(format!(
                "match of {length} bytes overruns the {remaining} bytes left in this run"
            )));
        }
        state.window.copy_match(offset as usize, length)?;
        remaining -= length;
    }

    Ok(())
}

/// Extra offset bits for a slot. Aligned blocks send the low three bits of
/// any slot with three or more extra bits through the aligned tree.
fn read_offset_extra(
    state: &DecoderState,
    reader: &mut BitReader<'_>,
    block_type: BlockType,
    slot: usize,
) -> Result<u32> {
    let extra_bits = u32::from(EXTRA_BITS[slot]);
    if block_type != BlockType::Aligned || extra_bits < 3 {
        return reader.read(extra_bits);
    }

    let high = reader.read(extra_bits - 3)? << 3;
    let low = u32::from(state.aligned_tree.decode(reader)?);
    Ok(high + low)
}
