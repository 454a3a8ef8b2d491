//! Minimal LZX bitstream writer for building test frames

use super::constants::PRETREE_NUM_ELEMENTS;

/// A canonical Huffman code, most significant bit first
#[derive(Debug, Clone, Copy, Default)]
pub struct Code {
    pub bits: u32,
    pub len: u8,
}

/// Writes bits most-significant first into 16-bit little-endian words.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    count: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bits(&mut self, value: u32, bits: u32) {
        for shift in (0..bits).rev() {
            self.acc = (self.acc << 1) | ((value >> shift) & 1);
            self.count += 1;
            if self.count == 16 {
                self.bytes.extend_from_slice(&(self.acc as u16).to_le_bytes());
                self.acc = 0;
                self.count = 0;
            }
        }
    }

    pub fn write_code(&mut self, code: Code) {
        self.write_bits(code.bits, u32::from(code.len));
    }

    /// Pad to the next word; a block already on a boundary still gets a full pad word.
    pub fn align_for_raw(&mut self) {
        let pad = if self.count == 0 { 16 } else { 16 - self.count };
        self.write_bits(0, pad);
    }

    /// Raw bytes, only valid right after `align_for_raw` or another raw write.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        assert_eq!(self.count, 0, "raw bytes must start on a word boundary");
        self.bytes.extend_from_slice(bytes);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.count > 0 {
            self.write_bits(0, 16 - self.count);
        }
        self.bytes
    }
}

/// Canonical codes for a length set: shorter codes first, then by symbol.
pub fn canonical_codes(lengths: &[u8]) -> Vec<Code> {
    let mut count = [0u32; 17];
    for &length in lengths {
        if length > 0 {
            count[usize::from(length)] += 1;
        }
    }

    let mut next = [0u32; 17];
    let mut code = 0;
    for bits in 1..=16 {
        code = (code + count[bits - 1]) << 1;
        next[bits] = code;
    }

    lengths
        .iter()
        .map(|&length| {
            if length == 0 {
                return Code::default();
            }
            let bits = next[usize::from(length)];
            next[usize::from(length)] += 1;
            Code { bits, len: length }
        })
        .collect()
}

/// Pretree used by the writer: twelve 4-bit codes and eight 5-bit codes.
pub const PRETREE_LENGTHS: [u8; PRETREE_NUM_ELEMENTS] =
    [4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 5, 5];

/// Send the writer's pretree and return its codes.
pub fn write_pretree(writer: &mut BitWriter) -> Vec<Code> {
    for length in PRETREE_LENGTHS {
        writer.write_bits(u32::from(length), 4);
    }
    canonical_codes(&PRETREE_LENGTHS)
}

/// Send a code length update as one pretree delta per symbol.
pub fn write_lengths(writer: &mut BitWriter, previous: &[u8], next: &[u8]) {
    assert_eq!(previous.len(), next.len());
    let codes = write_pretree(writer);
    for (&old, &new) in previous.iter().zip(next) {
        let delta = (17 + u32::from(old) - u32::from(new)) % 17;
        writer.write_code(codes[delta as usize]);
    }
}

/// Block header without the one-time stream header.
pub fn write_block_header(writer: &mut BitWriter, block_type: u32, length: u32) {
    writer.write_bits(block_type, 3);
    writer.write_bits(length >> 8, 16);
    writer.write_bits(length & 0xFF, 8);
}

/// Straightforward reference for what a sequence of matches should produce.
pub fn apply_match(history: &mut Vec<u8>, offset: usize, length: usize) {
    for _ in 0..length {
        let byte = history[history.len() - offset];
        history.push(byte);
    }
}

/// Main tree for a 64 KB window (512 symbols) with every code 9 bits long
pub const FLAT_MAIN_LENGTHS: [u8; 512] = [9; 512];

/// Send the main and length tree updates that open a verbatim or aligned block.
pub fn write_trees(
    writer: &mut BitWriter,
    previous_main: &[u8],
    main: &[u8],
    previous_length: &[u8],
    length: &[u8],
) {
    write_lengths(writer, &previous_main[..256], &main[..256]);
    write_lengths(writer, &previous_main[256..], &main[256..]);
    write_lengths(writer, previous_length, length);
}
