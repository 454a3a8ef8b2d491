//! Bit-level reader over a single LZX frame
//!
//! LZX packs its bitstream into 16-bit little-endian words and hands bits out
//! most-significant first. The reader keeps up to 32 bits in an accumulator whose
//! top bit is the next bit of the stream.
//!
//! A Huffman lookup always peeks 16 bits even when the final code of a frame is
//! shorter, so once the input is exhausted the reader appends a single word of
//! zero padding. Padding can be peeked but never consumed. A lone trailing byte
//! is an incomplete word and counts as that padding word.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Widest single read the decoder performs (17 extra offset bits)
const MAX_READ_BITS: u32 = 17;

pub struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    buffer: u32,
    bits_left: u32,
    padding: u32,
    last_word_bytes: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            buffer: 0,
            bits_left: 0,
            padding: 0,
            last_word_bytes: 0,
        }
    }

    /// Byte offset of the next unread input word
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of buffered bits backed by real input
    pub fn bits_available(&self) -> u32 {
        self.bits_left - self.padding
    }

    /// Make sure at least `n` bits are buffered.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] if satisfying the request would need
    /// more than one word of padding past the end of the input.
    pub fn ensure(&mut self, n: u32) -> Result<()> {
        debug_assert!(n <= MAX_READ_BITS);
        while self.bits_left < n {
            let word = match self.input.get(self.pos..) {
                Some([lo, hi, ..]) => {
                    self.last_word_bytes = 2;
                    u16::from_le_bytes([*lo, *hi])
                }
                Some([lo]) => {
                    self.last_word_bytes = 1;
                    self.padding += 16;
                    u16::from(*lo)
                }
                _ => {
                    if self.padding > 0 {
                        return Err(Error::UnexpectedEndOfInput);
                    }
                    self.last_word_bytes = 0;
                    self.padding += 16;
                    0
                }
            };
            self.pos += self.last_word_bytes;
            self.buffer |= u32::from(word) << (16 - self.bits_left);
            self.bits_left += 16;
        }
        Ok(())
    }

    /// Look at the next `n` bits without consuming them. Requires a prior `ensure(n)`.
    pub fn peek(&self, n: u32) -> u32 {
        debug_assert!(n <= self.bits_left);
        if n == 0 { 0 } else { self.buffer >> (32 - n) }
    }

    /// Drop `n` already-buffered bits.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] if any of those bits are padding.
    pub fn consume(&mut self, n: u32) -> Result<()> {
        if n > self.bits_available() {
            return Err(Error::UnexpectedEndOfInput);
        }
        self.buffer = if n >= 32 { 0 } else { self.buffer << n };
        self.bits_left -= n;
        Ok(())
    }

    /// Read an `n`-bit value, most significant bit first.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] if the frame has fewer than `n` bits left.
    pub fn read(&mut self, n: u32) -> Result<u32> {
        if n == 0 {
            return Ok(0);
        }
        self.ensure(n)?;
        let value = self.peek(n);
        self.consume(n)?;
        Ok(value)
    }

    /// Drop the 1 to 16 pad bits that separate an uncompressed block header
    /// from its raw payload, leaving the reader on a byte boundary.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] if the payload would start past the input.
    pub fn align_for_raw(&mut self) -> Result<()> {
        self.ensure(16)?;
        if self.bits_left > 16 {
            // the most recent word was never touched; hand it back
            self.pos -= self.last_word_bytes;
        } else if self.padding > 0 {
            return Err(Error::UnexpectedEndOfInput);
        }
        self.reset();
        Ok(())
    }

    /// Discard any buffered bits so the next bit read starts at the current byte.
    pub fn reset(&mut self) {
        self.buffer = 0;
        self.bits_left = 0;
        self.padding = 0;
        self.last_word_bytes = 0;
    }

    /// Read a raw little-endian `u32` at the current byte position.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] past the end of the input.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    /// Borrow `len` raw bytes at the current byte position.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] past the end of the input.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        debug_assert_eq!(self.bits_left, 0, "raw reads need an aligned reader");
        let end = self.pos.checked_add(len).ok_or(Error::UnexpectedEndOfInput)?;
        let bytes = self
            .input
            .get(self.pos..end)
            .ok_or(Error::UnexpectedEndOfInput)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Skip one raw byte (the pad after an odd-length uncompressed block).
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEndOfInput`] past the end of the input.
    pub fn skip_byte(&mut self) -> Result<()> {
        self.read_bytes(1).map(|_| ())
    }
}
