//! LZX decompression
//!
//! LZX combines LZ77 back-references with canonical Huffman coding over a
//! sliding window of 32 KB to 2 MB. Compressed data arrives as frames: the
//! caller knows where each frame's input starts and ends and how many bytes it
//! expands to, and feeds frames to one [`LzxDecoder`] in order. Later frames may
//! reference bytes produced by earlier ones, so a decoder must see every frame
//! of a stream.
//!
//! ```
//! use maclzx::compression::lzx::LzxDecoder;
//!
//! // A single uncompressed block holding "Hello, LZX!"
//! let mut frame = vec![0x00, 0x30, 0xB0, 0x00];
//! frame.extend_from_slice(&[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
//! frame.extend_from_slice(b"Hello, LZX!");
//!
//! let mut decoder = LzxDecoder::new(16)?;
//! let output = decoder.decompress(&frame, 11)?;
//! assert_eq!(output, b"Hello, LZX!");
//! # Ok::<(), maclzx::Error>(())
//! ```

pub mod batch;
pub mod bit_reader;
mod block;
pub mod constants;
pub mod huffman;
pub mod intel;
mod lengths;
mod state;
pub mod window;

#[cfg(test)]
mod test_support;

use std::io::{Read, Write};

use crate::error::{Error, Result};
use bit_reader::BitReader;
use state::DecoderState;

pub use batch::{BatchDecompressResult, LzxFrame, LzxStream, decompress_batch, decompress_stream};
pub use constants::{BlockType, WindowSize};
pub use window::RecentOffsets;

/// Stateful LZX decoder for one compressed stream.
///
/// Every call to [`decompress`](Self::decompress) decodes one frame. The
/// window, the repeat offsets, the Huffman code lengths and the Intel
/// transform position carry over to the next call.
///
/// A decoder that has returned a bitstream error is poisoned: its state is
/// no longer trustworthy and every later call returns
/// [`Error::DecoderPoisoned`].
pub struct LzxDecoder {
    state: DecoderState,
    window: WindowSize,
    poisoned: bool,
}

impl LzxDecoder {
    /// Create a decoder for a window of `2^window_bits` bytes.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedWindowSizeRange`] unless `window_bits` is
    /// between 15 and 21.
    pub fn new(window_bits: u32) -> Result<Self> {
        let bits = u8::try_from(window_bits)
            .map_err(|_| Error::UnsupportedWindowSizeRange { bits: window_bits })?;
        Ok(Self::with_window(WindowSize::from_bits(bits)?))
    }

    /// Create a decoder for an already validated window size.
    pub fn with_window(window: WindowSize) -> Self {
        Self {
            state: DecoderState::new(window),
            window,
            poisoned: false,
        }
    }

    /// Decode the next frame.
    ///
    /// `input` is exactly the frame's compressed bytes and `output_len` the
    /// number of bytes it expands to. A zero-length frame returns an empty
    /// buffer without reading any input.
    ///
    /// # Errors
    /// Returns [`Error::FrameTooLarge`] if `output_len` exceeds the window,
    /// [`Error::DecoderPoisoned`] after an earlier failure, or the bitstream
    /// error that stopped decoding.
    pub fn decompress(&mut self, input: &[u8], output_len: usize) -> Result<Vec<u8>> {
        if self.poisoned {
            return Err(Error::DecoderPoisoned);
        }
        if output_len > self.window.bytes() {
            return Err(Error::FrameTooLarge {
                size: output_len,
                window: self.window.bytes(),
            });
        }
        if output_len == 0 {
            return Ok(Vec::new());
        }

        let mut reader = BitReader::new(input);
        if let Err(e) = block::decode_frame(&mut self.state, &mut reader, output_len) {
            self.poisoned = true;
            tracing::warn!(
                "LZX frame {} failed after {} of {} input bytes: {}",
                self.state.frames_read,
                reader.position(),
                input.len(),
                e
            );
            return Err(e);
        }

        let mut output = self.state.window.recent(output_len);
        self.state.intel.apply(&mut output, self.state.frames_read);
        self.state.frames_read = self.state.frames_read.saturating_add(1);

        tracing::trace!(
            "LZX frame {}: {} -> {} bytes",
            self.state.frames_read,
            input.len(),
            output_len
        );
        Ok(output)
    }

    /// Read `input_len` compressed bytes from `reader` and decode them as the next frame.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the frame cannot be read; the decoder is left
    /// untouched in that case. Otherwise as [`decompress`](Self::decompress).
    pub fn decompress_from<R: Read>(
        &mut self,
        mut reader: R,
        input_len: usize,
        output_len: usize,
    ) -> Result<Vec<u8>> {
        let mut input = vec![0u8; input_len];
        reader.read_exact(&mut input)?;
        self.decompress(&input, output_len)
    }

    /// Decode the next frame and write its output to `writer`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if writing fails, otherwise as
    /// [`decompress`](Self::decompress).
    pub fn decompress_to<W: Write>(
        &mut self,
        input: &[u8],
        mut writer: W,
        output_len: usize,
    ) -> Result<usize> {
        let output = self.decompress(input, output_len)?;
        writer.write_all(&output)?;
        Ok(output.len())
    }

    /// Window size in bytes
    pub fn window_size(&self) -> usize {
        self.window.bytes()
    }

    pub fn window_bits(&self) -> u8 {
        self.window.bits()
    }

    /// Current R0, R1 and R2
    pub fn recent_offsets(&self) -> RecentOffsets {
        self.state.offsets
    }

    /// Frames decoded successfully so far
    pub fn frames_read(&self) -> u32 {
        self.state.frames_read
    }

    /// Bytes produced since the decoder was created
    pub fn total_output(&self) -> u64 {
        self.state.window.total_written()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

/// Decompress a stream made of a single frame.
///
/// # Errors
/// Returns an error if the window size is unsupported or decoding fails.
pub fn decompress(compressed: &[u8], window_bits: u32, output_size: usize) -> Result<Vec<u8>> {
    LzxDecoder::new(window_bits)?.decompress(compressed, output_size)
}
