//! Compression utilities

pub mod lzx;

pub use lzx::{LzxDecoder, WindowSize};

use crate::error::Result;

/// Decompress a single LZX frame with a fresh decoder
///
/// # Errors
/// Returns an error if the window size is unsupported or decompression fails.
pub fn decompress_lzx(data: &[u8], window_bits: u32, decompressed_size: usize) -> Result<Vec<u8>> {
    lzx::decompress(data, window_bits, decompressed_size)
}
