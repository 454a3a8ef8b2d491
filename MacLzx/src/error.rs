//! Error types for `MacLzx`

use thiserror::Error;

/// The error type for `MacLzx` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error while reading a frame from a source or writing it to a sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Construction Errors ====================
    /// The requested window is not one of the LZX window sizes.
    #[error("unsupported LZX window size: 2^{bits} bytes (supported: 2^15 to 2^21)")]
    UnsupportedWindowSizeRange {
        /// The requested window size as a power of two.
        bits: u32,
    },

    // ==================== Bitstream Errors ====================
    /// A block header named a type other than verbatim, aligned or uncompressed.
    #[error("invalid LZX block type: {block_type}")]
    InvalidBlockType {
        /// The 3-bit block type read from the stream.
        block_type: u32,
    },

    /// A set of code lengths does not describe a usable prefix code.
    #[error("invalid Huffman table for the {tree} tree")]
    InvalidHuffmanTable {
        /// Which of the four trees was being built or decoded.
        tree: &'static str,
    },

    /// The bitstream is internally inconsistent.
    #[error("corrupt LZX bitstream: {message}")]
    CorruptBitstream {
        /// Description of the inconsistency.
        message: String,
    },

    /// The frame's input ran out before the requested output was produced.
    #[error("unexpected end of LZX input")]
    UnexpectedEndOfInput,

    // ==================== Decoder Usage Errors ====================
    /// A single frame cannot produce more bytes than the window holds.
    #[error("frame of {size} bytes does not fit in a {window} byte window")]
    FrameTooLarge {
        /// Requested frame output size.
        size: usize,
        /// Window size in bytes.
        window: usize,
    },

    /// A previous call failed, so the decoder state can no longer be trusted.
    #[error("LZX decoder is unusable after an earlier error")]
    DecoderPoisoned,
}

impl Error {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Error::CorruptBitstream {
            message: message.into(),
        }
    }
}

/// A specialized Result type for `MacLzx` operations.
pub type Result<T> = std::result::Result<T, Error>;
