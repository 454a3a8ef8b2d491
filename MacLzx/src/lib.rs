//! # MacLzx
//!
//! A pure-Rust decoder for the LZX compression format used inside archive and
//! resource-bundle containers.
//!
//! ## Features
//!
//! - **Frame decoding** - Verbatim, aligned offset and uncompressed blocks
//! - **Window sizes** - Every LZX window from 32 KB (`2^15`) to 2 MB (`2^21`)
//! - **Intel E8 translation** - Call displacements restored on output
//! - **Batch decoding** - Independent streams decoded in parallel
//!
//! ## Quick Start
//!
//! ### Decoding a Stream
//!
//! The container reader locates each compressed frame and knows its
//! decompressed size. Frames of one stream go through one decoder, in order:
//!
//! ```no_run
//! use maclzx::compression::lzx::LzxDecoder;
//!
//! # let frames: Vec<(Vec<u8>, usize)> = Vec::new();
//! let mut decoder = LzxDecoder::new(17)?;
//! let mut output = Vec::new();
//! for (compressed, size) in &frames {
//!     output.extend(decoder.decompress(compressed, *size)?);
//! }
//! # Ok::<(), maclzx::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use maclzx::prelude::*;
//!
//! // Now you have access to:
//! // - LzxDecoder, WindowSize, RecentOffsets
//! // - LzxStream, LzxFrame, decompress_batch
//! // - Error, Result
//! ```

pub mod compression;
pub mod error;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::compression::lzx::{
        BatchDecompressResult, BlockType, LzxDecoder, LzxFrame, LzxStream, RecentOffsets,
        WindowSize, decompress_batch, decompress_stream,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
