//! Batch LZX decompression
//!
//! Frames of one stream depend on each other and must be decoded in order by a
//! single decoder, but separate streams share nothing. This module decodes
//! whole streams and runs many of them in parallel.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use super::LzxDecoder;
use crate::error::Result;

/// One frame of compressed input and the size it expands to
#[derive(Debug, Clone, Copy)]
pub struct LzxFrame<'a> {
    pub data: &'a [u8],
    pub output_len: usize,
}

/// An independently compressed stream, as located by a container reader
#[derive(Debug, Clone)]
pub struct LzxStream<'a> {
    /// Name used in progress reports and result messages
    pub name: String,
    pub window_bits: u32,
    pub frames: Vec<LzxFrame<'a>>,
}

impl LzxStream<'_> {
    /// Total decompressed size of all frames
    pub fn output_len(&self) -> usize {
        self.frames.iter().map(|frame| frame.output_len).sum()
    }
}

/// Result of a batch decompression
#[derive(Debug)]
pub struct BatchDecompressResult {
    /// Number of streams decoded successfully
    pub success_count: usize,
    /// Number of streams that failed
    pub fail_count: usize,
    /// Decoded data or the error, in the same order as the input streams
    pub outputs: Vec<Result<Vec<u8>>>,
    /// Messages for each stream processed
    pub results: Vec<String>,
}

/// Decode every frame of a stream in order with a fresh decoder.
///
/// # Errors
/// Returns the first error any frame produces.
pub fn decompress_stream(stream: &LzxStream<'_>) -> Result<Vec<u8>> {
    let mut decoder = LzxDecoder::new(stream.window_bits)?;
    let mut output = Vec::with_capacity(stream.output_len());

    for frame in &stream.frames {
        let data = decoder.decompress(frame.data, frame.output_len)?;
        output.extend_from_slice(&data);
    }

    Ok(output)
}

/// Decompress many streams in parallel.
///
/// # Arguments
/// * `streams` - Streams to decode; each gets its own decoder
/// * `progress` - Called with (current, total, stream name) as each stream starts
///
/// # Returns
/// Summary of the batch, with one output per stream.
pub fn decompress_batch<F>(streams: &[LzxStream<'_>], progress: F) -> BatchDecompressResult
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = streams.len();

    let (outputs, results): (Vec<_>, Vec<_>) = streams
        .par_iter()
        .map(|stream| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(current, total, &stream.name);

            match decompress_stream(stream) {
                Ok(data) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    let message = format!("Decompressed {} ({} bytes)", stream.name, data.len());
                    (Ok(data), message)
                }
                Err(e) => {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!("Failed to decompress {}: {}", stream.name, e);
                    let message = format!("Failed {}: {e}", stream.name);
                    (Err(e), message)
                }
            }
        })
        .unzip();

    BatchDecompressResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        outputs,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn uncompressed_frame(text: &[u8]) -> Vec<u8> {
        assert!(text.len() < 256);
        // intel flag 0, block type 3, length, then 4 bits of alignment padding
        let header: u32 = (0b0011 << 28) | ((text.len() as u32) << 4);
        let high = (header >> 16) as u16;
        let low = header as u16;

        let mut frame = Vec::new();
        frame.extend_from_slice(&high.to_le_bytes());
        frame.extend_from_slice(&low.to_le_bytes());
        for _ in 0..3 {
            frame.extend_from_slice(&1u32.to_le_bytes());
        }
        frame.extend_from_slice(text);
        frame
    }

    #[test]
    fn test_stream_concatenates_frames() {
        let first = uncompressed_frame(b"lzx ");
        // later frames continue the same block
        let stream = LzxStream {
            name: "one".to_string(),
            window_bits: 15,
            frames: vec![
                LzxFrame {
                    data: &first,
                    output_len: 2,
                },
                LzxFrame {
                    data: &first[18..],
                    output_len: 2,
                },
            ],
        };
        assert_eq!(stream.output_len(), 4);
        assert_eq!(decompress_stream(&stream).unwrap(), b"lzx ".to_vec());
    }

    #[test]
    fn test_batch_counts_failures() {
        let good = uncompressed_frame(b"frame data");
        let bad = vec![0xFF; 8];
        let streams = vec![
            LzxStream {
                name: "good".to_string(),
                window_bits: 16,
                frames: vec![LzxFrame {
                    data: &good,
                    output_len: 10,
                }],
            },
            LzxStream {
                name: "bad".to_string(),
                window_bits: 16,
                frames: vec![LzxFrame {
                    data: &bad,
                    output_len: 10,
                }],
            },
            LzxStream {
                name: "window".to_string(),
                window_bits: 30,
                frames: vec![LzxFrame {
                    data: &good,
                    output_len: 10,
                }],
            },
        ];

        let seen = AtomicUsize::new(0);
        let result = decompress_batch(&streams, |_, total, _| {
            assert_eq!(total, 3);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.fail_count, 2);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.outputs[0].as_ref().unwrap(), &b"frame data".to_vec());
        assert!(result.outputs[1].is_err());
        assert!(matches!(
            result.outputs[2],
            Err(Error::UnsupportedWindowSizeRange { bits: 30 })
        ));
    }
}
