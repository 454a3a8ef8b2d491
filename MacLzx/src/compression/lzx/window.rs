//! Sliding window and match copy engine
//!
//! The window is a ring buffer of the decoder's window size. Every decoded
//! byte goes through it, and every match reads its source from it.

use crate::error::{Error, Result};

/// The three most recently used match offsets, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecentOffsets {
    r0: u32,
    r1: u32,
    r2: u32,
}

impl Default for RecentOffsets {
    fn default() -> Self {
        Self {
            r0: 1,
            r1: 1,
            r2: 1,
        }
    }
}

impl RecentOffsets {
    pub fn new(r0: u32, r1: u32, r2: u32) -> Self {
        Self { r0, r1, r2 }
    }

    /// Offset held in repeat slot 0, 1 or 2
    pub fn get(&self, slot: usize) -> u32 {
        match slot {
            0 => self.r0,
            1 => self.r1,
            _ => self.r2,
        }
    }

    /// Record that `offset` was just used by a match.
    pub fn promote(&mut self, offset: u32) {
        if offset == self.r0 {
            return;
        }
        if offset == self.r1 {
            std::mem::swap(&mut self.r0, &mut self.r1);
        } else {
            // covers both a hit on R2 and a new offset evicting R2
            self.r2 = self.r1;
            self.r1 = self.r0;
            self.r0 = offset;
        }
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.r0, self.r1, self.r2]
    }
}

/// Ring buffer holding the most recent `size` bytes of output.
pub struct Window {
    buffer: Vec<u8>,
    position: usize,
    total: u64,
}

impl Window {
    /// Create a zeroed window. `size` must be a power of two.
    pub fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            buffer: vec![0; size],
            position: 0,
            total: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Index the next byte will be written to
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes written since the window was created
    pub fn total_written(&self) -> u64 {
        self.total
    }

    fn mask(&self) -> usize {
        self.buffer.len() - 1
    }

    pub fn push(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask();
        self.total += 1;
    }

    /// Append raw bytes, wrapping at the physical end of the buffer.
    pub fn extend(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let chunk = bytes.len().min(self.size() - self.position);
            self.buffer[self.position..self.position + chunk].copy_from_slice(&bytes[..chunk]);
            self.position = (self.position + chunk) & self.mask();
            self.total += chunk as u64;
            bytes = &bytes[chunk..];
        }
    }

    /// Copy `length` bytes starting `offset` bytes back from the write position.
    ///
    /// Offsets shorter than the length repeat the source pattern, exactly as a
    /// byte-at-a-time copy would.
    ///
    /// # Errors
    /// Returns [`Error::CorruptBitstream`] if the offset is zero, larger than
    /// the window, or reaches back before the first byte ever written.
    pub fn copy_match(&mut self, offset: usize, length: usize) -> Result<()> {
        if offset == 0 || offset > self.size() || offset as u64 > self.total {
            return Err(Error::corrupt(format!(
                "match offset {offset} reaches before the start of the stream ({} bytes written)",
                self.total
            )));
        }

        let size = self.size();
        let mask = self.mask();
        let mut src = (self.position + size - offset) & mask;
        let mut remaining = length;

        while remaining > 0 {
            let chunk = remaining.min(size - src).min(size - self.position);
            let dst = self.position;
            if src < dst && dst - src < chunk {
                for i in 0..chunk {
                    self.buffer[dst + i] = self.buffer[src + i];
                }
            } else {
                self.buffer.copy_within(src..src + chunk, dst);
            }
            src = (src + chunk) & mask;
            self.position = (dst + chunk) & mask;
            remaining -= chunk;
        }

        self.total += length as u64;
        Ok(())
    }

    /// The last `len` bytes written, oldest first. `len` must not exceed the window.
    pub fn recent(&self, len: usize) -> Vec<u8> {
        debug_assert!(len <= self.size());
        let start = (self.position + self.size() - len) & self.mask();
        let mut out = Vec::with_capacity(len);
        if start + len <= self.size() {
            out.extend_from_slice(&self.buffer[start..start + len]);
        } else {
            out.extend_from_slice(&self.buffer[start..]);
            out.extend_from_slice(&self.buffer[..len - (self.size() - start)]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::lzx::test_support::apply_match;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repeat_r0_keeps_order() {
        let mut offsets = RecentOffsets::new(10, 20, 30);
        offsets.promote(10);
        assert_eq!(offsets.to_array(), [10, 20, 30]);
    }

    #[test]
    fn test_repeat_r1_swaps_with_r0() {
        let mut offsets = RecentOffsets::new(10, 20, 30);
        offsets.promote(20);
        assert_eq!(offsets.to_array(), [20, 10, 30]);
    }

    #[test]
    fn test_repeat_r2_rotates_to_front() {
        let mut offsets = RecentOffsets::new(10, 20, 30);
        offsets.promote(30);
        assert_eq!(offsets.to_array(), [30, 10, 20]);
    }

    #[test]
    fn test_new_offset_evicts_r2() {
        let mut offsets = RecentOffsets::new(10, 20, 30);
        offsets.promote(99);
        assert_eq!(offsets.to_array(), [99, 10, 20]);
        assert_eq!(RecentOffsets::default().to_array(), [1, 1, 1]);
    }

    #[test]
    fn test_overlapping_copy_repeats_pattern() {
        let mut window = Window::new(32);
        window.extend(b"ab");
        window.copy_match(2, 7).unwrap();
        assert_eq!(window.recent(9), b"ababababa".to_vec());
    }

    #[test]
    fn test_copy_across_buffer_end_matches_linear_history() {
        let history: Vec<u8> = (0u8..14).map(|i| i * 3 + 1).collect();
        let mut window = Window::new(16);
        window.extend(&history);

        let mut expected = history.clone();
        // destination wraps, source does not
        window.copy_match(5, 7).unwrap();
        apply_match(&mut expected, 5, 7);
        // source wraps too, and the copy overlaps itself
        window.copy_match(3, 9).unwrap();
        apply_match(&mut expected, 3, 9);
        // long offset whose source starts after the write position
        window.copy_match(15, 6).unwrap();
        apply_match(&mut expected, 15, 6);

        assert_eq!(window.total_written(), expected.len() as u64);
        assert_eq!(window.recent(16), expected[expected.len() - 16..].to_vec());
    }

    #[test]
    fn test_extend_wraps() {
        let mut window = Window::new(16);
        window.extend(&[9; 10]);
        window.extend(&(0u8..12).collect::<Vec<_>>());
        assert_eq!(window.position(), 6);
        assert_eq!(window.recent(12), (0u8..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_offset_before_stream_start_fails() {
        let mut window = Window::new(16);
        window.extend(b"abc");
        assert!(matches!(window.copy_match(4, 1), Err(Error::CorruptBitstream { .. })));
        assert!(matches!(window.copy_match(0, 1), Err(Error::CorruptBitstream { .. })));
        window.extend(&[0; 20]);
        assert!(matches!(window.copy_match(17, 1), Err(Error::CorruptBitstream { .. })));
    }
}
