//! Intel E8 call-transform reversal
//!
//! Before compression the encoder rewrites the 32-bit displacement after every
//! x86 `call` opcode (0xE8) from relative to absolute, which makes repeated calls
//! to the same function compress as identical byte runs. The decoder undoes that
//! on each frame's output copy; the window itself always keeps the untranslated
//! bytes.

use byteorder::{ByteOrder, LittleEndian};

use super::constants::{INTEL_CALL_OPCODE, INTEL_MAX_FRAMES};

/// Bytes at the end of every frame that are never inspected as an opcode
const UNSCANNED_TAIL: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct IntelTransform {
    file_size: u32,
    current_position: i64,
    started: bool,
}

impl IntelTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translation size from the stream header; 0 disables the transform.
    pub fn set_file_size(&mut self, file_size: u32) {
        self.file_size = file_size;
    }

    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    /// Mark that the stream may contain translated calls.
    pub fn arm(&mut self) {
        self.started = true;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Output position at which the next frame starts
    pub fn current_position(&self) -> i64 {
        self.current_position
    }

    /// Undo the transform on one frame of output.
    ///
    /// `frame_index` is the zero-based index of the frame; only the first
    /// 32768 frames are translated. The running position always advances by
    /// the frame length, whether or not anything was rewritten.
    pub fn apply(&mut self, data: &mut [u8], frame_index: u32) {
        let len = data.len();
        let active = self.started
            && self.file_size != 0
            && frame_index < INTEL_MAX_FRAMES
            && len > UNSCANNED_TAIL;

        if active {
            let file_size = i64::from(self.file_size);
            let mut position = self.current_position;
            let mut i = 0;

            while i < len - UNSCANNED_TAIL {
                if data[i] != INTEL_CALL_OPCODE {
                    i += 1;
                    position += 1;
                    continue;
                }

                let displacement = &mut data[i + 1..i + 5];
                let absolute = i64::from(LittleEndian::read_i32(displacement));
                if absolute >= -position && absolute < file_size {
                    let relative = if absolute >= 0 {
                        absolute - position
                    } else {
                        absolute + file_size
                    };
                    LittleEndian::write_i32(displacement, relative as i32);
                }

                i += 5;
                position += 5;
            }
        }

        self.current_position += len as i64;
    }
}
