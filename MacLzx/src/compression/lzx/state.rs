//! Decoder state that persists from one frame to the next

use super::constants::{BlockType, WindowSize};
use super::huffman::{AlignedTree, LengthTree, MainTree, PreTree};
use super::intel::IntelTransform;
use super::window::{RecentOffsets, Window};

/// Everything a frame decode reads and updates.
///
/// Trees keep their code lengths between blocks because each block only sends
/// deltas against them.
pub struct DecoderState {
    pub offsets: RecentOffsets,
    pub main_elements: usize,
    /// Set once the one-time stream header (Intel flag and file size) is read
    pub header_read: bool,
    /// `None` until the first block header
    pub block_type: Option<BlockType>,
    pub block_length: u32,
    pub block_remaining: u32,
    pub frames_read: u32,
    pub intel: IntelTransform,
    pub pretree: PreTree,
    pub main_tree: MainTree,
    pub length_tree: LengthTree,
    pub aligned_tree: AlignedTree,
    pub window: Window,
}

impl DecoderState {
    pub fn new(window_size: WindowSize) -> Self {
        Self {
            offsets: RecentOffsets::default(),
            main_elements: window_size.main_elements(),
            header_read: false,
            block_type: None,
            block_length: 0,
            block_remaining: 0,
            frames_read: 0,
            intel: IntelTransform::new(),
            pretree: PreTree::new("pretree"),
            main_tree: MainTree::new("main"),
            length_tree: LengthTree::new("length"),
            aligned_tree: AlignedTree::new("aligned"),
            window: Window::new(window_size.bytes()),
        }
    }
}
