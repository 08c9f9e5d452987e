//! Core frame types shared across the capture and writer sides

use std::time::Instant;

/// One captured camera image: owned RGB24 pixel data plus capture metadata.
///
/// A frame is immutable once produced and owned by exactly one structure at
/// a time: the capture loop, then a batch, then the writer.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic per-source frame number, assigned by the frame source
    pub sequence: u64,
    /// Interleaved RGB24 pixel bytes, row-major (`width * height * 3` bytes)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// When the frame was captured; drives the recording clock
    pub captured_at: Instant,
}

impl Frame {
    /// Create a frame captured now.
    pub fn new(sequence: u64, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            sequence,
            data,
            width,
            height,
            captured_at: Instant::now(),
        }
    }

    /// Override the capture timestamp.
    pub fn with_captured_at(mut self, captured_at: Instant) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Expected byte length of an RGB24 frame of the given dimensions.
    pub fn rgb24_len(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * 3
    }
}

/// An ordered run of frames handed from the capture side to the writer.
///
/// An empty batch is the end-of-segment sentinel: the writer finalizes the
/// current encoder process when it receives one. Use [`FrameBatch::end_of_segment`]
/// at emission sites so the intent is visible.
#[derive(Debug, Clone, Default)]
pub struct FrameBatch {
    frames: Vec<Frame>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    /// The segment-end sentinel.
    pub fn end_of_segment() -> Self {
        Self::new()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// An empty batch means "this segment's frames are finished".
    pub fn is_end_of_segment(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}
