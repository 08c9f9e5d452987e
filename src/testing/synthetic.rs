//! Deterministic stand-ins for the camera, classifier, and encoder

use crate::errors::RecorderError;
use crate::motion::MotionClassifier;
use crate::pipeline::{SegmentSink, SegmentSinkFactory};
use crate::source::FrameSource;
use crate::types::Frame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Create a synthetic RGB24 frame with a gradient that varies per frame,
/// captured now.
pub fn synthetic_frame(sequence: u64, width: u32, height: u32) -> Frame {
    let mut data = vec![0u8; Frame::rgb24_len(width, height)];

    let base = (sequence % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    Frame::new(sequence, data, width, height)
}

/// Frame source that replays a prepared list of frames.
///
/// When the script runs out it either raises the provided stop flag while
/// still pretending the device stalled (clean-shutdown tests), or fails the
/// read outright (fatal-error tests).
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
    stop_when_exhausted: Option<Arc<AtomicBool>>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            stop_when_exhausted: None,
        }
    }

    /// Raise `stop` after the last scripted frame is delivered, so the
    /// capture loop exits cleanly instead of hitting a read error.
    pub fn stop_when_exhausted(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop_when_exhausted = Some(stop);
        self
    }
}

impl FrameSource for ScriptedSource {
    fn read(&mut self) -> Result<Frame, RecorderError> {
        match self.frames.pop_front() {
            Some(frame) => {
                if self.frames.is_empty() {
                    if let Some(stop) = &self.stop_when_exhausted {
                        stop.store(true, Ordering::Relaxed);
                    }
                }
                Ok(frame)
            }
            None => Err(RecorderError::Acquisition(
                "Frame script exhausted".to_string(),
            )),
        }
    }
}

/// Classifier that replays a prepared list of verdicts (false once drained).
pub struct ScriptedClassifier {
    verdicts: VecDeque<bool>,
}

impl ScriptedClassifier {
    pub fn new(verdicts: Vec<bool>) -> Self {
        Self {
            verdicts: verdicts.into(),
        }
    }
}

impl MotionClassifier for ScriptedClassifier {
    fn detect(&mut self, _frame: &Frame) -> bool {
        self.verdicts.pop_front().unwrap_or(false)
    }
}

/// What one in-memory "encoder" received.
#[derive(Debug, Clone, Default)]
pub struct MemorySegment {
    /// Sequence numbers of the frames written, in write order
    pub sequences: Vec<u64>,
    /// Total pixel bytes written
    pub bytes: usize,
    /// Whether the sink was closed (finalize after a sentinel, or the
    /// writer closing an abandoned segment)
    pub closed: bool,
}

struct MemoryShared {
    segments: Mutex<Vec<MemorySegment>>,
    fail_opens_remaining: Mutex<u32>,
    fail_write_after: Mutex<Option<u64>>,
}

/// Sink factory recording every segment in memory.
///
/// `fail_next_opens(n)` makes the next `n` opens fail with an encoder launch
/// error; `fail_write_after(n)` makes one sink fail its write once it has
/// accepted `n` frames (the trigger is consumed, later sinks are unaffected).
#[derive(Clone)]
pub struct MemorySegmentFactory {
    shared: Arc<MemoryShared>,
}

impl MemorySegmentFactory {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(MemoryShared {
                segments: Mutex::new(Vec::new()),
                fail_opens_remaining: Mutex::new(0),
                fail_write_after: Mutex::new(None),
            }),
        }
    }

    pub fn fail_next_opens(&self, n: u32) {
        *self.shared.fail_opens_remaining.lock().expect("lock poisoned") = n;
    }

    pub fn fail_write_after(&self, frames: u64) {
        *self.shared.fail_write_after.lock().expect("lock poisoned") = Some(frames);
    }

    /// Snapshot of all segments recorded so far.
    pub fn segments(&self) -> Vec<MemorySegment> {
        self.shared.segments.lock().expect("lock poisoned").clone()
    }
}

impl Default for MemorySegmentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentSinkFactory for MemorySegmentFactory {
    fn open(&mut self) -> Result<Box<dyn SegmentSink>, RecorderError> {
        {
            let mut remaining = self.shared.fail_opens_remaining.lock().expect("lock poisoned");
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RecorderError::EncoderLaunch(
                    "Scripted launch failure".to_string(),
                ));
            }
        }

        let index = {
            let mut segments = self.shared.segments.lock().expect("lock poisoned");
            segments.push(MemorySegment::default());
            segments.len() - 1
        };

        Ok(Box::new(MemorySink {
            shared: self.shared.clone(),
            index,
            written: 0,
        }))
    }
}

struct MemorySink {
    shared: Arc<MemoryShared>,
    index: usize,
    written: u64,
}

impl SegmentSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecorderError> {
        {
            let mut limit = self.shared.fail_write_after.lock().expect("lock poisoned");
            if limit.is_some_and(|n| self.written >= n) {
                *limit = None;
                return Err(RecorderError::EncoderWrite(
                    "Scripted write failure".to_string(),
                ));
            }
        }

        let mut segments = self.shared.segments.lock().expect("lock poisoned");
        let segment = &mut segments[self.index];
        segment.sequences.push(frame.sequence);
        segment.bytes += frame.data.len();
        self.written += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), RecorderError> {
        let mut segments = self.shared.segments.lock().expect("lock poisoned");
        segments[self.index].closed = true;
        Ok(())
    }
}
