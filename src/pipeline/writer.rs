//! Consumer side: drains the queue and streams segments into encoder sinks

use crate::errors::RecorderError;
use crate::pipeline::queue::SegmentQueue;
use crate::types::Frame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One open encoder accepting a segment's raw frame stream in capture order.
pub trait SegmentSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecorderError>;

    /// Finalize the segment (close the stream, let the encoder flush).
    fn finish(self: Box<Self>) -> Result<(), RecorderError>;
}

/// Opens one sink per segment. Holds output dimensions, frame rate, and
/// whatever it needs to generate a fresh output path per open.
pub trait SegmentSinkFactory: Send {
    fn open(&mut self) -> Result<Box<dyn SegmentSink>, RecorderError>;
}

/// Counters and status shared between the writer thread and its handle.
struct WriterShared {
    stop: AtomicBool,
    recording: AtomicBool,
    frames_written: AtomicU64,
    segments_completed: AtomicU64,
    segments_failed: AtomicU64,
}

/// What the writer thread accomplished, reported at join time.
#[derive(Debug, Clone, Copy)]
pub struct WriterReport {
    pub frames_written: u64,
    pub segments_completed: u64,
    pub segments_failed: u64,
}

/// Handle to the running writer thread.
///
/// `stop` only raises the flag; the thread keeps draining until the queue is
/// empty and no encoder is open, so no in-flight segment is truncated.
pub struct WriterHandle {
    shared: Arc<WriterShared>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl WriterHandle {
    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Relaxed);
    }

    /// Signal stop and wait for the drain to complete.
    pub fn join(mut self) -> WriterReport {
        self.stop();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Writer thread panicked");
            }
        }
        WriterReport {
            frames_written: self.shared.frames_written.load(Ordering::Relaxed),
            segments_completed: self.shared.segments_completed.load(Ordering::Relaxed),
            segments_failed: self.shared.segments_failed.load(Ordering::Relaxed),
        }
    }
}

/// Spawn the writer thread.
///
/// `poll_interval` bounds how long the thread sleeps between wake-ups while
/// idle; pushes wake it immediately, so the interval only affects stop-flag
/// latency and the cadence of the idle status logs.
pub fn spawn_writer(
    queue: Arc<SegmentQueue>,
    factory: Box<dyn SegmentSinkFactory>,
    poll_interval: Duration,
) -> Result<WriterHandle, RecorderError> {
    let shared = Arc::new(WriterShared {
        stop: AtomicBool::new(false),
        recording: AtomicBool::new(false),
        frames_written: AtomicU64::new(0),
        segments_completed: AtomicU64::new(0),
        segments_failed: AtomicU64::new(0),
    });

    let thread_shared = shared.clone();
    let thread = std::thread::Builder::new()
        .name("sentrycam-writer".to_string())
        .spawn(move || writer_loop(queue, factory, poll_interval, thread_shared))
        .map_err(|e| RecorderError::Initialization(format!("Failed to spawn writer: {}", e)))?;

    Ok(WriterHandle {
        shared,
        thread: Some(thread),
    })
}

fn writer_loop(
    queue: Arc<SegmentQueue>,
    mut factory: Box<dyn SegmentSinkFactory>,
    poll_interval: Duration,
    shared: Arc<WriterShared>,
) {
    let mut sink: Option<Box<dyn SegmentSink>> = None;
    // Encoder gone for the current segment; its remaining batches are dropped
    // until the sentinel arrives.
    let mut discard_segment = false;

    loop {
        if shared.stop.load(Ordering::Relaxed) && queue.is_empty() && sink.is_none() {
            break;
        }

        let batch = match queue.pop_timeout(poll_interval) {
            Some(batch) => batch,
            None => {
                if shared.recording.load(Ordering::Relaxed) {
                    log::debug!("Waiting for frames to pipe to the encoder");
                } else {
                    log::debug!("Waiting for a segment to start");
                }
                continue;
            }
        };

        if batch.is_end_of_segment() {
            discard_segment = false;
            if let Some(open) = sink.take() {
                shared.recording.store(false, Ordering::Relaxed);
                match open.finish() {
                    Ok(()) => {
                        shared.segments_completed.fetch_add(1, Ordering::Relaxed);
                        log::info!("Segment finalized");
                    }
                    Err(e) => {
                        shared.segments_failed.fetch_add(1, Ordering::Relaxed);
                        log::warn!("Segment finalize failed: {}", e);
                    }
                }
            }
            continue;
        }

        if discard_segment {
            continue;
        }

        let mut open = match sink.take() {
            Some(open) => open,
            None => match factory.open() {
                Ok(open) => {
                    shared.recording.store(true, Ordering::Relaxed);
                    open
                }
                Err(e) => {
                    log::error!("Failed to launch encoder, dropping segment: {}", e);
                    shared.segments_failed.fetch_add(1, Ordering::Relaxed);
                    discard_segment = true;
                    continue;
                }
            },
        };

        let mut write_failed = false;
        for frame in batch.frames() {
            if let Err(e) = open.write_frame(frame) {
                log::error!("Encoder write failed, abandoning segment: {}", e);
                write_failed = true;
                break;
            }
            shared.frames_written.fetch_add(1, Ordering::Relaxed);
        }

        if write_failed {
            shared.recording.store(false, Ordering::Relaxed);
            shared.segments_failed.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = open.finish() {
                log::warn!("Closing failed encoder: {}", e);
            }
            discard_segment = true;
        } else {
            sink = Some(open);
        }
    }
}
