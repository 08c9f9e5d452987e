//! Capture-side producer: frame source → classifier → state machine → queue

use crate::errors::RecorderError;
use crate::motion::MotionClassifier;
use crate::pipeline::queue::SegmentQueue;
use crate::pipeline::state::{RecordingState, RecordingStateMachine};
use crate::source::FrameSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Drives the pipeline at the camera's frame rate.
///
/// Each tick reads one frame, classifies it, feeds the state machine, and
/// enqueues whatever batches fall out. The loop ends when the stop flag is
/// raised or the source fails; either way the state machine is flushed so an
/// open segment is sentinel-terminated before the queue is handed over to
/// the draining writer.
pub struct CaptureLoop<S: FrameSource, C: MotionClassifier> {
    source: S,
    classifier: C,
    state: RecordingStateMachine,
    queue: Arc<SegmentQueue>,
    frames_captured: u64,
}

impl<S: FrameSource, C: MotionClassifier> CaptureLoop<S, C> {
    pub fn new(
        source: S,
        classifier: C,
        state: RecordingStateMachine,
        queue: Arc<SegmentQueue>,
    ) -> Self {
        Self {
            source,
            classifier,
            state,
            queue,
            frames_captured: 0,
        }
    }

    /// Run until the stop flag is raised or the source fails.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), RecorderError> {
        let result = self.pump(stop);

        for batch in self.state.finish() {
            self.queue.push(batch);
        }
        self.source.close();

        if let Err(e) = &result {
            log::error!("Capture stopped on acquisition failure: {}", e);
        }
        result
    }

    fn pump(&mut self, stop: &AtomicBool) -> Result<(), RecorderError> {
        while !stop.load(Ordering::Relaxed) {
            let frame = self.source.read()?;
            self.frames_captured += 1;

            let motion = self.classifier.detect(&frame);
            let before = self.state.state();
            for batch in self.state.tick(frame, motion) {
                self.queue.push(batch);
            }

            match (before, self.state.state()) {
                (RecordingState::Idle, RecordingState::Recording) => {
                    log::info!(
                        "Motion detected, segment {} started",
                        self.state.segments_started()
                    );
                }
                (RecordingState::Recording, RecordingState::Idle) => {
                    log::info!("Motion ceased, segment closed");
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    pub fn segments_started(&self) -> u64 {
        self.state.segments_started()
    }
}
