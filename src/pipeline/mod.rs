//! Motion-triggered recording pipeline
//!
//! Two long-lived threads share one queue: the capture loop (producer) reads
//! frames, classifies motion, and decides segment boundaries; the segment
//! writer (consumer) streams each segment into its own encoder process.
//!
//! # Example
//! ```rust,ignore
//! use sentrycam::{FrameDiffClassifier, Pipeline, SentryCamConfig};
//! use sentrycam::camera::CameraSource;
//!
//! let config = SentryCamConfig::load_or_default();
//! let source = CameraSource::open(&config.capture)?;
//! let classifier = FrameDiffClassifier::from_settings(&config.motion);
//!
//! let pipeline = Pipeline::new(&config, source, classifier)?;
//! let stats = pipeline.run(&stop_flag)?;
//! ```

mod capture;
mod encoder;
mod queue;
mod state;
mod writer;

pub use capture::CaptureLoop;
pub use encoder::{encoder_args, EncoderProcess, FfmpegSegmentFactory};
pub use queue::SegmentQueue;
pub use state::{RecordingState, RecordingStateMachine};
pub use writer::{spawn_writer, SegmentSink, SegmentSinkFactory, WriterHandle, WriterReport};

use crate::config::SentryCamConfig;
use crate::errors::RecorderError;
use crate::motion::MotionClassifier;
use crate::source::FrameSource;
use crate::storage;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// How long the writer sleeps between wake-ups while idle. Pushes wake it
/// immediately; this only bounds stop latency and idle status logging.
const WRITER_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Totals reported after a pipeline run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineStats {
    /// Frames read from the source
    pub frames_captured: u64,
    /// Segments the state machine opened
    pub segments_started: u64,
    /// Frames streamed into encoder processes
    pub frames_written: u64,
    /// Segments finalized successfully
    pub segments_completed: u64,
    /// Segments lost to encoder launch/write failures
    pub segments_failed: u64,
}

/// The assembled recording pipeline.
///
/// Construction spawns the writer thread; `run` drives the capture loop on
/// the calling thread and performs the full shutdown sequence: stop capture,
/// flush the final segment boundary, signal the writer, drain, join.
pub struct Pipeline<S: FrameSource, C: MotionClassifier> {
    capture: CaptureLoop<S, C>,
    writer: WriterHandle,
}

impl<S: FrameSource, C: MotionClassifier> Pipeline<S, C> {
    /// Build a pipeline writing segments through the configured encoder.
    pub fn new(
        config: &SentryCamConfig,
        source: S,
        classifier: C,
    ) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::Initialization)?;

        let output_dir = PathBuf::from(&config.storage.output_directory);
        storage::ensure_output_dir(&output_dir)?;

        let factory = FfmpegSegmentFactory::new(
            config.encoder.clone(),
            config.capture.width,
            config.capture.height,
            config.capture.fps,
            output_dir,
        );
        Self::with_sink_factory(config, source, classifier, Box::new(factory))
    }

    /// Build a pipeline with a custom segment sink factory (tests, alternate
    /// encoders).
    pub fn with_sink_factory(
        config: &SentryCamConfig,
        source: S,
        classifier: C,
        factory: Box<dyn SegmentSinkFactory>,
    ) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::Initialization)?;

        let queue = Arc::new(SegmentQueue::new());
        let writer = spawn_writer(queue.clone(), factory, WRITER_POLL_INTERVAL)?;

        let state = RecordingStateMachine::new(config.pre_roll_frames(), config.post_roll());
        let capture = CaptureLoop::new(source, classifier, state, queue);

        Ok(Self { capture, writer })
    }

    /// Whether the writer currently has an encoder process open.
    pub fn is_recording(&self) -> bool {
        self.writer.is_recording()
    }

    /// Run until the stop flag is raised or frame acquisition fails.
    ///
    /// The writer is always drained and joined before returning, even on a
    /// fatal acquisition error, so no in-flight segment is truncated.
    pub fn run(mut self, stop: &AtomicBool) -> Result<PipelineStats, RecorderError> {
        let capture_result = self.capture.run(stop);

        // The capture side has pushed its final segment boundary; now let
        // the writer drain the queue and finalize any open encoder.
        let report = self.writer.join();

        let stats = PipelineStats {
            frames_captured: self.capture.frames_captured(),
            segments_started: self.capture.segments_started(),
            frames_written: report.frames_written,
            segments_completed: report.segments_completed,
            segments_failed: report.segments_failed,
        };

        match capture_result {
            Ok(()) => Ok(stats),
            Err(e) => Err(e),
        }
    }
}
