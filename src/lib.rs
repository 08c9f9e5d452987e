//! SentryCam: motion-triggered video recording for embedded and edge devices
//!
//! This crate records motion events from an attached camera as timestamped
//! video segments, including lead-up context: a rolling lookback buffer means
//! each segment starts *before* the frame that triggered it (pre-roll), and a
//! grace period keeps recording through brief gaps after motion stops
//! (post-roll).
//!
//! # Architecture
//! - Capture loop (producer): reads frames, runs the motion classifier, and
//!   decides segment boundaries with a hysteresis state machine
//! - Segment queue: thread-safe FIFO hand-off of frame batches
//! - Segment writer (consumer): streams each segment's raw frames into its
//!   own external encoder process (ffmpeg by default)
//!
//! # Usage
//! ```rust,ignore
//! use sentrycam::{FrameDiffClassifier, Pipeline, SentryCamConfig};
//! use sentrycam::camera::CameraSource;
//!
//! let config = SentryCamConfig::load_or_default();
//! let source = CameraSource::open(&config.capture)?;
//! let classifier = FrameDiffClassifier::from_settings(&config.motion);
//! let pipeline = Pipeline::new(&config, source, classifier)?;
//!
//! // Runs until `stop` is raised or the camera fails; every started
//! // segment is finalized before this returns.
//! let stats = pipeline.run(&stop)?;
//! ```
#[cfg(feature = "camera")]
pub mod camera;
pub mod config;
pub mod errors;
pub mod motion;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod types;

// Testing utilities - deterministic collaborators for offline tests
pub mod testing;

// Re-exports for convenience
pub use config::SentryCamConfig;
pub use errors::RecorderError;
pub use motion::{FrameDiffClassifier, MotionClassifier};
pub use pipeline::{Pipeline, PipelineStats};
pub use source::FrameSource;
pub use types::{Frame, FrameBatch};

#[cfg(feature = "camera")]
pub use camera::CameraSource;

/// Initialize logging for the recorder
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "sentrycam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_metadata() {
        assert_eq!(NAME, "sentrycam");
        assert!(!VERSION.is_empty());
        assert!(!DESCRIPTION.is_empty());
    }
}
