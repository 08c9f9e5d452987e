// SentryCam recorder daemon
// Watches the camera and writes motion events as timestamped video segments.

use sentrycam::camera::CameraSource;
use sentrycam::{FrameDiffClassifier, Pipeline, SentryCamConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sentrycam::init_logging();

    // Optional single argument: path to the TOML config.
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(SentryCamConfig::default_path);
    let config = SentryCamConfig::load_from_file(&config_path)?;

    log::info!(
        "sentrycam {} starting: {}x{}@{}fps, pre-roll {}s, post-roll {}ms",
        sentrycam::VERSION,
        config.capture.width,
        config.capture.height,
        config.capture.fps,
        config.motion.pre_roll_seconds,
        config.motion.post_roll_ms
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            log::info!("Shutdown requested, finishing open segment");
            stop.store(true, Ordering::Relaxed);
        })?;
    }

    let source = CameraSource::open(&config.capture)?;
    let classifier = FrameDiffClassifier::from_settings(&config.motion);
    let pipeline = Pipeline::new(&config, source, classifier)?;

    let stats = pipeline.run(&stop)?;
    log::info!(
        "Captured {} frames, wrote {} frames across {} segments ({} failed)",
        stats.frames_captured,
        stats.frames_written,
        stats.segments_completed,
        stats.segments_failed
    );

    Ok(())
}
