//! nokhwa-backed camera frame source
//!
//! Only compiled with the `camera` feature; the rest of the crate is
//! hardware-free and testable without a device.

use crate::config::CaptureSettings;
use crate::errors::RecorderError;
use crate::source::FrameSource;
use crate::types::Frame;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
            Resolution},
    Camera,
};
use std::time::Duration;

/// A physical camera, owned exclusively by the capture loop.
pub struct CameraSource {
    camera: Camera,
    sequence: u64,
}

impl CameraSource {
    /// Open the device, start streaming, and let it settle.
    ///
    /// The warm-up sleep plus a discarded first read give auto-exposure time
    /// to converge before frames reach the motion classifier.
    pub fn open(settings: &CaptureSettings) -> Result<Self, RecorderError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(settings.width, settings.height),
                FrameFormat::MJPEG,
                settings.fps,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(settings.device_index), requested)
            .map_err(|e| {
                RecorderError::Acquisition(format!(
                    "Cannot open camera {}: {}",
                    settings.device_index, e
                ))
            })?;

        camera.open_stream().map_err(|e| {
            RecorderError::Acquisition(format!("Cannot start camera stream: {}", e))
        })?;

        std::thread::sleep(Duration::from_millis(settings.warmup_ms));

        let mut source = Self { camera, sequence: 0 };
        source.read()?;
        source.sequence = 0;

        log::info!(
            "Camera {} streaming ({}x{} requested)",
            settings.device_index,
            settings.width,
            settings.height
        );
        Ok(source)
    }
}

impl FrameSource for CameraSource {
    fn read(&mut self) -> Result<Frame, RecorderError> {
        let buffer = self.camera.frame().map_err(|e| {
            RecorderError::Acquisition(format!("Cannot read frame from camera: {}", e))
        })?;

        let decoded = buffer.decode_image::<RgbFormat>().map_err(|e| {
            RecorderError::Acquisition(format!("Cannot decode camera frame: {}", e))
        })?;

        let width = decoded.width();
        let height = decoded.height();
        let frame = Frame::new(self.sequence, decoded.into_raw(), width, height);
        self.sequence += 1;
        Ok(frame)
    }

    fn close(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {}", e);
        }
    }
}
