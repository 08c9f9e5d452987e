//! Frame acquisition interface

use crate::errors::RecorderError;
use crate::types::Frame;

/// A camera or other frame producer, owned exclusively by the capture loop.
///
/// `read` blocks until the next frame is available, paced by the device frame
/// rate. A read failure is fatal to the pipeline: the device is assumed gone
/// and there is no capture to detect motion on. Opening a source is an
/// inherent constructor on each implementation (for the camera backend see
/// `CameraSource::open`).
pub trait FrameSource {
    fn read(&mut self) -> Result<Frame, RecorderError>;

    /// Release the device. Called once when the capture loop exits.
    fn close(&mut self) {}
}
