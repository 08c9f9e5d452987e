use std::fmt;

#[derive(Debug)]
pub enum RecorderError {
    /// Frame source open/read failure. Fatal: the capture loop stops.
    Acquisition(String),
    /// Encoder process failed to start. Segment-local: that segment is dropped.
    EncoderLaunch(String),
    /// Write to the encoder pipe failed mid-segment. Segment-local.
    EncoderWrite(String),
    /// Configuration, output directory, or thread setup failure.
    Initialization(String),
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecorderError::Acquisition(msg) => write!(f, "Acquisition error: {}", msg),
            RecorderError::EncoderLaunch(msg) => write!(f, "Encoder launch error: {}", msg),
            RecorderError::EncoderWrite(msg) => write!(f, "Encoder write error: {}", msg),
            RecorderError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl std::error::Error for RecorderError {}
