//! External encoder process management
//!
//! Each segment is piped as raw RGB24 into a freshly spawned encoder process
//! (ffmpeg by default); closing its stdin finalizes the output file.

use crate::config::EncoderSettings;
use crate::errors::RecorderError;
use crate::pipeline::writer::{SegmentSink, SegmentSinkFactory};
use crate::storage;
use crate::types::Frame;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Argument list for one segment's encoder invocation.
///
/// Raw interleaved RGB24 on stdin; yuv420p H.264 out. Rate control is
/// `-preset`/`-crf` for software codecs, or `-b:v` when a fixed bitrate is
/// configured (hardware encoders such as `h264_v4l2m2m` want the latter).
pub fn encoder_args(
    settings: &EncoderSettings,
    width: u32,
    height: u32,
    fps: u32,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-vcodec".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{}x{}", width, height),
        "-r".into(),
        fps.to_string(),
        "-i".into(),
        "-".into(),
        "-an".into(),
        "-c:v".into(),
        settings.codec.clone(),
    ];

    match &settings.bitrate {
        Some(bitrate) => {
            args.push("-b:v".into());
            args.push(bitrate.clone());
        }
        None => {
            args.push("-preset".into());
            args.push(settings.preset.clone());
            args.push("-crf".into());
            args.push(settings.crf.to_string());
        }
    }

    args.push("-pix_fmt".into());
    args.push("yuv420p".into());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// A running encoder process owning one segment's output file.
///
/// The child is reaped on every exit path: `finish` closes stdin and waits;
/// `Drop` does the same if a sink is abandoned mid-segment.
pub struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_bytes: usize,
    output: PathBuf,
    frames_written: u64,
}

impl EncoderProcess {
    /// Spawn `command` with a piped stdin, expecting RGB24 frames of the
    /// given dimensions. The caller decides where stdout/stderr go.
    pub fn spawn(
        mut command: Command,
        width: u32,
        height: u32,
        output: PathBuf,
    ) -> Result<Self, RecorderError> {
        command.stdin(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            RecorderError::EncoderLaunch(format!(
                "Failed to spawn encoder for {:?}: {}",
                output, e
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            RecorderError::EncoderLaunch(format!("Encoder stdin unavailable for {:?}", output))
        })?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            frame_bytes: Frame::rgb24_len(width, height),
            output,
            frames_written: 0,
        })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl SegmentSink for EncoderProcess {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecorderError> {
        if frame.data.len() != self.frame_bytes {
            return Err(RecorderError::EncoderWrite(format!(
                "Frame {} is {} bytes, encoder expects {}",
                frame.sequence,
                frame.data.len(),
                self.frame_bytes
            )));
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| {
            RecorderError::EncoderWrite("Encoder stream already closed".to_string())
        })?;

        stdin.write_all(&frame.data).map_err(|e| {
            RecorderError::EncoderWrite(format!("Pipe write to encoder failed: {}", e))
        })?;

        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), RecorderError> {
        // Closing stdin tells the encoder to flush and finalize the file.
        drop(self.stdin.take());

        let status = self.child.wait().map_err(|e| {
            RecorderError::EncoderWrite(format!("Failed to wait for encoder: {}", e))
        })?;

        if !status.success() {
            return Err(RecorderError::EncoderWrite(format!(
                "Encoder exited with {} after {} frames ({:?})",
                status, self.frames_written, self.output
            )));
        }

        log::info!(
            "Encoder finalized {:?} ({} frames)",
            self.output,
            self.frames_written
        );
        Ok(())
    }
}

impl Drop for EncoderProcess {
    fn drop(&mut self) {
        drop(self.stdin.take());
        // Reap the child; wait() after finish() returns the cached status.
        if let Err(e) = self.child.wait() {
            log::warn!("Failed to reap encoder process: {}", e);
        }
    }
}

/// Production sink factory: one encoder process per segment, writing a
/// timestamped file into the output directory.
pub struct FfmpegSegmentFactory {
    settings: EncoderSettings,
    width: u32,
    height: u32,
    fps: u32,
    output_dir: PathBuf,
}

impl FfmpegSegmentFactory {
    pub fn new(
        settings: EncoderSettings,
        width: u32,
        height: u32,
        fps: u32,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            width,
            height,
            fps,
            output_dir,
        }
    }
}

impl SegmentSinkFactory for FfmpegSegmentFactory {
    fn open(&mut self) -> Result<Box<dyn SegmentSink>, RecorderError> {
        let output = storage::timestamped_path(&self.output_dir, "mp4");

        let mut command = Command::new(&self.settings.program);
        command
            .args(encoder_args(
                &self.settings,
                self.width,
                self.height,
                self.fps,
                &output,
            ))
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let process = EncoderProcess::spawn(command, self.width, self.height, output)?;
        log::info!("Recording segment to {:?}", process.output());
        Ok(Box::new(process))
    }
}
