//! Motion classification over captured frames

use crate::config::MotionSettings;
use crate::types::Frame;

/// Per-frame motion verdict.
///
/// Implementations are stateful (they compare against previously seen frames)
/// and are used single-threaded, owned by the capture loop. The first call
/// after construction must return `false`: there is nothing to diff against.
pub trait MotionClassifier {
    fn detect(&mut self, frame: &Frame) -> bool;
}

/// Frame-differencing classifier.
///
/// Converts each frame to grayscale, diffs it against the previous frame,
/// and reports motion when at least `min_changed_pixels` pixels moved by
/// `delta_threshold` or more.
pub struct FrameDiffClassifier {
    previous: Option<Vec<u8>>,
    delta_threshold: u8,
    min_changed_pixels: u32,
}

impl FrameDiffClassifier {
    pub fn new(delta_threshold: u8, min_changed_pixels: u32) -> Self {
        Self {
            previous: None,
            delta_threshold,
            min_changed_pixels,
        }
    }

    pub fn from_settings(settings: &MotionSettings) -> Self {
        Self::new(settings.delta_threshold, settings.min_changed_pixels)
    }
}

impl MotionClassifier for FrameDiffClassifier {
    fn detect(&mut self, frame: &Frame) -> bool {
        let gray = grayscale(&frame.data);

        let verdict = match &self.previous {
            None => false,
            Some(previous) if previous.len() != gray.len() => {
                // Resolution changed under us; restart the comparison baseline.
                false
            }
            Some(previous) => {
                let mut changed: u32 = 0;
                for (a, b) in previous.iter().zip(gray.iter()) {
                    if a.abs_diff(*b) >= self.delta_threshold {
                        changed += 1;
                        if changed >= self.min_changed_pixels {
                            break;
                        }
                    }
                }
                changed >= self.min_changed_pixels
            }
        };

        self.previous = Some(gray);
        verdict
    }
}

/// Convert interleaved RGB24 to one luma byte per pixel (BT.601 integer math).
fn grayscale(rgb: &[u8]) -> Vec<u8> {
    let mut gray = Vec::with_capacity(rgb.len() / 3);
    for px in rgb.chunks_exact(3) {
        let r = px[0] as i32;
        let g = px[1] as i32;
        let b = px[2] as i32;
        let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
        gray.push(y.clamp(0, 255) as u8);
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(sequence: u64, level: u8) -> Frame {
        Frame::new(sequence, vec![level; 16 * 16 * 3], 16, 16)
    }

    #[test]
    fn test_first_verdict_is_always_negative() {
        let mut classifier = FrameDiffClassifier::new(25, 1);
        let frame = solid_frame(0, 255);
        assert!(!classifier.detect(&frame));
    }

    #[test]
    fn test_identical_frames_are_still() {
        let mut classifier = FrameDiffClassifier::new(25, 1);
        classifier.detect(&solid_frame(0, 128));
        assert!(!classifier.detect(&solid_frame(1, 128)));
    }

    #[test]
    fn test_large_change_is_motion() {
        let mut classifier = FrameDiffClassifier::new(25, 100);
        classifier.detect(&solid_frame(0, 0));
        assert!(classifier.detect(&solid_frame(1, 255)));
    }

    #[test]
    fn test_small_area_below_threshold_is_still() {
        let mut classifier = FrameDiffClassifier::new(25, 100);
        classifier.detect(&solid_frame(0, 0));

        // Change fewer pixels than the area threshold requires.
        let mut data = vec![0u8; 16 * 16 * 3];
        for px in data.chunks_exact_mut(3).take(50) {
            px.fill(255);
        }
        let frame = Frame::new(1, data, 16, 16);
        assert!(!classifier.detect(&frame));
    }

    #[test]
    fn test_grayscale_length() {
        assert_eq!(grayscale(&[10u8; 30]).len(), 10);
    }
}
