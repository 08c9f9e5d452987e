//! Segment boundary decisions: pre-roll, post-roll, and batch flushing

use crate::types::{Frame, FrameBatch};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Whether the pipeline is currently inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Turns per-frame motion verdicts into segment boundaries.
///
/// While `Idle`, frames accumulate in a bounded lookback ring so that a
/// segment can start `pre_roll_frames` before the frame that triggered it.
/// While `Recording`, frames accumulate in a pending batch that is flushed
/// whenever it reaches the pre-roll size, bounding memory and hand-off
/// latency without closing the segment. A segment closes once no motion has
/// been seen for `post_roll` (brief gaps do not split a segment), and the
/// close is announced downstream with one empty sentinel batch.
///
/// Each frame is routed by the state the machine is in *after* the verdict
/// is applied: the triggering frame opens the segment's live batch rather
/// than joining the pre-roll, and the frame that outlives the grace period
/// seeds the next lookback ring rather than joining the closed segment.
///
/// The machine is single-threaded and clocked by `Frame::captured_at`.
pub struct RecordingStateMachine {
    state: RecordingState,
    lookback: VecDeque<Frame>,
    pending: FrameBatch,
    last_motion_at: Option<Instant>,
    pre_roll_frames: usize,
    flush_frames: usize,
    post_roll: Duration,
    segments_started: u64,
}

impl RecordingStateMachine {
    pub fn new(pre_roll_frames: usize, post_roll: Duration) -> Self {
        Self {
            state: RecordingState::Idle,
            lookback: VecDeque::with_capacity(pre_roll_frames.min(1024)),
            pending: FrameBatch::new(),
            last_motion_at: None,
            pre_roll_frames,
            flush_frames: pre_roll_frames.max(1),
            post_roll,
            segments_started: 0,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Segments opened so far; each will be closed by exactly one sentinel.
    pub fn segments_started(&self) -> u64 {
        self.segments_started
    }

    /// Feed one frame and its motion verdict; returns the batches to enqueue.
    pub fn tick(&mut self, frame: Frame, motion: bool) -> Vec<FrameBatch> {
        let now = frame.captured_at;
        let mut out = Vec::new();

        if motion {
            self.last_motion_at = Some(now);
            if self.state == RecordingState::Idle {
                self.start_segment(&mut out);
            }
            self.pending.push(frame);
        } else {
            let in_grace = self
                .last_motion_at
                .map_or(false, |t| now.duration_since(t) <= self.post_roll);

            match self.state {
                RecordingState::Recording if in_grace => self.pending.push(frame),
                RecordingState::Recording => {
                    self.close_segment(&mut out);
                    self.lookback.push_back(frame);
                }
                RecordingState::Idle => self.lookback.push_back(frame),
            }
        }

        match self.state {
            RecordingState::Idle => {
                while self.lookback.len() > self.pre_roll_frames {
                    self.lookback.pop_front();
                }
            }
            RecordingState::Recording => {
                if self.pending.len() >= self.flush_frames {
                    out.push(std::mem::take(&mut self.pending));
                }
            }
        }

        out
    }

    /// Shutdown flush: close any open segment through the same path as
    /// post-roll expiry, so every started segment ends with a sentinel.
    /// Idle lookback frames are discarded.
    pub fn finish(&mut self) -> Vec<FrameBatch> {
        let mut out = Vec::new();
        if self.state == RecordingState::Recording {
            self.close_segment(&mut out);
        }
        self.lookback.clear();
        self.last_motion_at = None;
        out
    }

    fn start_segment(&mut self, out: &mut Vec<FrameBatch>) {
        // An empty emission would read as a sentinel downstream, so a bare
        // start (empty lookback) emits nothing until live frames arrive.
        if !self.lookback.is_empty() {
            let mut pre_roll = FrameBatch::with_capacity(self.lookback.len());
            for frame in self.lookback.drain(..) {
                pre_roll.push(frame);
            }
            out.push(pre_roll);
        }
        self.state = RecordingState::Recording;
        self.segments_started += 1;
    }

    fn close_segment(&mut self, out: &mut Vec<FrameBatch>) {
        if !self.pending.is_empty() {
            out.push(std::mem::take(&mut self.pending));
        }
        out.push(FrameBatch::end_of_segment());
        self.state = RecordingState::Idle;
    }
}
