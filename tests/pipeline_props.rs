//! Property-Based Tests for the SentryCam Recording Pipeline
//!
//! These tests verify invariants and contracts of the segment state machine
//! and the batch queue using proptest for input generation and shrinking.
//!
//! Run with: cargo test --test pipeline_props

use proptest::prelude::*;

use sentrycam::pipeline::{RecordingState, RecordingStateMachine, SegmentQueue};
use sentrycam::types::{Frame, FrameBatch};
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Drive a state machine with a verdict script, one frame per interval,
/// optionally inserting a capture gap before given indices.
fn run_script(
    pre_roll_frames: usize,
    post_roll: Duration,
    verdicts: &[bool],
    gap_before: &[usize],
    gap: Duration,
) -> (RecordingStateMachine, Vec<FrameBatch>) {
    let mut machine = RecordingStateMachine::new(pre_roll_frames, post_roll);
    let origin = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut emitted = Vec::new();

    for (i, &motion) in verdicts.iter().enumerate() {
        if gap_before.contains(&i) {
            elapsed += gap;
        }
        let frame = Frame::new(i as u64, vec![0; 12], 2, 2).with_captured_at(origin + elapsed);
        emitted.extend(machine.tick(frame, motion));
        elapsed += FRAME_INTERVAL;
    }

    (machine, emitted)
}

fn count_sentinels(batches: &[FrameBatch]) -> u64 {
    batches.iter().filter(|b| b.is_end_of_segment()).count() as u64
}

// ═══════════════════════════════════════════════════════════════════════════
// STATE MACHINE INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: every started segment is closed by exactly one sentinel,
    /// including segments still open at shutdown.
    #[test]
    fn sentinels_balance_segment_starts(
        verdicts in prop::collection::vec(prop::bool::ANY, 0..400),
        pre_roll_frames in 0usize..12,
    ) {
        // Post-roll shorter than the frame interval: any negative verdict
        // closes an open segment, exercising boundaries densely.
        let (mut machine, mut emitted) =
            run_script(pre_roll_frames, Duration::from_millis(10), &verdicts, &[], Duration::ZERO);
        emitted.extend(machine.finish());

        prop_assert_eq!(count_sentinels(&emitted), machine.segments_started());
    }

    /// INVARIANT: the first batch of a segment contains exactly the last N
    /// frames captured before the positive verdict, in capture order.
    #[test]
    fn pre_roll_is_exactly_last_n(
        pre_roll_frames in 1usize..20,
        extra_idle in 0usize..40,
    ) {
        let idle = pre_roll_frames + extra_idle;
        let mut verdicts = vec![false; idle];
        verdicts.push(true);

        let (_, emitted) =
            run_script(pre_roll_frames, Duration::from_secs(1), &verdicts, &[], Duration::ZERO);

        prop_assert!(!emitted.is_empty());
        let first = &emitted[0];
        prop_assert_eq!(first.len(), pre_roll_frames);

        let expected: Vec<u64> =
            ((idle - pre_roll_frames) as u64..idle as u64).collect();
        let actual: Vec<u64> = first.frames().iter().map(|f| f.sequence).collect();
        prop_assert_eq!(actual, expected);
    }

    /// INVARIANT: negative gaps shorter than the post-roll never split a
    /// segment.
    #[test]
    fn short_gaps_do_not_split_segments(
        bursts in prop::collection::vec((1usize..10, 1usize..8), 1..6),
    ) {
        // Motion bursts separated by short negative gaps; post-roll far
        // larger than any gap, so exactly one segment forms.
        let mut verdicts = vec![false; 5];
        for (motion_len, gap_len) in &bursts {
            verdicts.extend(std::iter::repeat(true).take(*motion_len));
            verdicts.extend(std::iter::repeat(false).take(*gap_len));
        }

        let (mut machine, mut emitted) =
            run_script(3, Duration::from_secs(60), &verdicts, &[], Duration::ZERO);

        prop_assert_eq!(count_sentinels(&emitted), 0);
        prop_assert_eq!(machine.segments_started(), 1);
        prop_assert_eq!(machine.state(), RecordingState::Recording);

        emitted.extend(machine.finish());
        prop_assert_eq!(count_sentinels(&emitted), 1);
    }

    /// INVARIANT: once motion stops, the segment stays open until the
    /// post-roll elapses and closes on the first verdict beyond it.
    #[test]
    fn long_gap_closes_segment(
        motion_len in 1usize..20,
        gap_ms in 200u64..2000,
    ) {
        let mut verdicts = vec![false; 3];
        verdicts.extend(std::iter::repeat(true).take(motion_len));
        verdicts.push(false);

        let (mut machine, emitted) = run_script(
            2,
            Duration::from_millis(100),
            &verdicts,
            &[3 + motion_len],
            Duration::from_millis(gap_ms),
        );

        prop_assert!(emitted.last().unwrap().is_end_of_segment());
        prop_assert_eq!(machine.state(), RecordingState::Idle);
        prop_assert_eq!(machine.segments_started(), 1);
        prop_assert!(machine.finish().is_empty());
    }

    /// INVARIANT: no frame appears in two batches, and concatenating one
    /// segment's non-empty batches reproduces capture order without gaps.
    #[test]
    fn segments_reassemble_capture_order(
        verdicts in prop::collection::vec(prop::bool::ANY, 0..300),
        pre_roll_frames in 1usize..10,
    ) {
        let (mut machine, mut emitted) =
            run_script(pre_roll_frames, Duration::from_millis(10), &verdicts, &[], Duration::ZERO);
        emitted.extend(machine.finish());

        let mut seen = std::collections::HashSet::new();
        let mut segment_frames: Vec<u64> = Vec::new();

        for batch in &emitted {
            if batch.is_end_of_segment() {
                // Within one segment: strictly consecutive capture order.
                for pair in segment_frames.windows(2) {
                    prop_assert_eq!(pair[1], pair[0] + 1);
                }
                segment_frames.clear();
                continue;
            }
            for frame in batch.frames() {
                prop_assert!(seen.insert(frame.sequence), "frame in two batches");
                segment_frames.push(frame.sequence);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SEGMENT QUEUE INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: pops return batches in push order, and after N pushes and
    /// N pops the queue reports empty.
    #[test]
    fn queue_is_fifo(
        tags in prop::collection::vec(0u64..1000, 0..50),
        interleave in prop::collection::vec(prop::bool::ANY, 0..50),
    ) {
        let queue = SegmentQueue::new();
        let mut to_push = tags.clone().into_iter();
        let mut popped = Vec::new();

        // Interleave pushes and pops in an arbitrary pattern, then drain.
        for &push_next in &interleave {
            if push_next {
                if let Some(tag) = to_push.next() {
                    let mut batch = FrameBatch::new();
                    batch.push(Frame::new(tag, vec![0; 12], 2, 2));
                    queue.push(batch);
                }
            } else if let Some(batch) = queue.pop_timeout(Duration::ZERO) {
                popped.push(batch.frames()[0].sequence);
            }
        }
        for tag in to_push {
            let mut batch = FrameBatch::new();
            batch.push(Frame::new(tag, vec![0; 12], 2, 2));
            queue.push(batch);
        }
        while let Some(batch) = queue.pop_timeout(Duration::ZERO) {
            popped.push(batch.frames()[0].sequence);
        }

        prop_assert_eq!(popped, tags);
        prop_assert!(queue.is_empty());
        prop_assert_eq!(queue.len(), 0);
    }
}
