#![allow(dead_code)]

use gesturegate::classifier::{Classification, GestureLabel, Prediction};
use gesturegate::confirm::{ConfirmationEngine, FrameOutcome};
use std::time::Duration;

pub const FPS: u64 = 30;

/// Time of frame `k` at 30 fps; frame 60 lands exactly on 2.0 s.
pub fn frame_time(k: u64) -> Duration {
    Duration::from_micros(k * 1_000_000 / FPS)
}

pub fn seen(label: GestureLabel, confidence: f32) -> Option<Classification> {
    Some(Classification::from(Prediction::new(label, confidence)))
}

/// Feeds `label` for frames `from..=to` and returns every outcome.
pub fn hold(
    engine: &mut ConfirmationEngine,
    label: Option<GestureLabel>,
    confidence: f32,
    from: u64,
    to: u64,
) -> Vec<(u64, FrameOutcome)> {
    (from..=to)
        .map(|k| {
            let observed = label.and_then(|l| seen(l, confidence));
            (k, engine.step(frame_time(k), observed))
        })
        .collect()
}

pub fn confirmations(outcomes: &[(u64, FrameOutcome)]) -> Vec<u64> {
    outcomes
        .iter()
        .filter(|(_, o)| matches!(o, FrameOutcome::Confirmed(_)))
        .map(|(k, _)| *k)
        .collect()
}
