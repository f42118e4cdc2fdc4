use super::state::{ConfirmationState, DwellTimer};
use super::{EngineParams, FrameOutcome};
use crate::classifier::{Classification, GestureLabel};
use crate::evaluation::{ConfirmationRecord, EvaluationStats};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Cooling,
}

/// Step 1: the cooldown gate. Idempotent once the window has elapsed.
pub fn cooldown_gate(state: &mut ConfirmationState, now: Duration) -> Gate {
    if !state.cooldown_active {
        return Gate::Open;
    }
    if now < state.cooldown_end {
        return Gate::Cooling;
    }
    state.cooldown_active = false;
    // The pose has to be dropped (or the frame loop has to observe it again)
    // before the same label can re-arm.
    state.released = false;
    debug!("Cooldown elapsed at {:.3}s", now.as_secs_f64());
    Gate::Open
}

/// Advances the confirmation state machine by one frame.
pub fn advance(
    state: &mut ConfirmationState,
    stats: &mut EvaluationStats,
    params: &EngineParams,
    level: u8,
    now: Duration,
    observed: Option<Classification>,
) -> FrameOutcome {
    // 1. Cooldown
    if cooldown_gate(state, now) == Gate::Cooling {
        return FrameOutcome::Cooling;
    }

    // 2. Nothing usable this frame
    let Some(observed) = observed else {
        if state.potential.is_some() {
            debug!("Detection lost, dwell cancelled");
        }
        state.potential = None;
        state.released = true;
        return FrameOutcome::NoPrediction;
    };
    let label = observed.prediction.label;
    let confidence = observed.prediction.confidence;

    // 3. Same gesture as the last confirmation
    if state.last_confirmed == Some(label) {
        if state.cooldown_active {
            // Unreachable after the gate above; kept as a hold.
            return FrameOutcome::Cooling;
        }
        if state.potential.is_none() {
            state.potential = Some(DwellTimer {
                label,
                started_at: now,
            });
        }
    }

    // 4. Rolling buffers
    state.buffer.push(confidence, label);
    let avg_confidence = state.buffer.mean_confidence();
    let stability = state.buffer.stability(label);

    // 5. Dwell
    let outcome = match state.potential {
        Some(timer) if timer.label == label => {
            let held = now.saturating_sub(timer.started_at);
            if held >= params.dwell {
                let sample = FrameSample {
                    observed,
                    avg_confidence,
                    stability,
                };
                let record = confirm(state, stats, params, level, now, sample);
                FrameOutcome::Confirmed(record)
            } else {
                FrameOutcome::Tracking {
                    label,
                    progress: progress(held, params.dwell),
                }
            }
        }
        _ => {
            debug!("Dwell started for {} at {:.3}s", label, now.as_secs_f64());
            state.potential = Some(DwellTimer {
                label,
                started_at: now,
            });
            FrameOutcome::Tracking {
                label,
                progress: 0.0,
            }
        }
    };

    // 6. Release is granted again as soon as the cooldown is over
    if !state.cooldown_active && state.last_confirmed.is_some() {
        state.released = true;
    }

    outcome
}

/// The frame that completed a dwell, with its rolling-buffer readouts.
struct FrameSample {
    observed: Classification,
    avg_confidence: f32,
    stability: usize,
}

fn confirm(
    state: &mut ConfirmationState,
    stats: &mut EvaluationStats,
    params: &EngineParams,
    level: u8,
    now: Duration,
    sample: FrameSample,
) -> ConfirmationRecord {
    let FrameSample {
        observed,
        avg_confidence,
        stability,
    } = sample;
    let label: GestureLabel = observed.prediction.label;
    let confidence = observed.prediction.confidence;
    let threshold = params.thresholds.threshold_for(level);
    let valid = confidence >= threshold && stability >= params.min_stable_frames;

    let record = ConfirmationRecord {
        label,
        confidence,
        avg_confidence,
        stability,
        level,
        threshold,
        valid,
        latency_ms: observed.inference_ms,
        at_secs: now.as_secs_f64(),
    };
    stats.record(&record);

    info!(
        "Gesture confirmed: {} ({}) conf={:.2}% level={} threshold={:.0}% {} latency={:.2}ms avg_conf={:.2}% stability={}",
        label.id(),
        label.display_name(),
        confidence * 100.0,
        level,
        threshold * 100.0,
        if valid { "valid" } else { "weak (invalid)" },
        observed.inference_ms,
        avg_confidence * 100.0,
        stability
    );

    if valid {
        state.pending_action = Some(label);
    }

    state.last_confirmed = Some(label);
    state.released = false;
    state.cooldown_active = true;
    state.cooldown_end = now.saturating_add(params.cooldown);
    state.potential = None;

    record
}

pub fn progress(held: Duration, dwell: Duration) -> f32 {
    if dwell.is_zero() {
        return 1.0;
    }
    (held.as_secs_f64() / dwell.as_secs_f64()).min(1.0) as f32
}
