mod common;

use common::{confirmations, frame_time, hold, seen};
use gesturegate::classifier::GestureLabel::{self, *};
use gesturegate::classifier::Direction;
use gesturegate::config::ConfirmParams;
use gesturegate::confirm::{
    level_from_key, ConfirmationEngine, EngineParams, FrameOutcome, LevelThresholds, Phase,
    StabilityBuffer,
};
use gesturegate::error::GestureError;
use rstest::rstest;
use std::time::Duration;

#[test]
fn test_two_second_hold_confirms_exactly_once() {
    let mut engine = ConfirmationEngine::default();
    let out = hold(&mut engine, Some(Fist), 0.95, 0, 60);

    assert_eq!(confirmations(&out), vec![60]);
    assert_eq!(engine.stats().total_confirmed, 1);
    assert_eq!(engine.consume_action(), Some(Fist));
}

#[test]
fn test_short_hold_never_confirms() {
    let mut engine = ConfirmationEngine::default();
    let mut out = hold(&mut engine, Some(Fist), 0.95, 0, 57);
    out.extend(hold(&mut engine, None, 0.0, 58, 120));

    assert!(confirmations(&out).is_empty());
    assert_eq!(engine.stats().total_confirmed, 0);
    assert_eq!(engine.consume_action(), None);
}

#[rstest]
#[case(Some(Fist))]
#[case(Some(Palm))]
#[case(None)]
fn test_cooldown_suppresses_everything(#[case] next: Option<GestureLabel>) {
    let mut engine = ConfirmationEngine::default();
    hold(&mut engine, Some(Fist), 0.95, 0, 60);

    // 0.5 s at 30 fps: frames 61..=74 all fall before t = 2.5 s
    let out = hold(&mut engine, next, 0.95, 61, 74);
    assert!(out.iter().all(|(_, o)| *o == FrameOutcome::Cooling));
    assert_eq!(engine.stats().total_confirmed, 1);
}

#[test]
fn test_action_is_handed_out_once() {
    let mut engine = ConfirmationEngine::default();
    hold(&mut engine, Some(ThumbIndex), 0.95, 0, 60);

    assert_eq!(engine.consume_action(), Some(ThumbIndex));
    assert_eq!(engine.consume_action(), None);
}

#[test]
fn test_consume_direction_maps_label() {
    let mut engine = ConfirmationEngine::default();
    hold(&mut engine, Some(Grabbing), 0.95, 0, 60);

    assert_eq!(engine.consume_direction(), Some(Direction::Left));
    assert_eq!(engine.consume_direction(), None);
}

#[rstest]
#[case(8, false)]
#[case(4, true)]
fn test_validity_follows_level_threshold(#[case] level: u8, #[case] valid: bool) {
    let mut engine = ConfirmationEngine::default();
    engine.set_level(level);
    let out = hold(&mut engine, Some(Palm), 0.5, 0, 60);

    let record = out
        .iter()
        .find_map(|(_, o)| o.confirmation())
        .expect("a confirmation");
    assert!(record.stability >= 5);
    assert_eq!(record.valid, valid);
    assert_eq!(record.level, level);

    assert_eq!(engine.stats().total_confirmed, 1);
    assert_eq!(engine.stats().total_valid, valid as u32);
    assert_eq!(engine.consume_action().is_some(), valid);
}

#[test]
fn test_unstable_confirmation_is_invalid() {
    let params = EngineParams {
        dwell: Duration::from_millis(100),
        ..Default::default()
    };
    let mut engine = ConfirmationEngine::new(params);
    let out = hold(&mut engine, Some(Fist), 0.95, 0, 3);

    let record = out.iter().find_map(|(_, o)| o.confirmation()).unwrap();
    assert_eq!(record.stability, 4);
    assert!(!record.valid);
    assert_eq!(engine.consume_action(), None);
}

#[test]
fn test_fist_then_palm_session() {
    let mut engine = ConfirmationEngine::default();

    let first = hold(&mut engine, Some(Fist), 0.95, 0, 60);
    assert_eq!(confirmations(&first), vec![60]);
    assert_eq!(engine.state().pending_action, Some(Fist));
    assert_eq!(engine.consume_action(), Some(Fist));

    // Label changes during the cooldown are ignored
    let cooling = hold(&mut engine, Some(Palm), 0.95, 61, 74);
    assert!(confirmations(&cooling).is_empty());

    let second = hold(&mut engine, Some(Palm), 0.95, 75, 140);
    assert_eq!(confirmations(&second), vec![135]);
    assert_eq!(engine.consume_action(), Some(Palm));

    let eval = engine.evaluate_level().unwrap();
    assert_eq!(eval.total_all, 2);
    assert_eq!(eval.total_valid, 2);
    assert!((eval.valid_ratio_pct - 100.0).abs() < 1e-4);
}

#[test]
fn test_repeat_gesture_rearms_after_cooldown() {
    let mut engine = ConfirmationEngine::default();
    let out = hold(&mut engine, Some(Fist), 0.95, 0, 140);

    assert_eq!(confirmations(&out), vec![60, 135]);
}

#[test]
fn test_lost_detection_restarts_dwell() {
    let mut engine = ConfirmationEngine::default();
    let mut out = hold(&mut engine, Some(Fist), 0.95, 0, 30);
    out.extend(hold(&mut engine, None, 0.0, 31, 31));
    out.extend(hold(&mut engine, Some(Fist), 0.95, 32, 100));

    assert_eq!(confirmations(&out), vec![92]);
}

#[test]
fn test_low_confidence_counts_as_no_prediction() {
    let mut engine = ConfirmationEngine::default();
    let mut out = hold(&mut engine, Some(Fist), 0.95, 0, 30);
    out.push((31, engine.step(frame_time(31), seen(Fist, 0.05))));
    out.extend(hold(&mut engine, Some(Fist), 0.95, 32, 100));

    assert_eq!(out[31].1, FrameOutcome::NoPrediction);
    assert_eq!(confirmations(&out), vec![92]);
}

#[test]
fn test_label_switch_restarts_dwell() {
    let mut engine = ConfirmationEngine::default();
    let mut out = hold(&mut engine, Some(Fist), 0.95, 0, 30);
    out.extend(hold(&mut engine, Some(Palm), 0.95, 31, 100));

    assert_eq!(confirmations(&out), vec![91]);
    assert_eq!(out[91].1.confirmation().unwrap().label, Palm);
}

#[test]
fn test_dwell_progress_and_phase() {
    let mut engine = ConfirmationEngine::default();
    assert_eq!(engine.phase(frame_time(0)), Phase::Idle);
    assert_eq!(engine.dwell_progress(frame_time(0)), 0.0);

    hold(&mut engine, Some(Fist), 0.95, 0, 30);
    let progress = engine.dwell_progress(frame_time(30));
    assert!((progress - 0.5).abs() < 1e-3, "progress = {}", progress);
    assert_eq!(engine.phase(frame_time(30)), Phase::Tracking(Fist));

    // Readout is capped even if nobody drives the engine
    assert_eq!(engine.dwell_progress(Duration::from_secs(10)), 1.0);
    assert_eq!(engine.phase(Duration::from_secs(10)), Phase::Held(Fist));

    hold(&mut engine, Some(Fist), 0.95, 31, 60);
    assert_eq!(engine.dwell_progress(frame_time(61)), 0.0);
    assert_eq!(engine.phase(frame_time(61)), Phase::Cooling);
    assert_eq!(engine.phase(frame_time(75)), Phase::Idle);
}

#[test]
fn test_release_protocol() {
    let mut engine = ConfirmationEngine::default();
    assert!(engine.state().released);

    hold(&mut engine, Some(Fist), 0.95, 0, 60);
    assert!(!engine.state().released);
    assert!(engine.state().cooldown_active);

    // First frame after the cooldown re-grants release while tracking
    hold(&mut engine, Some(Fist), 0.95, 75, 75);
    assert!(!engine.state().cooldown_active);
    assert!(engine.state().released);

    hold(&mut engine, Some(Fist), 0.95, 76, 135);
    assert!(!engine.state().released);
    hold(&mut engine, None, 0.0, 151, 151);
    assert!(engine.state().released);
}

#[test]
fn test_stability_buffer_tracks_trailing_run() {
    let mut buf = StabilityBuffer::new(4);
    for label in [Palm, Fist, Fist, Palm, Fist, Fist] {
        buf.push(0.5, label);
    }
    assert_eq!(buf.len(), 4);
    assert_eq!(buf.labels().collect::<Vec<_>>(), vec![Fist, Palm, Fist, Fist]);
    assert_eq!(buf.stability(Fist), 2);
    assert_eq!(buf.stability(Palm), 0);
    assert!((buf.mean_confidence() - 0.5).abs() < 1e-6);

    let zero = StabilityBuffer::new(0);
    assert_eq!(zero.capacity(), 1);
    assert_eq!(zero.mean_confidence(), 0.0);
}

#[rstest]
#[case(4, 0.10)]
#[case(6, 0.50)]
#[case(8, 0.90)]
#[case(1, 0.10)]
#[case(42, 0.10)]
fn test_default_thresholds(#[case] level: u8, #[case] expected: f32) {
    let t = LevelThresholds::default();
    assert!((t.threshold_for(level) - expected).abs() < 1e-6);
}

#[test]
fn test_threshold_parsing() {
    let t = LevelThresholds::parse(" 7:0.7 , 3:0.2 ", 0.05).unwrap();
    assert_eq!(t.levels().collect::<Vec<_>>(), vec![3, 7]);
    assert!((t.threshold_for(3) - 0.2).abs() < 1e-6);
    assert!((t.threshold_for(5) - 0.05).abs() < 1e-6);
}

#[rstest]
#[case("4-0.1")]
#[case("x:0.1")]
#[case("4:abc")]
#[case("4:1.5")]
#[case("4:0.1,4:0.2")]
fn test_threshold_parsing_rejects(#[case] input: &str) {
    assert!(matches!(
        LevelThresholds::parse(input, 0.1),
        Err(GestureError::Config(_))
    ));
}

#[rstest]
#[case("LEVEL_4", 4)]
#[case("LEVEL_8", 8)]
#[case("LEVEL_7_BONUS", 7)]
#[case("LEVEL_X", 6)]
#[case("TRIAL", 6)]
#[case("", 6)]
fn test_level_from_key(#[case] key: &str, #[case] expected: u8) {
    assert_eq!(level_from_key(key), expected);
}

#[test]
fn test_set_level_changes_threshold() {
    let mut engine = ConfirmationEngine::default();
    assert_eq!(engine.level(), 6);
    assert!((engine.current_threshold() - 0.5).abs() < 1e-6);

    engine.set_level(8);
    assert!((engine.current_threshold() - 0.9).abs() < 1e-6);
}

#[test]
fn test_engine_from_config_rejects_bad_params() {
    let cfg = ConfirmParams {
        buffer_capacity: 3,
        min_stable_frames: 5,
        ..Default::default()
    };
    assert!(matches!(
        ConfirmationEngine::from_config(&cfg),
        Err(GestureError::Config(_))
    ));
}

#[test]
fn test_every_confirmation_is_logged() {
    let mut engine = ConfirmationEngine::default();
    hold(&mut engine, Some(Fist), 0.95, 0, 140);

    let log = &engine.stats().log;
    assert_eq!(log.len(), 2);
    assert!((log[0].at_secs - 2.0).abs() < 1e-6);
    assert!((log[1].at_secs - 4.5).abs() < 1e-6);
}
