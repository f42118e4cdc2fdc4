use gesturegate::classifier::GestureLabel::{self, *};
use gesturegate::confirm::ConfirmationEngine;
use gesturegate::error::GestureError;
use gesturegate::trace::{self, parse_label, ScriptStep, SynthOptions, Trace};
use rstest::rstest;
use std::io::Cursor;
use std::time::Duration;

#[rstest]
#[case("1", Some(Fist))]
#[case("fist", Some(Fist))]
#[case(" Thumb_Index ", Some(ThumbIndex))]
#[case("3", Some(Grabbing))]
#[case("", None)]
#[case("none", None)]
fn test_parse_label(#[case] raw: &str, #[case] expected: Option<GestureLabel>) {
    assert_eq!(parse_label(raw).unwrap(), expected);
}

#[rstest]
#[case("4")]
#[case("wave")]
fn test_parse_label_rejects(#[case] raw: &str) {
    assert!(matches!(parse_label(raw), Err(GestureError::Validation(_))));
}

#[test]
fn test_trace_from_csv() {
    let csv = "time_s,label,confidence\n0.0,1,0.9\n0.0333,,\n0.0667,palm,0.4\n";
    let trace = Trace::from_reader(Cursor::new(csv)).unwrap();

    assert_eq!(trace.len(), 3);
    assert_eq!(trace.frames[0].prediction.unwrap().label, Fist);
    assert!(trace.frames[1].prediction.is_none());
    let p = trace.frames[2].prediction.unwrap();
    assert_eq!(p.label, Palm);
    assert!((p.confidence - 0.4).abs() < 1e-6);
    assert!((trace.duration().as_secs_f64() - 0.0667).abs() < 1e-6);
}

#[rstest]
#[case("time_s,label,confidence\n0.5,1,0.9\n0.2,1,0.9\n")]
#[case("time_s,label,confidence\n-1.0,1,0.9\n")]
#[case("time_s,label,confidence\n0.0,1,\n")]
#[case("time_s,label,confidence\n0.0,1,1.5\n")]
#[case("time_s,label,confidence\n0.0,9,0.5\n")]
#[case("time_s,label,confidence\n1e30,fist,0.9\n")]
#[case("time_s,label,confidence\ninf,fist,0.9\n")]
fn test_invalid_traces_are_rejected(#[case] csv: &str) {
    assert!(matches!(
        Trace::from_reader(Cursor::new(csv)),
        Err(GestureError::Validation(_))
    ));
}

#[test]
fn test_malformed_csv_is_a_csv_error() {
    let csv = "time_s,label,confidence\nsoon,1,0.9\n";
    assert!(matches!(
        Trace::from_reader(Cursor::new(csv)),
        Err(GestureError::Csv(_))
    ));
}

#[test]
fn test_trace_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.csv");

    let steps = trace::parse_script("grabbing:0.2,none:0.1,fist:0.1").unwrap();
    let original = trace::synthesize(&steps, &SynthOptions::default()).unwrap();
    original.save_to_file(&path).unwrap();

    let header = std::fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("time_s,label,confidence\n"));

    let loaded = Trace::load_from_file(&path).unwrap();
    assert_eq!(loaded.len(), original.len());
    for (a, b) in loaded.frames.iter().zip(&original.frames) {
        assert_eq!(a.prediction.map(|p| p.label), b.prediction.map(|p| p.label));
        assert!((a.at.as_secs_f64() - b.at.as_secs_f64()).abs() < 1e-6);
    }
}

#[test]
fn test_missing_trace_file_is_reported() {
    assert!(matches!(
        Trace::load_from_file("/definitely/not/here.csv"),
        Err(GestureError::Config(_))
    ));
}

#[test]
fn test_parse_script() {
    let steps = trace::parse_script("fist:2.0, none:0.5 ,palm:2.5").unwrap();
    assert_eq!(
        steps,
        vec![
            ScriptStep { label: Some(Fist), secs: 2.0 },
            ScriptStep { label: None, secs: 0.5 },
            ScriptStep { label: Some(Palm), secs: 2.5 },
        ]
    );
}

#[rstest]
#[case("")]
#[case("fist")]
#[case("fist:abc")]
#[case("fist:-1")]
#[case("wave:1.0")]
fn test_parse_script_rejects(#[case] script: &str) {
    assert!(trace::parse_script(script).is_err());
}

#[test]
fn test_synthesize_frame_timing() {
    let steps = trace::parse_script("fist:2.0,none:0.5").unwrap();
    let t = trace::synthesize(&steps, &SynthOptions::default()).unwrap();

    assert_eq!(t.len(), 75);
    assert_eq!(t.frames[0].at, Duration::ZERO);
    assert_eq!(t.frames[60].at, Duration::from_secs(2));
    assert_eq!(t.frames[59].prediction.unwrap().label, Fist);
    assert!(t.frames[60].prediction.is_none());
}

#[test]
fn test_synthesize_jitter_is_seeded_and_bounded() {
    let steps = trace::parse_script("palm:1.0").unwrap();
    let opts = SynthOptions {
        confidence: 0.8,
        jitter: 0.15,
        seed: Some(7),
        ..Default::default()
    };
    let a = trace::synthesize(&steps, &opts).unwrap();
    let b = trace::synthesize(&steps, &opts).unwrap();
    assert_eq!(a, b);

    let confs: Vec<f32> = a.frames.iter().map(|f| f.prediction.unwrap().confidence).collect();
    assert!(confs.iter().all(|c| (0.649..=0.951).contains(c)));
    assert!(confs.iter().any(|&c| (c - 0.8).abs() > 1e-3));
}

#[test]
fn test_synthesize_rejects_bad_fps() {
    let steps = trace::parse_script("palm:1.0").unwrap();
    let opts = SynthOptions {
        fps: 0.0,
        ..Default::default()
    };
    assert!(trace::synthesize(&steps, &opts).is_err());
}

#[test]
fn test_replay_scenario() {
    // Fist holds through the confirmation frame, Palm takes over during the cooldown
    let steps = trace::parse_script("fist:2.0333,palm:2.6").unwrap();
    let t = trace::synthesize(&steps, &SynthOptions::default()).unwrap();
    let mut engine = ConfirmationEngine::default();

    let report = trace::replay(&t, &mut engine);
    assert_eq!(report.level, 6);
    assert_eq!(report.frames, t.len());
    assert_eq!(report.actions, vec![Fist, Palm]);
    assert_eq!(report.confirmations.len(), 2);
    assert!((report.confirmations[1].at_secs - 4.5).abs() < 1e-6);

    let eval = report.evaluation.unwrap();
    assert_eq!(eval.total_valid, 2);
    let palm = report.label_counts.iter().find(|(l, _, _)| *l == Palm).unwrap();
    assert_eq!((palm.1, palm.2), (1, 1));
}

#[test]
fn test_replay_at_strict_level_delivers_nothing() {
    let steps = trace::parse_script("fist:2.5").unwrap();
    let opts = SynthOptions {
        confidence: 0.6,
        ..Default::default()
    };
    let t = trace::synthesize(&steps, &opts).unwrap();
    let mut engine = ConfirmationEngine::default();
    engine.set_level(8);

    let report = trace::replay(&t, &mut engine);
    assert!(report.actions.is_empty());
    assert_eq!(report.confirmations.len(), 1);
    assert_eq!(report.evaluation.unwrap().total_valid, 0);
}
