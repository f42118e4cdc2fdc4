//! Prediction traces: recorded `(time, label, confidence)` streams that can be
//! replayed through the confirmation engine without a camera or model, and a
//! synthetic scenario generator for the same format.

use crate::classifier::{Classification, GestureLabel, Prediction};
use crate::confirm::{ConfirmationEngine, FrameOutcome};
use crate::error::{GestureError, GgResult};
use crate::evaluation::{ConfirmationRecord, LevelEvaluation};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceFrame {
    pub at: Duration,
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub frames: Vec<TraceFrame>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TraceRow {
    time_s: f64,
    label: String,
    confidence: Option<f32>,
}

/// Accepts a label id (`"1"`), a label name (`"fist"`, `"Thumb_Index"`) or an
/// empty string for "no prediction".
pub fn parse_label(raw: &str) -> GgResult<Option<GestureLabel>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if let Ok(idx) = raw.parse::<usize>() {
        return GestureLabel::from_index(idx)
            .map(Some)
            .ok_or_else(|| GestureError::Validation(format!("unknown label id {}", idx)));
    }
    GestureLabel::from_str(raw)
        .map(Some)
        .map_err(|_| GestureError::Validation(format!("unknown label '{}'", raw)))
}

impl Trace {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.frames.last().map(|f| f.at).unwrap_or_default()
    }

    pub fn from_reader<R: Read>(reader: R) -> GgResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut frames = Vec::new();
        let mut last = Duration::ZERO;
        for (idx, result) in rdr.deserialize::<TraceRow>().enumerate() {
            let row = result?;
            let row_no = idx + 2;

            if !row.time_s.is_finite() || row.time_s < 0.0 {
                return Err(GestureError::Validation(format!(
                    "row {}: invalid time {}",
                    row_no, row.time_s
                )));
            }
            let at = Duration::try_from_secs_f64(row.time_s).map_err(|e| {
                GestureError::Validation(format!("row {}: time {}: {}", row_no, row.time_s, e))
            })?;
            if at < last {
                return Err(GestureError::Validation(format!(
                    "row {}: time goes backwards ({:.3}s < {:.3}s)",
                    row_no,
                    row.time_s,
                    last.as_secs_f64()
                )));
            }
            last = at;

            let prediction = match parse_label(&row.label)? {
                None => None,
                Some(label) => {
                    let confidence = row.confidence.ok_or_else(|| {
                        GestureError::Validation(format!("row {}: missing confidence", row_no))
                    })?;
                    if !(0.0..=1.0).contains(&confidence) {
                        return Err(GestureError::Validation(format!(
                            "row {}: confidence {} outside [0, 1]",
                            row_no, confidence
                        )));
                    }
                    Some(Prediction::new(label, confidence))
                }
            };

            frames.push(TraceFrame { at, prediction });
        }

        Ok(Self { frames })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GgResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GestureError::Config(format!("Could not open trace '{}': {}", path.display(), e))
        })?;
        let trace = Self::from_reader(file)?;
        info!(
            "Loaded {} frames ({:.2}s) from {}",
            trace.len(),
            trace.duration().as_secs_f64(),
            path.display()
        );
        Ok(trace)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> GgResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for frame in &self.frames {
            let (label, confidence) = match frame.prediction {
                Some(p) => (p.label.id().to_string(), Some(p.confidence)),
                None => (String::new(), None),
            };
            wtr.serialize(TraceRow {
                time_s: frame.at.as_secs_f64(),
                label,
                confidence,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GgResult<()> {
        self.write_to(File::create(path)?)
    }
}

// --- Synthetic scenarios ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub label: Option<GestureLabel>,
    pub secs: f64,
}

/// Parses `"fist:2.0,none:0.5,palm:2.5"`.
pub fn parse_script(script: &str) -> GgResult<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for part in script.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (label, secs) = part
            .split_once(':')
            .ok_or_else(|| GestureError::Validation(format!("bad script step '{}'", part)))?;
        let secs: f64 = secs
            .trim()
            .parse()
            .map_err(|_| GestureError::Validation(format!("bad duration in '{}'", part)))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(GestureError::Validation(format!(
                "negative duration in '{}'",
                part
            )));
        }
        steps.push(ScriptStep {
            label: parse_label(label)?,
            secs,
        });
    }
    if steps.is_empty() {
        return Err(GestureError::Validation("empty script".to_string()));
    }
    Ok(steps)
}

#[derive(Debug, Clone)]
pub struct SynthOptions {
    pub fps: f64,
    pub confidence: f32,
    /// Uniform confidence noise in `[-jitter, jitter]`.
    pub jitter: f32,
    pub seed: Option<u64>,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            fps: 30.0,
            confidence: 0.95,
            jitter: 0.0,
            seed: None,
        }
    }
}

/// Renders a script into frames at a fixed rate. Frame `k` sits at `k / fps`
/// seconds; each step covers `round(secs * fps)` frames.
pub fn synthesize(steps: &[ScriptStep], opts: &SynthOptions) -> GgResult<Trace> {
    if !opts.fps.is_finite() || opts.fps <= 0.0 {
        return Err(GestureError::Validation(format!("invalid fps {}", opts.fps)));
    }
    let mut rng = if let Some(s) = opts.seed {
        fastrand::Rng::with_seed(s)
    } else {
        fastrand::Rng::new()
    };

    let mut frames = Vec::new();
    let mut k: u64 = 0;
    for step in steps {
        let count = (step.secs * opts.fps).round() as u64;
        for _ in 0..count {
            let at = Duration::from_micros((k as f64 * 1_000_000.0 / opts.fps).round() as u64);
            let prediction = step.label.map(|label| {
                let noise = if opts.jitter > 0.0 {
                    (rng.f32() * 2.0 - 1.0) * opts.jitter
                } else {
                    0.0
                };
                Prediction::new(label, (opts.confidence + noise).clamp(0.0, 1.0))
            });
            frames.push(TraceFrame { at, prediction });
            k += 1;
        }
    }
    debug!("Synthesized {} frames from {} steps", frames.len(), steps.len());
    Ok(Trace { frames })
}

// --- Replay ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub level: u8,
    pub frames: usize,
    pub confirmations: Vec<ConfirmationRecord>,
    /// Actions drained after every frame, the way a game loop would.
    pub actions: Vec<GestureLabel>,
    pub evaluation: Option<LevelEvaluation>,
    /// `(label, confirmed, valid)` per gesture.
    pub label_counts: Vec<(GestureLabel, u32, u32)>,
}

/// Feeds every frame of `trace` through `engine`, consuming actions as they
/// become available.
pub fn replay(trace: &Trace, engine: &mut ConfirmationEngine) -> ReplayReport {
    let mut confirmations = Vec::new();
    let mut actions = Vec::new();

    for frame in &trace.frames {
        let observed = frame.prediction.map(Classification::from);
        if let FrameOutcome::Confirmed(record) = engine.step(frame.at, observed) {
            confirmations.push(record);
        }
        if let Some(action) = engine.consume_action() {
            actions.push(action);
        }
    }

    ReplayReport {
        level: engine.level(),
        frames: trace.len(),
        confirmations,
        actions,
        evaluation: engine.stats().evaluate(),
        label_counts: engine.stats().per_label_counts(),
    }
}
