//! Per-frame gesture pipeline: landmarks -> features -> classifier ->
//! confirmation engine, plus the consumer-facing action hand-off.

use crate::classifier::{Classification, ClassifierAdapter, Direction, GestureLabel, GestureModel};
use crate::config::ConfirmParams;
use crate::confirm::{level_from_key, ConfirmationEngine, FrameOutcome, Gate};
use crate::error::GgResult;
use crate::evaluation::LevelEvaluation;
use crate::features::engineer_features;
use crate::landmarks::{LandmarkSet, LandmarkSource};
use crate::telemetry::{unix_now_secs, LandmarkStatus, SnapshotBoard, TelemetrySnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Session time source.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Wall time elapsed since construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for replays and tests. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Duration) {
        self.micros.store(t.as_micros() as u64, Ordering::SeqCst);
    }

    pub fn advance(&self, dt: Duration) {
        self.micros.fetch_add(dt.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

pub struct GesturePipeline<S: LandmarkSource, M: GestureModel> {
    source: S,
    classifier: ClassifierAdapter<M>,
    engine: ConfirmationEngine,
    clock: Box<dyn Clock>,
    board: SnapshotBoard,
    latency_budget_ms: f32,
    available: bool,
    released: bool,

    // Debug readouts, mirrored into each published snapshot
    game_fps: f32,
    processing_latency_ms: f32,
    last_confidence: f32,
    last_label: Option<GestureLabel>,
    landmark_status: LandmarkStatus,
}

impl<S: LandmarkSource, M: GestureModel> GesturePipeline<S, M> {
    pub fn new(source: S, classifier: ClassifierAdapter<M>, params: &ConfirmParams) -> GgResult<Self> {
        Self::with_clock(source, classifier, params, Box::new(MonotonicClock::default()))
    }

    pub fn with_clock(
        source: S,
        classifier: ClassifierAdapter<M>,
        params: &ConfirmParams,
        clock: Box<dyn Clock>,
    ) -> GgResult<Self> {
        let engine = ConfirmationEngine::from_config(params)?;

        let available = source.is_available();
        if !available {
            error!("No landmark source could be opened; gesture input is unavailable for this session.");
        }
        if !classifier.is_enabled() {
            warn!("No gesture model loaded; gesture recognition is disabled.");
        }

        Ok(Self {
            source,
            classifier,
            engine,
            clock,
            board: SnapshotBoard::new(),
            latency_budget_ms: params.latency_budget_ms,
            available,
            released: false,
            game_fps: 0.0,
            processing_latency_ms: 0.0,
            last_confidence: 0.0,
            last_label: None,
            landmark_status: if available {
                LandmarkStatus::NotDetected
            } else {
                LandmarkStatus::Unavailable
            },
        })
    }

    /// Runs one frame at the clock's current time.
    pub fn process(&mut self) -> FrameOutcome {
        let now = self.clock.now();
        self.process_at(now)
    }

    /// Runs one frame at an explicit session time. Never fails: every fault
    /// degrades to a no-op or "no prediction" frame.
    pub fn process_at(&mut self, now: Duration) -> FrameOutcome {
        let start = Instant::now();
        let outcome = self.run_frame(now);
        self.processing_latency_ms = start.elapsed().as_secs_f32() * 1000.0;
        self.publish();
        outcome
    }

    fn run_frame(&mut self, now: Duration) -> FrameOutcome {
        // Skip acquisition entirely while cooling
        if self.engine.gate(now) == Gate::Cooling {
            return FrameOutcome::Cooling;
        }

        if !self.available || self.released {
            self.last_confidence = 0.0;
            self.last_label = None;
            return self.engine.step(now, None);
        }

        let landmarks = match self.source.read() {
            Ok(l) => l,
            Err(e) => {
                warn!("Exception in process(): {}", e);
                return FrameOutcome::Skipped;
            }
        };

        self.last_confidence = 0.0;
        self.last_label = None;

        let observed = match landmarks {
            None => {
                self.landmark_status = LandmarkStatus::NotDetected;
                None
            }
            Some(set) => {
                self.landmark_status = LandmarkStatus::Detected(set.points().len());
                self.classify(&set)
            }
        };

        self.engine.step(now, observed)
    }

    fn classify(&mut self, landmarks: &LandmarkSet) -> Option<Classification> {
        let features = match engineer_features(landmarks) {
            Ok(f) => f,
            Err(e) => {
                warn!("Error during gesture prediction: {}", e);
                return None;
            }
        };

        let classified = self.classifier.classify(&features)?;
        if classified.inference_ms > self.latency_budget_ms {
            warn!(
                "Classification took {:.2}ms (budget {:.2}ms)",
                classified.inference_ms, self.latency_budget_ms
            );
            self.engine.stats_mut().note_latency_overrun();
        }

        self.last_confidence = classified.prediction.confidence;
        self.last_label = Some(classified.prediction.label);
        Some(classified)
    }

    fn publish(&self) {
        self.board.publish(self.snapshot());
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            timestamp_secs: unix_now_secs(),
            fps: self.game_fps,
            latency_ms: self.processing_latency_ms,
            landmark_status: self.landmark_status,
            confidence: self.last_confidence,
            label_id: self.last_label.map(|l| l.id()),
        }
    }

    // --- Consumer interface ---

    /// The confirmed action, handed out once.
    pub fn consume_action(&mut self) -> Option<GestureLabel> {
        self.engine.consume_action()
    }

    pub fn consume_direction(&mut self) -> Option<Direction> {
        self.engine.consume_direction()
    }

    /// Dwell completion in `[0, 1]` for the UI clock.
    pub fn get_dwell_progress(&self) -> f32 {
        self.engine.dwell_progress(self.clock.now())
    }

    pub fn dwell_progress_at(&self, now: Duration) -> f32 {
        self.engine.dwell_progress(now)
    }

    pub fn evaluate_level(&self) -> Option<LevelEvaluation> {
        self.engine.evaluate_level()
    }

    pub fn set_level(&mut self, level: u8) {
        self.engine.set_level(level);
    }

    /// Accepts level keys such as `"LEVEL_7"`; other keys select the default level.
    pub fn set_level_key(&mut self, key: &str) {
        self.engine.set_level(level_from_key(key));
    }

    pub fn level(&self) -> u8 {
        self.engine.level()
    }

    pub fn set_game_fps(&mut self, fps: f32) {
        self.game_fps = fps;
    }

    // --- Accessors ---

    pub fn engine(&self) -> &ConfirmationEngine {
        &self.engine
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn board(&self) -> SnapshotBoard {
        self.board.clone()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn processing_latency_ms(&self) -> f32 {
        self.processing_latency_ms
    }

    pub fn landmark_status(&self) -> LandmarkStatus {
        self.landmark_status
    }

    pub fn last_prediction(&self) -> Option<(GestureLabel, f32)> {
        self.last_label.map(|l| (l, self.last_confidence))
    }

    /// Releases the landmark source. Only the first call reaches the source.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.available {
            self.source.release();
        }
        info!("Landmark source released.");
    }
}

impl<S: LandmarkSource, M: GestureModel> Drop for GesturePipeline<S, M> {
    fn drop(&mut self) {
        self.release();
    }
}
