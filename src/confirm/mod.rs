pub mod engine;
pub mod state;
pub mod thresholds;

pub use self::engine::Gate;
pub use self::state::{ConfirmationState, DwellTimer, Phase, StabilityBuffer};
pub use self::thresholds::{level_from_key, LevelThresholds};
use crate::classifier::{Classification, Direction, GestureLabel};
use crate::config::ConfirmParams;
use crate::consts::*;
use crate::error::GgResult;
use crate::evaluation::{ConfirmationRecord, EvaluationStats, LevelEvaluation};
use std::time::Duration;
use tracing::info;

/// What a single frame did to the confirmation cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The frame could not be acquired; nothing changed.
    Skipped,
    Cooling,
    NoPrediction,
    Tracking { label: GestureLabel, progress: f32 },
    Confirmed(ConfirmationRecord),
}

impl FrameOutcome {
    pub fn confirmation(&self) -> Option<&ConfirmationRecord> {
        match self {
            Self::Confirmed(record) => Some(record),
            _ => None,
        }
    }
}

/// Resolved, validated engine parameters.
#[derive(Debug, Clone)]
pub struct EngineParams {
    pub dwell: Duration,
    pub cooldown: Duration,
    pub buffer_capacity: usize,
    pub min_stable_frames: usize,
    pub min_confidence: f32,
    pub thresholds: LevelThresholds,
    pub default_level: u8,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs_f64(DEFAULT_DWELL_SECS),
            cooldown: Duration::from_secs_f64(DEFAULT_COOLDOWN_SECS),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            min_stable_frames: DEFAULT_MIN_STABLE_FRAMES,
            min_confidence: MIN_USABLE_CONFIDENCE,
            thresholds: LevelThresholds::default(),
            default_level: DEFAULT_LEVEL,
        }
    }
}

impl EngineParams {
    pub fn from_config(cfg: &ConfirmParams) -> GgResult<Self> {
        cfg.validate()?;
        Ok(Self {
            dwell: cfg.dwell()?,
            cooldown: cfg.cooldown()?,
            buffer_capacity: cfg.buffer_capacity,
            min_stable_frames: cfg.min_stable_frames,
            min_confidence: cfg.min_confidence,
            thresholds: cfg.get_level_thresholds()?,
            default_level: cfg.default_level,
        })
    }
}

/// Owns the per-session state and counters and drives [`engine::advance`].
#[derive(Debug, Clone)]
pub struct ConfirmationEngine {
    params: EngineParams,
    state: ConfirmationState,
    stats: EvaluationStats,
    level: u8,
}

impl Default for ConfirmationEngine {
    fn default() -> Self {
        Self::new(EngineParams::default())
    }
}

impl ConfirmationEngine {
    pub fn new(params: EngineParams) -> Self {
        Self {
            state: ConfirmationState::new(params.buffer_capacity),
            stats: EvaluationStats::default(),
            level: params.default_level,
            params,
        }
    }

    pub fn from_config(cfg: &ConfirmParams) -> GgResult<Self> {
        Ok(Self::new(EngineParams::from_config(cfg)?))
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn stats(&self) -> &EvaluationStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut EvaluationStats {
        &mut self.stats
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn set_level(&mut self, level: u8) {
        if level != self.level {
            info!(
                "Level set to {} (threshold {:.0}%)",
                level,
                self.params.thresholds.threshold_for(level) * 100.0
            );
        }
        self.level = level;
    }

    pub fn current_threshold(&self) -> f32 {
        self.params.thresholds.threshold_for(self.level)
    }

    /// Evaluates the cooldown gate on its own so a caller can skip acquisition
    /// and classification entirely while cooling.
    pub fn gate(&mut self, now: Duration) -> Gate {
        engine::cooldown_gate(&mut self.state, now)
    }

    /// Feeds one frame. Predictions under the usable-confidence floor count as
    /// no prediction.
    pub fn step(&mut self, now: Duration, observed: Option<Classification>) -> FrameOutcome {
        let usable = observed.filter(|c| c.prediction.confidence >= self.params.min_confidence);
        engine::advance(
            &mut self.state,
            &mut self.stats,
            &self.params,
            self.level,
            now,
            usable,
        )
    }

    /// Hands the pending confirmed action over exactly once.
    pub fn consume_action(&mut self) -> Option<GestureLabel> {
        self.state.take_pending()
    }

    pub fn consume_direction(&mut self) -> Option<Direction> {
        self.consume_action().map(|label| label.direction())
    }

    pub fn dwell_progress(&self, now: Duration) -> f32 {
        self.state
            .held_for(now)
            .map(|held| engine::progress(held, self.params.dwell))
            .unwrap_or(0.0)
    }

    pub fn phase(&self, now: Duration) -> Phase {
        if self.state.cooldown_active && now < self.state.cooldown_end {
            return Phase::Cooling;
        }
        match self.state.potential {
            Some(timer) if now.saturating_sub(timer.started_at) >= self.params.dwell => {
                Phase::Held(timer.label)
            }
            Some(timer) => Phase::Tracking(timer.label),
            None => Phase::Idle,
        }
    }

    pub fn evaluate_level(&self) -> Option<LevelEvaluation> {
        let eval = self.stats.evaluate();
        match &eval {
            Some(e) => info!(
                "Level evaluation: {} valid of {} gestures, avg confidence {:.2}%",
                e.total_valid, e.total_all, e.avg_confidence_pct
            ),
            None => info!("No gesture has been confirmed yet."),
        }
        eval
    }
}
