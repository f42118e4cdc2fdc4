use crate::confirm::thresholds::LevelThresholds;
use crate::consts::*;
use crate::error::{GestureError, GgResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub confirm: ConfirmParams,
    #[command(flatten)]
    pub telemetry: TelemetryParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmParams {
    // === DWELL & COOLDOWN ===
    #[arg(long, default_value_t = DEFAULT_DWELL_SECS)]
    pub dwell_time_secs: f64,
    #[arg(long, default_value_t = DEFAULT_COOLDOWN_SECS)]
    pub cooldown_secs: f64,

    // === STABILITY BUFFER ===
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub buffer_capacity: usize,
    #[arg(long, default_value_t = DEFAULT_MIN_STABLE_FRAMES)]
    pub min_stable_frames: usize,
    #[arg(long, default_value_t = MIN_USABLE_CONFIDENCE)]
    pub min_confidence: f32,

    // === LEVELS ===
    // level:threshold pairs; unknown levels fall back to the lowest threshold
    #[arg(long, default_value = "4:0.10,5:0.30,6:0.50,7:0.70,8:0.90")]
    pub level_thresholds: String,
    #[arg(long, default_value_t = 0.10)]
    pub fallback_threshold: f32,
    #[arg(long, default_value_t = DEFAULT_LEVEL)]
    pub default_level: u8,

    #[arg(long, default_value_t = DEFAULT_LATENCY_BUDGET_MS)]
    pub latency_budget_ms: f32,
}

impl Default for ConfirmParams {
    fn default() -> Self {
        Self {
            dwell_time_secs: DEFAULT_DWELL_SECS,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            min_stable_frames: DEFAULT_MIN_STABLE_FRAMES,
            min_confidence: MIN_USABLE_CONFIDENCE,
            level_thresholds: "4:0.10,5:0.30,6:0.50,7:0.70,8:0.90".to_string(),
            fallback_threshold: 0.10,
            default_level: DEFAULT_LEVEL,
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryParams {
    #[arg(long, default_value_t = DEFAULT_TELEMETRY_INTERVAL_SECS)]
    pub telemetry_interval_secs: f64,
    #[arg(long, default_value = "debug_logs")]
    pub telemetry_dir: String,
}

impl Default for TelemetryParams {
    fn default() -> Self {
        Self {
            telemetry_interval_secs: DEFAULT_TELEMETRY_INTERVAL_SECS,
            telemetry_dir: "debug_logs".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GgResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GgResult<()> {
        self.confirm.validate()?;
        self.telemetry.validate()
    }

    /// Overrides file values with flags the user actually typed.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        self.confirm.merge_from_cli(&cli.confirm, matches);
        self.telemetry.merge_from_cli(&cli.telemetry, matches);
    }
}

macro_rules! update_if_present {
    ($self:ident, $cli:ident, $matches:ident, $field:ident) => {
        if $matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
            $self.$field = $cli.$field.clone();
        }
    };
}

fn secs_to_duration(name: &str, secs: f64) -> GgResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| GestureError::Config(format!("{} = {}: {}", name, secs, e)))
}

impl ConfirmParams {
    pub fn dwell(&self) -> GgResult<Duration> {
        secs_to_duration("dwell_time_secs", self.dwell_time_secs)
    }

    pub fn cooldown(&self) -> GgResult<Duration> {
        secs_to_duration("cooldown_secs", self.cooldown_secs)
    }

    pub fn get_level_thresholds(&self) -> GgResult<LevelThresholds> {
        LevelThresholds::parse(&self.level_thresholds, self.fallback_threshold)
    }

    pub fn validate(&self) -> GgResult<()> {
        if !self.dwell_time_secs.is_finite() || self.dwell_time_secs <= 0.0 {
            return Err(GestureError::Config(format!(
                "dwell_time_secs must be positive, got {}",
                self.dwell_time_secs
            )));
        }
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(GestureError::Config(format!(
                "cooldown_secs must be non-negative, got {}",
                self.cooldown_secs
            )));
        }
        self.dwell()?;
        self.cooldown()?;
        if self.buffer_capacity == 0 {
            return Err(GestureError::Config(
                "buffer_capacity must be at least 1".to_string(),
            ));
        }
        if self.min_stable_frames > self.buffer_capacity {
            return Err(GestureError::Config(format!(
                "min_stable_frames ({}) can never be reached with buffer_capacity {}",
                self.min_stable_frames, self.buffer_capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(GestureError::Config(format!(
                "min_confidence must lie in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.fallback_threshold) {
            return Err(GestureError::Config(format!(
                "fallback_threshold must lie in [0, 1], got {}",
                self.fallback_threshold
            )));
        }
        self.get_level_thresholds().map(|_| ())
    }

    pub fn merge_from_cli(&mut self, cli: &ConfirmParams, matches: &ArgMatches) {
        update_if_present!(self, cli, matches, dwell_time_secs);
        update_if_present!(self, cli, matches, cooldown_secs);
        update_if_present!(self, cli, matches, buffer_capacity);
        update_if_present!(self, cli, matches, min_stable_frames);
        update_if_present!(self, cli, matches, min_confidence);
        update_if_present!(self, cli, matches, level_thresholds);
        update_if_present!(self, cli, matches, fallback_threshold);
        update_if_present!(self, cli, matches, default_level);
        update_if_present!(self, cli, matches, latency_budget_ms);
    }
}

impl TelemetryParams {
    /// Sampling interval, floored at 10 ms.
    pub fn interval(&self) -> GgResult<Duration> {
        secs_to_duration("telemetry_interval_secs", self.telemetry_interval_secs.max(0.01))
    }

    pub fn validate(&self) -> GgResult<()> {
        if !self.telemetry_interval_secs.is_finite() || self.telemetry_interval_secs < 0.0 {
            return Err(GestureError::Config(format!(
                "telemetry_interval_secs must be non-negative, got {}",
                self.telemetry_interval_secs
            )));
        }
        self.interval().map(|_| ())
    }

    pub fn merge_from_cli(&mut self, cli: &TelemetryParams, matches: &ArgMatches) {
        update_if_present!(self, cli, matches, telemetry_interval_secs);
        update_if_present!(self, cli, matches, telemetry_dir);
    }
}
