use crate::consts::DEFAULT_LEVEL;
use crate::error::{GestureError, GgResult};
use tracing::warn;

/// Minimum confidence a confirmed gesture needs to count as valid, per level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelThresholds {
    table: Vec<(u8, f32)>,
    fallback: f32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            table: vec![(4, 0.10), (5, 0.30), (6, 0.50), (7, 0.70), (8, 0.90)],
            fallback: 0.10,
        }
    }
}

impl LevelThresholds {
    pub fn new(mut table: Vec<(u8, f32)>, fallback: f32) -> Self {
        table.sort_by_key(|&(level, _)| level);
        table.dedup_by_key(|&mut (level, _)| level);
        Self { table, fallback }
    }

    /// Parses `"4:0.10,5:0.30"` style definitions.
    pub fn parse(s: &str, fallback: f32) -> GgResult<Self> {
        let mut table = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (level, threshold) = part.split_once(':').ok_or_else(|| {
                GestureError::Config(format!("level threshold '{}' is not 'level:value'", part))
            })?;
            let level: u8 = level.trim().parse().map_err(|_| {
                GestureError::Config(format!("invalid level '{}' in level thresholds", level))
            })?;
            let threshold: f32 = threshold.trim().parse().map_err(|_| {
                GestureError::Config(format!("invalid threshold '{}' for level {}", threshold, level))
            })?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(GestureError::Config(format!(
                    "threshold {} for level {} is outside [0, 1]",
                    threshold, level
                )));
            }
            if table.iter().any(|&(l, _)| l == level) {
                return Err(GestureError::Config(format!("level {} defined twice", level)));
            }
            table.push((level, threshold));
        }
        Ok(Self::new(table, fallback))
    }

    pub fn threshold_for(&self, level: u8) -> f32 {
        self.table
            .iter()
            .find(|&&(l, _)| l == level)
            .map(|&(_, t)| t)
            .unwrap_or(self.fallback)
    }

    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.table.iter().map(|&(l, _)| l)
    }
}

/// Reads the level number out of keys such as `"LEVEL_5"`.
/// Anything else (e.g. `"TRIAL"`) maps to the default level.
pub fn level_from_key(key: &str) -> u8 {
    match key.split_once("LEVEL_") {
        Some((_, rest)) => {
            let digits = rest.split('_').next().unwrap_or("");
            match digits.parse::<u8>() {
                Ok(level) => level,
                Err(_) => {
                    warn!("Cannot read level number from '{}', using level {}", key, DEFAULT_LEVEL);
                    DEFAULT_LEVEL
                }
            }
        }
        None => DEFAULT_LEVEL,
    }
}
