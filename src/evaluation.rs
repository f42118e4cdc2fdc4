use crate::classifier::GestureLabel;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// One confirmation, valid or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    pub label: GestureLabel,
    pub confidence: f32,
    pub avg_confidence: f32,
    pub stability: usize,
    pub level: u8,
    pub threshold: f32,
    pub valid: bool,
    pub latency_ms: f32,
    pub at_secs: f64,
}

/// Session-wide counters. Nothing here is ever reset until the session ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub total_confirmed: u32,
    pub total_valid: u32,
    pub confidence_samples: Vec<f32>,
    pub confirmed_prediction_latencies_ms: Vec<f32>,
    pub log: Vec<ConfirmationRecord>,
    pub latency_budget_overruns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelEvaluation {
    pub total_valid: u32,
    pub total_all: u32,
    pub valid_ratio_pct: f32,
    pub avg_confidence_pct: f32,
    pub avg_latency_ms: f32,
    pub total_latency_ms: f32,
}

impl EvaluationStats {
    pub fn record(&mut self, record: &ConfirmationRecord) {
        self.total_confirmed += 1;
        if record.valid {
            self.total_valid += 1;
        }
        self.confidence_samples.push(record.confidence);
        self.confirmed_prediction_latencies_ms.push(record.latency_ms);
        self.log.push(record.clone());
    }

    pub fn note_latency_overrun(&mut self) {
        self.latency_budget_overruns += 1;
    }

    /// Cumulative summary; `None` until something has been confirmed.
    pub fn evaluate(&self) -> Option<LevelEvaluation> {
        if self.total_confirmed == 0 {
            return None;
        }

        let total_all = self.total_confirmed;
        let valid_ratio_pct = self.total_valid as f32 / total_all as f32 * 100.0;
        let avg_confidence_pct = mean(&self.confidence_samples) * 100.0;
        let total_latency_ms: f32 = self.confirmed_prediction_latencies_ms.iter().sum();
        let avg_latency_ms = mean(&self.confirmed_prediction_latencies_ms);

        Some(LevelEvaluation {
            total_valid: self.total_valid,
            total_all,
            valid_ratio_pct,
            avg_confidence_pct,
            avg_latency_ms,
            total_latency_ms,
        })
    }

    pub fn per_label_counts(&self) -> Vec<(GestureLabel, u32, u32)> {
        GestureLabel::iter()
            .map(|label| {
                let (total, valid) = self
                    .log
                    .iter()
                    .filter(|r| r.label == label)
                    .fold((0, 0), |(t, v), r| (t + 1, v + r.valid as u32));
                (label, total, valid)
            })
            .collect()
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}
