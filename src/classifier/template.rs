use super::{GestureLabel, GestureModel, ModelInput};
use crate::consts::{DEFAULT_TEMPLATE_TEMPERATURE, FEATURE_LEN, LABEL_COUNT};
use crate::error::{GestureError, GgResult};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub label: GestureLabel,
    pub features: Vec<f32>,
}

/// Nearest-template classifier: softmax over negative squared distances to the
/// closest template of each label. Labels without templates get probability 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateModel {
    pub templates: Vec<Template>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPLATE_TEMPERATURE
}

impl TemplateModel {
    pub fn new(templates: Vec<Template>, temperature: f32) -> GgResult<Self> {
        let model = Self {
            templates,
            temperature,
        };
        model.validate()?;
        Ok(model)
    }

    /// One centroid template per label from labelled samples.
    pub fn fit(samples: &[(GestureLabel, FeatureVector)], temperature: f32) -> GgResult<Self> {
        let mut sums = vec![[0.0f64; FEATURE_LEN]; LABEL_COUNT];
        let mut counts = [0usize; LABEL_COUNT];

        for (label, features) in samples {
            let idx = label.id() as usize;
            counts[idx] += 1;
            for (acc, &v) in sums[idx].iter_mut().zip(features.iter()) {
                *acc += v as f64;
            }
        }

        let templates = (0..LABEL_COUNT)
            .filter(|&i| counts[i] > 0)
            .filter_map(|i| {
                let label = GestureLabel::from_index(i)?;
                let n = counts[i] as f64;
                Some(Template {
                    label,
                    features: sums[i].iter().map(|s| (s / n) as f32).collect(),
                })
            })
            .collect();

        debug!("Fitted template model from {} samples", samples.len());
        Self::new(templates, temperature)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GgResult<Self> {
        let content = fs::read_to_string(path)?;
        let model: TemplateModel = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> GgResult<()> {
        if self.templates.is_empty() {
            return Err(GestureError::Model("template model has no templates".to_string()));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(GestureError::Model(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if let Some(t) = self.templates.iter().find(|t| t.features.len() != FEATURE_LEN) {
            return Err(GestureError::Model(format!(
                "template for {} has {} features, expected {}",
                t.label,
                t.features.len(),
                FEATURE_LEN
            )));
        }
        Ok(())
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl GestureModel for TemplateModel {
    fn predict(&self, input: &ModelInput) -> GgResult<Vec<f32>> {
        if input.data.len() != FEATURE_LEN {
            return Err(GestureError::Model(format!(
                "input has {} features, expected {}",
                input.data.len(),
                FEATURE_LEN
            )));
        }

        let mut nearest = [f32::INFINITY; LABEL_COUNT];
        for t in &self.templates {
            let d = squared_distance(&input.data, &t.features);
            let slot = &mut nearest[t.label.id() as usize];
            *slot = slot.min(d);
        }

        // Shift by the best distance so the winning logit is 0 and exp() stays in range.
        let best = nearest.iter().copied().fold(f32::INFINITY, f32::min);
        let weights: Vec<f32> = nearest
            .iter()
            .map(|&d| {
                if d.is_finite() {
                    (-(d - best) / self.temperature).exp()
                } else {
                    0.0
                }
            })
            .collect();

        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return Err(GestureError::Model("degenerate template distances".to_string()));
        }
        Ok(weights.into_iter().map(|w| w / total).collect())
    }
}
