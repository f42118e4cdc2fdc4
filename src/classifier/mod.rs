//! Classifier adapter.
//!
//! The gesture model itself is opaque: it receives a reshaped feature vector
//! and returns one probability per label. Everything that can go wrong inside
//! it is mapped to "no prediction" at this boundary.

pub mod template;

use crate::consts::LABEL_COUNT;
use crate::error::{GestureError, GgResult};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use strum_macros::{Display, EnumCount, EnumIter, EnumString};
use tracing::warn;

pub use self::template::TemplateModel;

/// Gesture labels in model output order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    EnumCount,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    Palm,
    Fist,
    ThumbIndex,
    Grabbing,
}

/// Movement directions used by the game layer. Label ids are reused verbatim
/// as direction ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl GestureLabel {
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::Palm),
            1 => Some(Self::Fist),
            2 => Some(Self::ThumbIndex),
            3 => Some(Self::Grabbing),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Palm => "Palm",
            Self::Fist => "Fist",
            Self::ThumbIndex => "Thumb Index",
            Self::Grabbing => "Grabbing",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Palm => Direction::Up,
            Self::Fist => Direction::Down,
            Self::ThumbIndex => Direction::Right,
            Self::Grabbing => Direction::Left,
        }
    }
}

impl Direction {
    /// Tile offset `(dx, dy)` in screen coordinates (y grows downwards).
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Right => (1, 0),
            Self::Left => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: GestureLabel,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: GestureLabel, confidence: f32) -> Self {
        Self { label, confidence }
    }
}

/// Model input tensor: `[batch, sequence, features]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub shape: [usize; 3],
    pub data: Vec<f32>,
}

impl ModelInput {
    pub fn from_features(features: &FeatureVector) -> Self {
        Self {
            shape: [1, 1, features.len()],
            data: features.to_vec(),
        }
    }
}

pub trait GestureModel: Send {
    /// One probability per label, in [`GestureLabel`] order.
    fn predict(&self, input: &ModelInput) -> GgResult<Vec<f32>>;
}

impl<F> GestureModel for F
where
    F: Fn(&ModelInput) -> GgResult<Vec<f32>> + Send,
{
    fn predict(&self, input: &ModelInput) -> GgResult<Vec<f32>> {
        self(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub prediction: Prediction,
    pub inference_ms: f32,
}

impl From<Prediction> for Classification {
    fn from(prediction: Prediction) -> Self {
        Self {
            prediction,
            inference_ms: 0.0,
        }
    }
}

/// Index and value of the largest probability. Ties resolve to the first label.
pub fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
}

pub struct ClassifierAdapter<M: GestureModel> {
    model: Option<M>,
}

impl<M: GestureModel> ClassifierAdapter<M> {
    pub fn new(model: M) -> Self {
        Self { model: Some(model) }
    }

    /// Adapter without a model: every frame classifies to nothing.
    pub fn disabled() -> Self {
        Self { model: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Runs the model on one feature vector. Never fails; faults are logged.
    pub fn classify(&self, features: &FeatureVector) -> Option<Classification> {
        let model = self.model.as_ref()?;
        let input = ModelInput::from_features(features);

        let start = Instant::now();
        let result = model.predict(&input).and_then(|probs| interpret(&probs));
        let inference_ms = start.elapsed().as_secs_f32() * 1000.0;

        match result {
            Ok(prediction) => Some(Classification {
                prediction,
                inference_ms,
            }),
            Err(e) => {
                warn!("Error during gesture prediction: {}", e);
                None
            }
        }
    }
}

fn interpret(probs: &[f32]) -> GgResult<Prediction> {
    if probs.len() != LABEL_COUNT {
        return Err(GestureError::Model(format!(
            "expected {} probabilities, got {}",
            LABEL_COUNT,
            probs.len()
        )));
    }
    if probs.iter().any(|p| !p.is_finite()) {
        return Err(GestureError::Model(
            "model returned non-finite probabilities".to_string(),
        ));
    }

    let (idx, confidence) =
        argmax(probs).ok_or_else(|| GestureError::Model("empty model output".to_string()))?;
    let label = GestureLabel::from_index(idx)
        .ok_or_else(|| GestureError::Model(format!("label index {} out of range", idx)))?;

    Ok(Prediction::new(label, confidence.clamp(0.0, 1.0)))
}
