//! Reference hand poses for the four gestures.
//!
//! A right hand seen from the camera, wrist at the origin, fingers pointing up
//! the image (negative y), palm facing the camera. Used to fit a template
//! model, to drive scripted sources in simulations and for benchmarks.

use crate::classifier::{GestureLabel, TemplateModel};
use crate::consts::LANDMARK_COUNT;
use crate::error::GgResult;
use crate::features::engineer_features;
use crate::landmarks::{LandmarkSet, Point3};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finger {
    Extended,
    Half,
    Curled,
}

// MCP joints for index, middle, ring and pinky
const KNUCKLES: [(f32, f32); 4] = [(-0.15, -0.50), (0.0, -0.52), (0.13, -0.50), (0.25, -0.45)];

// Offsets of PIP, DIP and TIP from the knuckle
fn finger_offsets(shape: Finger) -> [(f32, f32, f32); 3] {
    match shape {
        Finger::Extended => [(0.0, -0.25, 0.0), (0.0, -0.45, 0.0), (0.0, -0.63, 0.0)],
        Finger::Half => [(0.0, -0.20, -0.08), (0.0, -0.30, -0.20), (0.0, -0.30, -0.32)],
        Finger::Curled => [(0.0, -0.15, -0.10), (0.0, -0.05, -0.20), (0.0, 0.08, -0.10)],
    }
}

fn thumb(label: GestureLabel) -> [(f32, f32, f32); 4] {
    match label {
        GestureLabel::Palm | GestureLabel::ThumbIndex => [
            (-0.25, -0.10, 0.0),
            (-0.40, -0.20, 0.0),
            (-0.55, -0.30, 0.0),
            (-0.70, -0.38, 0.0),
        ],
        GestureLabel::Fist => [
            (-0.25, -0.10, 0.0),
            (-0.20, -0.25, -0.08),
            (-0.02, -0.32, -0.12),
            (0.15, -0.35, -0.12),
        ],
        // Thumb tip meets the index tip
        GestureLabel::Grabbing => [
            (-0.25, -0.10, 0.0),
            (-0.30, -0.35, -0.10),
            (-0.22, -0.60, -0.20),
            (-0.12, -0.75, -0.28),
        ],
    }
}

fn fingers(label: GestureLabel) -> [Finger; 4] {
    match label {
        GestureLabel::Palm => [Finger::Extended; 4],
        GestureLabel::Fist => [Finger::Curled; 4],
        GestureLabel::ThumbIndex => [
            Finger::Extended,
            Finger::Curled,
            Finger::Curled,
            Finger::Curled,
        ],
        GestureLabel::Grabbing => [Finger::Half; 4],
    }
}

/// The reference pose for `label`.
pub fn canonical(label: GestureLabel) -> LandmarkSet {
    let mut points = [Point3::ZERO; LANDMARK_COUNT];

    for (i, (x, y, z)) in thumb(label).into_iter().enumerate() {
        points[1 + i] = Point3::new(x, y, z);
    }
    for (f, (shape, (kx, ky))) in fingers(label).into_iter().zip(KNUCKLES).enumerate() {
        let base = 5 + f * 4;
        points[base] = Point3::new(kx, ky, 0.0);
        for (j, (dx, dy, dz)) in finger_offsets(shape).into_iter().enumerate() {
            points[base + 1 + j] = Point3::new(kx + dx, ky + dy, dz);
        }
    }

    LandmarkSet::new(points)
}

/// `canonical(label)` placed at `origin`, scaled by `scale`, with uniform
/// per-coordinate noise in `[-noise, noise]`.
pub fn placed(
    label: GestureLabel,
    origin: Point3,
    scale: f32,
    noise: f32,
    rng: &mut fastrand::Rng,
) -> LandmarkSet {
    let base = canonical(label);
    let mut points = *base.points();
    for p in points.iter_mut() {
        let mut jitter = || {
            if noise > 0.0 {
                (rng.f32() * 2.0 - 1.0) * noise
            } else {
                0.0
            }
        };
        *p = Point3::new(
            origin.x + p.x * scale + jitter(),
            origin.y + p.y * scale + jitter(),
            origin.z + p.z * scale + jitter(),
        );
    }
    LandmarkSet::new(points)
}

/// Template model fitted on the reference poses.
pub fn reference_model(temperature: f32) -> GgResult<TemplateModel> {
    let samples = GestureLabel::iter()
        .map(|label| Ok((label, engineer_features(&canonical(label))?)))
        .collect::<GgResult<Vec<_>>>()?;
    TemplateModel::fit(&samples, temperature)
}
