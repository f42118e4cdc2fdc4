//! Feature engineering for the gesture classifier.
//!
//! Produces 76 values per frame: the 21 landmarks translated to the wrist and
//! scaled by the farthest landmark (63 values), followed by 13 inter-bone
//! angles in radians. The layout must stay byte-for-byte stable because the
//! classifier was trained on it.

use crate::consts::{ANGLE_COUNT, FEATURE_LEN, LANDMARK_COUNT};
use crate::error::{GestureError, GgResult};
use crate::landmarks::{LandmarkSet, Point3, INDEX_TIP, MIDDLE_MCP, PINKY_TIP, THUMB_TIP, WRIST};

pub type FeatureVector = [f32; FEATURE_LEN];

type Bone = (usize, usize);

/// Consecutive bones along each finger (joint bend).
pub const FLEXION_BONES: [(Bone, Bone); 10] = [
    ((0, 1), (1, 2)),
    ((1, 2), (2, 3)),
    ((0, 5), (5, 6)),
    ((5, 6), (6, 7)),
    ((0, 9), (9, 10)),
    ((9, 10), (10, 11)),
    ((0, 13), (13, 14)),
    ((13, 14), (14, 15)),
    ((0, 17), (17, 18)),
    ((17, 18), (18, 19)),
];

/// Neighbouring metacarpals (finger spread).
pub const SPLAY_BONES: [(Bone, Bone); 3] = [
    ((0, 5), (0, 9)),
    ((0, 9), (0, 13)),
    ((0, 13), (0, 17)),
];

/// Angle in radians between two vectors; 0 when either has zero length.
pub fn calculate_angle(v1: Point3, v2: Point3) -> f32 {
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    let u1 = v1 / n1;
    let u2 = v2 / n2;
    u1.dot(&u2).clamp(-1.0, 1.0).acos()
}

/// Translates to the wrist and divides by the largest wrist distance.
/// Degenerate hands (every point on the wrist) are returned translated only.
pub fn normalize_landmarks(landmarks: &LandmarkSet) -> [Point3; LANDMARK_COUNT] {
    let wrist = landmarks.wrist();
    let mut relative = [Point3::ZERO; LANDMARK_COUNT];
    for (slot, p) in relative.iter_mut().zip(landmarks.points()) {
        *slot = *p - wrist;
    }

    let max_distance = relative.iter().map(Point3::norm).fold(0.0f32, f32::max);
    if max_distance > 0.0 {
        for p in relative.iter_mut() {
            *p = *p / max_distance;
        }
    }
    relative
}

#[inline(always)]
fn bone(points: &[Point3; LANDMARK_COUNT], (start, end): Bone) -> Point3 {
    points[end] - points[start]
}

pub fn bone_angles(normalized: &[Point3; LANDMARK_COUNT]) -> [f32; ANGLE_COUNT] {
    let mut angles = [0.0f32; ANGLE_COUNT];
    let pairs = FLEXION_BONES.iter().chain(SPLAY_BONES.iter());
    for (slot, &(b1, b2)) in angles.iter_mut().zip(pairs) {
        *slot = calculate_angle(bone(normalized, b1), bone(normalized, b2));
    }
    angles
}

/// Builds the classifier input for one frame.
pub fn engineer_features(landmarks: &LandmarkSet) -> GgResult<FeatureVector> {
    if !landmarks.is_finite() {
        return Err(GestureError::Validation(
            "landmarks contain non-finite coordinates".to_string(),
        ));
    }

    let normalized = normalize_landmarks(landmarks);
    let angles = bone_angles(&normalized);

    let mut features = [0.0f32; FEATURE_LEN];
    for (i, p) in normalized.iter().enumerate() {
        features[i * 3] = p.x;
        features[i * 3 + 1] = p.y;
        features[i * 3 + 2] = p.z;
    }
    features[LANDMARK_COUNT * 3..].copy_from_slice(&angles);
    Ok(features)
}

// --- Geometric heuristics ---
// Distances are measured relative to the wrist -> middle MCP length so they
// hold regardless of how far the hand is from the camera.

fn hand_length(landmarks: &LandmarkSet) -> f32 {
    landmarks.get(WRIST).distance(&landmarks.get(MIDDLE_MCP))
}

/// Thumb tip and index tip pinched together.
pub fn detect_grab(landmarks: &LandmarkSet, threshold: f32) -> bool {
    let norm = hand_length(landmarks);
    if norm == 0.0 {
        return false;
    }
    let d = landmarks.get(THUMB_TIP).distance(&landmarks.get(INDEX_TIP)) / norm;
    d < threshold
}

/// Open palm: thumb tip and pinky tip spread apart.
pub fn detect_palm(landmarks: &LandmarkSet, threshold: f32) -> bool {
    let norm = hand_length(landmarks);
    if norm == 0.0 {
        return false;
    }
    let d = landmarks.get(THUMB_TIP).distance(&landmarks.get(PINKY_TIP)) / norm;
    d > threshold
}
