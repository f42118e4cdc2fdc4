use crate::consts::LANDMARK_COUNT;
use crate::error::{GestureError, GgResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::{Div, Sub};

// Anatomical landmark indices (MediaPipe hand topology)
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const PINKY_TIP: usize = 20;

/// Bones of the hand skeleton as (start, end) landmark pairs.
pub const HAND_CONNECTIONS: [(usize, usize); 23] = [
    (0, 1), (1, 2), (2, 3), (3, 4),     // Thumb
    (0, 5), (5, 6), (6, 7), (7, 8),     // Index
    (9, 10), (10, 11), (11, 12),        // Middle
    (13, 14), (14, 15), (15, 16),       // Ring
    (17, 18), (18, 19), (19, 20),       // Pinky
    (0, 9), (0, 13), (0, 17),           // Wrist to finger bases
    (5, 9), (9, 13), (13, 17),          // Across the knuckles
];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub fn dot(&self, other: &Point3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline(always)]
    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        (*self - *other).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Div<f32> for Point3 {
    type Output = Point3;

    fn div(self, rhs: f32) -> Point3 {
        Point3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// One frame of hand landmarks in normalized image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Point3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds a set from raw `[x, y, z]` triples, rejecting anything but 21 points.
    pub fn from_slice(raw: &[[f32; 3]]) -> GgResult<Self> {
        if raw.len() != LANDMARK_COUNT {
            return Err(GestureError::Validation(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                raw.len()
            )));
        }
        let mut points = [Point3::ZERO; LANDMARK_COUNT];
        for (slot, [x, y, z]) in points.iter_mut().zip(raw) {
            *slot = Point3::new(*x, *y, *z);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] {
        &self.points
    }

    pub fn get(&self, idx: usize) -> Point3 {
        self.points[idx]
    }

    pub fn wrist(&self) -> Point3 {
        self.points[WRIST]
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(Point3::is_finite)
    }
}

/// Supplier of per-frame hand landmarks (camera + hand tracker).
///
/// `read` returns `Ok(None)` when no hand is visible and `Err` when the frame
/// itself could not be acquired.
pub trait LandmarkSource: Send {
    fn is_available(&self) -> bool;
    fn read(&mut self) -> GgResult<Option<LandmarkSet>>;
    fn release(&mut self);
}

/// Stand-in used when no camera could be opened.
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl LandmarkSource for UnavailableSource {
    fn is_available(&self) -> bool {
        false
    }

    fn read(&mut self) -> GgResult<Option<LandmarkSet>> {
        Ok(None)
    }

    fn release(&mut self) {}
}

#[derive(Debug, Clone)]
pub enum ScriptedFrame {
    Hand(LandmarkSet),
    NoHand,
    ReadError,
}

/// Plays back a fixed sequence of frames; reports "no hand" once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<ScriptedFrame>,
    released: bool,
    release_calls: usize,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = ScriptedFrame>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            released: false,
            release_calls: 0,
        }
    }

    pub fn push(&mut self, frame: ScriptedFrame) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls
    }
}

impl LandmarkSource for ScriptedSource {
    fn is_available(&self) -> bool {
        !self.released
    }

    fn read(&mut self) -> GgResult<Option<LandmarkSet>> {
        if self.released {
            return Err(GestureError::Source("source already released".to_string()));
        }
        match self.frames.pop_front() {
            Some(ScriptedFrame::Hand(set)) => Ok(Some(set)),
            Some(ScriptedFrame::NoHand) | None => Ok(None),
            Some(ScriptedFrame::ReadError) => {
                Err(GestureError::Source("scripted read failure".to_string()))
            }
        }
    }

    fn release(&mut self) {
        self.release_calls += 1;
        self.released = true;
    }
}
