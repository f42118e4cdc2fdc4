use crate::classifier::GestureLabel;
use std::collections::VecDeque;
use std::time::Duration;

/// A label being held, and since when.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellTimer {
    pub label: GestureLabel,
    pub started_at: Duration,
}

/// Conceptual position of the confirmation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Cooling,
    Tracking(GestureLabel),
    Held(GestureLabel),
}

/// Paired FIFOs of recent confidences and labels.
#[derive(Debug, Clone)]
pub struct StabilityBuffer {
    confidences: VecDeque<f32>,
    labels: VecDeque<GestureLabel>,
    capacity: usize,
}

impl StabilityBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            confidences: VecDeque::with_capacity(capacity + 1),
            labels: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, confidence: f32, label: GestureLabel) {
        self.confidences.push_back(confidence);
        self.labels.push_back(label);
        if self.confidences.len() > self.capacity {
            self.confidences.pop_front();
            self.labels.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean_confidence(&self) -> f32 {
        if self.confidences.is_empty() {
            return 0.0;
        }
        self.confidences.iter().sum::<f32>() / self.confidences.len() as f32
    }

    /// Consecutive samples, newest first, that carry `label`.
    pub fn stability(&self, label: GestureLabel) -> usize {
        self.labels.iter().rev().take_while(|&&l| l == label).count()
    }

    pub fn labels(&self) -> impl Iterator<Item = GestureLabel> + '_ {
        self.labels.iter().copied()
    }
}

/// Mutable per-session confirmation state. Created at session start, mutated
/// once per frame, never persisted.
#[derive(Debug, Clone)]
pub struct ConfirmationState {
    pub potential: Option<DwellTimer>,
    pub last_confirmed: Option<GestureLabel>,
    pub released: bool,
    pub cooldown_active: bool,
    pub cooldown_end: Duration,
    pub buffer: StabilityBuffer,
    pub pending_action: Option<GestureLabel>,
}

impl ConfirmationState {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            potential: None,
            last_confirmed: None,
            released: true,
            cooldown_active: false,
            cooldown_end: Duration::ZERO,
            buffer: StabilityBuffer::new(buffer_capacity),
            pending_action: None,
        }
    }

    pub fn held_for(&self, now: Duration) -> Option<Duration> {
        self.potential.map(|t| now.saturating_sub(t.started_at))
    }

    pub fn take_pending(&mut self) -> Option<GestureLabel> {
        self.pending_action.take()
    }
}
