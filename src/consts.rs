/// Number of hand landmarks produced per frame by the landmark source.
pub const LANDMARK_COUNT: usize = 21;

/// Number of inter-bone angles appended to the normalized coordinates.
/// 10 flexion pairs followed by 3 splay pairs.
pub const ANGLE_COUNT: usize = 13;

/// Length of the feature vector the classifier was trained on.
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 3 + ANGLE_COUNT;

/// Number of gesture labels the classifier distinguishes.
pub const LABEL_COUNT: usize = 4;

/// Predictions below this confidence are discarded as unusable.
pub const MIN_USABLE_CONFIDENCE: f32 = 0.10;

/// Default hold time before a gesture is confirmed.
pub const DEFAULT_DWELL_SECS: f64 = 2.0;

/// Default lockout after a confirmation.
pub const DEFAULT_COOLDOWN_SECS: f64 = 0.5;

/// Capacity of the rolling confidence/prediction buffers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;

/// Consecutive identical trailing predictions required for a valid confirmation.
pub const DEFAULT_MIN_STABLE_FRAMES: usize = 5;

/// Level used when no level (or an unknown level key) has been set.
pub const DEFAULT_LEVEL: u8 = 6;

/// Per-frame classification latency budget (one frame at 30 fps).
pub const DEFAULT_LATENCY_BUDGET_MS: f32 = 33.0;

/// Telemetry polling interval.
pub const DEFAULT_TELEMETRY_INTERVAL_SECS: f64 = 1.0;

/// Softmax temperature for the template classifier.
pub const DEFAULT_TEMPLATE_TEMPERATURE: f32 = 0.05;
