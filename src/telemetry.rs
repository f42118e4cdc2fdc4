//! Telemetry publication and the background logger.
//!
//! The frame loop publishes an immutable [`TelemetrySnapshot`] after every
//! frame. The logger thread only ever reads the latest published snapshot, so
//! it never observes the live confirmation state.

use crate::error::{GestureError, GgResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

pub const CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "FPS",
    "Processing_Latency_ms",
    "Landmark_Status",
    "Prediction_Confidence",
    "Predicted_Gesture_ID",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandmarkStatus {
    Unavailable,
    NotDetected,
    Detected(usize),
}

impl fmt::Display for LandmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "Camera Unavailable"),
            Self::NotDetected => write!(f, "Not Detected"),
            Self::Detected(n) => write!(f, "Detected ({} landmarks)", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp_secs: f64,
    pub fps: f32,
    pub latency_ms: f32,
    pub landmark_status: LandmarkStatus,
    pub confidence: f32,
    pub label_id: Option<u8>,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            timestamp_secs: unix_now_secs(),
            fps: 0.0,
            latency_ms: 0.0,
            landmark_status: LandmarkStatus::NotDetected,
            confidence: 0.0,
            label_id: None,
        }
    }
}

impl TelemetrySnapshot {
    pub fn to_record(&self) -> [String; 6] {
        [
            format!("{:.3}", self.timestamp_secs),
            format!("{:.2}", self.fps),
            format!("{:.2}", self.latency_ms),
            self.landmark_status.to_string(),
            format!("{:.4}", self.confidence),
            self.label_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ]
    }
}

pub fn unix_now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Latest published snapshot, shared between the frame loop and readers.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBoard {
    slot: Arc<Mutex<Arc<TelemetrySnapshot>>>,
}

impl SnapshotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        let snapshot = Arc::new(snapshot);
        *lock(&self.slot) = snapshot;
    }

    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        Arc::clone(&lock(&self.slot))
    }
}

pub trait TelemetrySink: Send {
    fn write(&mut self, snapshot: &TelemetrySnapshot) -> GgResult<()>;
    fn flush(&mut self) -> GgResult<()>;
}

pub struct CsvSink<W: Write + Send> {
    writer: csv::Writer<W>,
}

impl<W: Write + Send> CsvSink<W> {
    pub fn from_writer(inner: W) -> GgResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> GgResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| GestureError::Io(e.into_error()))
    }
}

impl CsvSink<File> {
    /// Creates `<dir>/log_session_<unix secs>.csv`.
    pub fn create_in_dir<P: AsRef<Path>>(dir: P) -> GgResult<(Self, PathBuf)> {
        fs::create_dir_all(&dir)?;
        let path = dir
            .as_ref()
            .join(format!("log_session_{}.csv", unix_now_secs() as u64));
        let file = File::create(&path)?;
        info!("Telemetry is logging to {}", path.display());
        Ok((Self::from_writer(file)?, path))
    }
}

impl<W: Write + Send> TelemetrySink for CsvSink<W> {
    fn write(&mut self, snapshot: &TelemetrySnapshot) -> GgResult<()> {
        self.writer.write_record(snapshot.to_record())?;
        Ok(())
    }

    fn flush(&mut self) -> GgResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects snapshots in memory; cloned handles share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<TelemetrySnapshot>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<TelemetrySnapshot> {
        lock(&self.rows).clone()
    }
}

impl TelemetrySink for MemorySink {
    fn write(&mut self, snapshot: &TelemetrySnapshot) -> GgResult<()> {
        lock(&self.rows).push(snapshot.clone());
        Ok(())
    }

    fn flush(&mut self) -> GgResult<()> {
        Ok(())
    }
}

const POLL_STEP: Duration = Duration::from_millis(10);

/// Background thread that samples the snapshot board at a fixed interval.
pub struct TelemetryLogger {
    board: SnapshotBoard,
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl TelemetryLogger {
    pub fn new(board: SnapshotBoard, interval: Duration) -> Self {
        Self {
            board,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            started_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawns the logger thread. Returns `false` if it was already running.
    pub fn start<S: TelemetrySink + 'static>(&mut self, sink: S) -> bool {
        if self.is_running() {
            warn!("Telemetry logger is already running.");
            return false;
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let board = self.board.clone();
        let interval = self.interval;

        self.handle = Some(thread::spawn(move || {
            log_loop(board, sink, interval, running);
        }));
        self.started_at = Some(Instant::now());
        info!("Telemetry logger started ({:?} interval).", interval);
        true
    }

    /// Stops and joins the logger. Safe to call repeatedly; returns how long
    /// the logger ran the first time, `None` afterwards.
    pub fn stop(&mut self) -> Option<Duration> {
        if !self.is_running() && self.handle.is_none() {
            return None;
        }
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Telemetry logger thread panicked.");
            }
        }

        let elapsed = self.started_at.take().map(|t| t.elapsed());
        if let Some(d) = elapsed {
            info!(
                "Telemetry logger stopped. Session time: {:.2}s ({:.2} min)",
                d.as_secs_f64(),
                d.as_secs_f64() / 60.0
            );
        }
        elapsed
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

fn log_loop<S: TelemetrySink>(
    board: SnapshotBoard,
    mut sink: S,
    interval: Duration,
    running: Arc<AtomicBool>,
) {
    let mut last_log = Instant::now();
    while running.load(Ordering::SeqCst) {
        if last_log.elapsed() >= interval {
            let snapshot = board.latest();
            if let Err(e) = sink.write(&snapshot) {
                warn!("Telemetry write failed: {}", e);
            }
            last_log = Instant::now();
        }
        thread::sleep(POLL_STEP.min(interval));
    }
    if let Err(e) = sink.flush() {
        warn!("Telemetry flush failed: {}", e);
    }
}
