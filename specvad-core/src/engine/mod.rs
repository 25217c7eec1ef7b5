//! `VadEngine`: top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! VadEngine::new()
//!     └─► warm_up()          → classifier loaded, status = WarmingUp → Idle
//!         └─► start(source)  → tick task spawned, status = Listening
//!             └─► stop()     → running=false, epoch bumped, status = Stopped
//! ```
//!
//! `start()`/`stop()` are idempotent: calling them in the wrong state returns
//! an error rather than panicking.
//!
//! ## Session epoch
//!
//! Every `start()` *and* `stop()` bumps a process-wide epoch counter. The
//! scheduler tags each in-flight inference with the epoch it started under
//! and discards completions whose epoch no longer matches, so a classifier
//! result can never be delivered to a session that has since stopped; even
//! across a stop/restart cycle.

pub mod scheduler;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    classify::ClassifierHandle,
    error::{Result, VadError},
    events::{ClassificationEvent, EngineStatus, EngineStatusEvent},
    frame::FrameSource,
    metadata::{self, ModelMetadata},
    tensor,
};

/// Broadcast channel capacity: 256 events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Configuration for `VadEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Frequency bins per frame. Default: 232.
    pub frequency_bins: usize,
    /// Frames per classifier patch. Default: 43.
    pub frames_in_patch: usize,
    /// Speech probability threshold, strict `>`. Default: 0.3656…
    pub threshold: f32,
    /// Numeric floor for z-score normalization. Default: 1e-7.
    pub epsilon: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frequency_bins: metadata::DEFAULT_FREQUENCY_BINS,
            frames_in_patch: metadata::DEFAULT_FRAMES_IN_PATCH,
            threshold: metadata::DEFAULT_THRESHOLD,
            epsilon: tensor::DEFAULT_EPSILON,
        }
    }
}

impl EngineConfig {
    /// Configuration matching a loaded model's metadata record.
    pub fn from_metadata(meta: &ModelMetadata) -> Self {
        Self {
            frequency_bins: meta.frequency_bins,
            frames_in_patch: meta.frames_in_patch,
            threshold: meta.threshold,
            epsilon: tensor::DEFAULT_EPSILON,
        }
    }
}

/// The top-level engine handle.
///
/// `VadEngine` is `Send + Sync`; all fields use interior mutability. Wrap
/// in `Arc<VadEngine>` to share between the consuming layer and control
/// surfaces.
pub struct VadEngine {
    config: EngineConfig,
    classifier: ClassifierHandle,
    /// `true` while the tick task is active.
    running: Arc<AtomicBool>,
    /// Session epoch; see module docs.
    epoch: Arc<AtomicU64>,
    /// Canonical status (written atomically via Mutex, read from commands).
    status: Arc<Mutex<EngineStatus>>,
    /// Broadcast sender for classification events.
    event_tx: broadcast::Sender<ClassificationEvent>,
    /// Broadcast sender for status events.
    status_tx: broadcast::Sender<EngineStatusEvent>,
    /// Shared scheduler diagnostics counters.
    diagnostics: Arc<scheduler::SchedulerDiagnostics>,
}

impl VadEngine {
    /// Create a new engine. Does not start sampling; call `warm_up()` then
    /// `start()`.
    pub fn new(config: EngineConfig, classifier: ClassifierHandle) -> Self {
        let (event_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);

        Self {
            config,
            classifier,
            running: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            status: Arc::new(Mutex::new(EngineStatus::Idle)),
            event_tx,
            status_tx,
            diagnostics: Arc::new(scheduler::SchedulerDiagnostics::default()),
        }
    }

    /// Warm up the classifier (load weights, run a dummy inference).
    ///
    /// Call once at application startup, before `start()`. A failure here is
    /// fatal: the session never transitions to active.
    pub fn warm_up(&self) -> Result<()> {
        self.set_status(EngineStatus::WarmingUp, None);
        info!("warming up classifier");
        if let Err(e) = self.classifier.0.lock().warm_up() {
            self.set_status(EngineStatus::Error, Some(e.to_string()));
            return Err(e);
        }
        self.set_status(EngineStatus::Idle, None);
        info!("classifier ready");
        Ok(())
    }

    /// Start sampling frames from `source` and classifying patches.
    ///
    /// Spawns the tick task on the current Tokio runtime and returns
    /// immediately. Events flow on the channel returned by [`subscribe`].
    ///
    /// # Errors
    /// `VadError::AlreadyRunning` if already started.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    ///
    /// [`subscribe`]: VadEngine::subscribe
    pub fn start<S: FrameSource>(&self, source: S) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(VadError::AlreadyRunning);
        }

        self.diagnostics.reset();
        let session = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_status(EngineStatus::Listening, None);

        let ctx = scheduler::SchedulerContext {
            config: self.config.clone(),
            classifier: self.classifier.clone(),
            running: Arc::clone(&self.running),
            epoch: Arc::clone(&self.epoch),
            session,
            event_tx: self.event_tx.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
        };

        tokio::spawn(scheduler::run(ctx, source));

        info!(session, "engine started; listening");
        Ok(())
    }

    /// Stop sampling.
    ///
    /// The tick task exits on its next tick; any inference already in flight
    /// completes off-thread and its result is discarded (the epoch no longer
    /// matches). No event is ever emitted after this call returns.
    ///
    /// # Errors
    /// `VadError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(VadError::NotRunning);
        }

        // Invalidate in-flight inference before anything else observes the stop.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.set_status(EngineStatus::Stopped, None);
        info!("engine stop requested");
        Ok(())
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    /// Subscribe to classification events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClassificationEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<EngineStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of scheduler counters for observability.
    pub fn diagnostics_snapshot(&self) -> scheduler::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    fn set_status(&self, new_status: EngineStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(EngineStatusEvent {
            status: new_status,
            detail,
        });
    }
}
