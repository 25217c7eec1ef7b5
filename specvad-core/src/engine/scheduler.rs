//! Tick-driven sampling loop.
//!
//! ## Per-tick stages
//!
//! ```text
//! 1. interval.tick() at block_size / sample_rate seconds
//! 2. FrameSource::next_frame → Frame
//! 3. PatchAssembler::append → Rejected | Incomplete | Complete(patch)
//! 4. On Complete: shape [1, T, F, 1], front-pad, z-score normalize
//! 5. SpeechClassifier::predict on spawn_blocking, tagged (epoch, seq)
//! 6. decide(prob, threshold) → broadcast ClassificationEvent
//! ```
//!
//! Stages 2–4 are synchronous and cheap; only inference leaves the loop.
//! The assembler's buffer is moved out *before* inference starts, so new
//! frames accumulate while the previous patch is still being classified.
//! Late ticks are skipped (`MissedTickBehavior::Skip`); a dropped frame is
//! superseded within one patch length, corrupted patch state is not.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use ndarray::Array4;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::{
    classify::ClassifierHandle,
    decision::decide,
    engine::EngineConfig,
    events::ClassificationEvent,
    frame::FrameSource,
    patch::{PatchAssembler, PatchState},
    tensor::{patch_tensor, Normalizer},
};

#[derive(Default)]
pub struct SchedulerDiagnostics {
    pub ticks: AtomicUsize,
    pub frames_in: AtomicUsize,
    pub sentinel_frames: AtomicUsize,
    pub patches_completed: AtomicUsize,
    pub inference_calls: AtomicUsize,
    pub inference_errors: AtomicUsize,
    pub events_emitted: AtomicUsize,
    pub stale_discarded: AtomicUsize,
}

impl SchedulerDiagnostics {
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.frames_in.store(0, Ordering::Relaxed);
        self.sentinel_frames.store(0, Ordering::Relaxed);
        self.patches_completed.store(0, Ordering::Relaxed);
        self.inference_calls.store(0, Ordering::Relaxed);
        self.inference_errors.store(0, Ordering::Relaxed);
        self.events_emitted.store(0, Ordering::Relaxed);
        self.stale_discarded.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_in: self.frames_in.load(Ordering::Relaxed),
            sentinel_frames: self.sentinel_frames.load(Ordering::Relaxed),
            patches_completed: self.patches_completed.load(Ordering::Relaxed),
            inference_calls: self.inference_calls.load(Ordering::Relaxed),
            inference_errors: self.inference_errors.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub ticks: usize,
    pub frames_in: usize,
    pub sentinel_frames: usize,
    pub patches_completed: usize,
    pub inference_calls: usize,
    pub inference_errors: usize,
    pub events_emitted: usize,
    pub stale_discarded: usize,
}

/// All context the tick loop needs, passed as one struct so the spawn stays tidy.
pub struct SchedulerContext {
    pub config: EngineConfig,
    pub classifier: ClassifierHandle,
    pub running: Arc<AtomicBool>,
    pub epoch: Arc<AtomicU64>,
    /// Epoch value this session was started under.
    pub session: u64,
    pub event_tx: broadcast::Sender<ClassificationEvent>,
    pub diagnostics: Arc<SchedulerDiagnostics>,
}

/// Run the tick loop until the engine stops or the epoch moves on.
pub async fn run<S: FrameSource>(ctx: SchedulerContext, mut source: S) {
    let interval_duration = source.tick_interval();
    info!(
        session = ctx.session,
        frequency_bins = ctx.config.frequency_bins,
        frames_in_patch = ctx.config.frames_in_patch,
        threshold = ctx.config.threshold,
        interval_us = interval_duration.as_micros() as u64,
        "scheduler started"
    );

    let mut assembler = PatchAssembler::new(ctx.config.frames_in_patch, ctx.config.frequency_bins);
    let normalizer = Normalizer::new(ctx.config.epsilon);

    let mut interval = tokio::time::interval(interval_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Monotonic patch index within this session.
    let mut seq: u64 = 0;

    loop {
        interval.tick().await;

        if !ctx.running.load(Ordering::SeqCst)
            || ctx.epoch.load(Ordering::SeqCst) != ctx.session
        {
            break;
        }
        ctx.diagnostics.ticks.fetch_add(1, Ordering::Relaxed);

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "frame read failed; tick dropped");
                continue;
            }
        };
        ctx.diagnostics.frames_in.fetch_add(1, Ordering::Relaxed);

        match assembler.append(&frame) {
            Ok(PatchState::Rejected) => {
                ctx.diagnostics
                    .sentinel_frames
                    .fetch_add(1, Ordering::Relaxed);
            }
            Ok(PatchState::Incomplete) => {}
            Ok(PatchState::Complete(patch)) => {
                ctx.diagnostics
                    .patches_completed
                    .fetch_add(1, Ordering::Relaxed);
                let patch_seq = seq;
                seq += 1;

                // The assembler is already empty; accumulation continues next
                // tick while this patch is classified off-thread.
                let tensor = match patch_tensor(
                    &patch,
                    ctx.config.frames_in_patch,
                    ctx.config.frequency_bins,
                ) {
                    Ok(t) => t,
                    Err(e) => {
                        error!(seq = patch_seq, error = %e, "patch shaping failed");
                        continue;
                    }
                };
                let input = normalizer.normalize(tensor);
                debug!(seq = patch_seq, "patch complete; inference dispatched");
                spawn_inference(&ctx, patch_seq, input);
            }
            Err(e) => {
                warn!(error = %e, "frame rejected");
            }
        }
    }

    let snap = ctx.diagnostics.snapshot();
    info!(
        session = ctx.session,
        ticks = snap.ticks,
        frames_in = snap.frames_in,
        sentinel_frames = snap.sentinel_frames,
        patches_completed = snap.patches_completed,
        inference_calls = snap.inference_calls,
        inference_errors = snap.inference_errors,
        events_emitted = snap.events_emitted,
        stale_discarded = snap.stale_discarded,
        "scheduler stopped; diagnostics"
    );
}

/// Classify one normalized patch off-thread and broadcast the decision.
///
/// The patch tensor is owned by the inference task; nothing is shared with
/// the tick loop. The epoch is re-checked after `predict` returns so a
/// result never reaches a session that stopped while inference ran.
fn spawn_inference(ctx: &SchedulerContext, seq: u64, input: Array4<f32>) {
    ctx.diagnostics
        .inference_calls
        .fetch_add(1, Ordering::Relaxed);

    let classifier = ctx.classifier.clone();
    let epoch = Arc::clone(&ctx.epoch);
    let session = ctx.session;
    let threshold = ctx.config.threshold;
    let event_tx = ctx.event_tx.clone();
    let diagnostics = Arc::clone(&ctx.diagnostics);

    tokio::task::spawn_blocking(move || {
        let prob = {
            let mut classifier = classifier.0.lock();
            classifier.predict(&input)
        };

        let prob = match prob {
            Ok(p) => p,
            Err(e) => {
                diagnostics.inference_errors.fetch_add(1, Ordering::Relaxed);
                error!(seq, error = %e, "inference failed; patch dropped");
                return;
            }
        };

        if epoch.load(Ordering::SeqCst) != session {
            diagnostics.stale_discarded.fetch_add(1, Ordering::Relaxed);
            debug!(seq, session, "discarding stale inference result");
            return;
        }

        let result = decide(prob, threshold);
        let event = ClassificationEvent {
            seq,
            session,
            is_speech: result.is_speech,
            confidence: result.confidence,
        };
        if event_tx.send(event).is_ok() {
            diagnostics.events_emitted.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            seq,
            confidence = result.confidence,
            is_speech = result.is_speech,
            "patch classified"
        );
    });
}
