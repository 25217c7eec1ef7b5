//! Patch assembly: fixed-length frame sequences flattened time-major.
//!
//! One patch is live at a time. Frames are appended one per tick; at exactly
//! `frames_in_patch` valid appends the flat buffer is handed to the caller
//! and the assembler resets, so the next append starts a fresh patch.
//! Frames are never reused across patches and a patch is never processed
//! partially.

use tracing::debug;

use crate::error::{Result, VadError};
use crate::frame::Frame;

/// Outcome of appending one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchState {
    /// Sentinel frame; dropped without advancing the accumulation.
    Rejected,
    /// Frame accepted; the patch still needs more frames.
    Incomplete,
    /// The patch just filled. The buffer is time-major:
    /// `[frame0_bin0.., frame1_bin0.., ...]`, length
    /// `frames_in_patch × frequency_bins`. Ownership moves to the caller;
    /// the assembler is already empty again.
    Complete(Vec<f32>),
}

pub struct PatchAssembler {
    frames_in_patch: usize,
    frequency_bins: usize,
    buf: Vec<f32>,
    rejected: u64,
}

impl PatchAssembler {
    /// # Panics
    /// Zero-sized geometry has no valid patch and is a programming error.
    pub fn new(frames_in_patch: usize, frequency_bins: usize) -> Self {
        assert!(
            frames_in_patch > 0 && frequency_bins > 0,
            "patch geometry must be non-zero"
        );
        Self {
            frames_in_patch,
            frequency_bins,
            buf: Vec::with_capacity(frames_in_patch * frequency_bins),
            rejected: 0,
        }
    }

    /// Valid frames accumulated toward the current patch.
    pub fn frames_accumulated(&self) -> usize {
        self.buf.len() / self.frequency_bins
    }

    /// Sentinel frames rejected over the assembler's lifetime.
    pub fn rejected_frames(&self) -> u64 {
        self.rejected
    }

    /// Append one frame.
    ///
    /// # Errors
    /// A non-sentinel frame of the wrong width is a contract violation and
    /// returns `VadError::FrameLength`; the accumulation is left untouched.
    pub fn append(&mut self, frame: &Frame) -> Result<PatchState> {
        if frame.is_sentinel() {
            self.rejected += 1;
            debug!(rejected = self.rejected, "sentinel frame dropped");
            return Ok(PatchState::Rejected);
        }
        if frame.len() != self.frequency_bins {
            return Err(VadError::FrameLength {
                expected: self.frequency_bins,
                actual: frame.len(),
            });
        }

        self.buf.extend_from_slice(&frame.bins);

        if self.buf.len() == self.frames_in_patch * self.frequency_bins {
            let capacity = self.buf.capacity();
            let patch = std::mem::replace(&mut self.buf, Vec::with_capacity(capacity));
            Ok(PatchState::Complete(patch))
        } else {
            Ok(PatchState::Incomplete)
        }
    }

    /// Discard any partial accumulation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
