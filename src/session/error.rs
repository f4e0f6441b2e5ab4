//! Per-frame failures and how they are reported.
//!
//! None of these end a session. A failed frame leaves session state as it
//! was and is never retried; the next frame supersedes it.

use crate::classifier::ClassifierError;
use crate::pose::ExtractionError;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a frame did not update the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("feature extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("exercise classification failed: {0}")]
    Exercise(#[source] ClassifierError),

    #[error("stage classification failed: {0}")]
    Stage(#[source] ClassifierError),
}

/// Sink for per-frame failures.
pub trait ErrorReporter: Send + Sync {
    /// Reports a failure for frame number `frame` (0-based, per session).
    fn report(&self, frame: u64, error: &FrameError);
}

/// Reports through `tracing`.
///
/// Extraction failures are routine (a joint left the picture) and go to
/// debug; classifier failures go to warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, frame: u64, error: &FrameError) {
        match error {
            FrameError::Extraction(_) => debug!(frame, "skipped: {}", error),
            FrameError::Exercise(_) | FrameError::Stage(_) => warn!(frame, "skipped: {}", error),
        }
    }
}
