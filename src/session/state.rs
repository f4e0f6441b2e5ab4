//! Session state and the repetition state machine.
//!
//! State is the triple (current exercise, current stage, rep count) plus the
//! two debounce windows. Each classified frame advances it once:
//!
//! ```text
//! raw exercise ─▶ exercise window ─▶ majority == raw? ──no──▶ ExerciseUnsettled
//!                                          │yes
//!                                          ▼
//!                               stage classifier(raw exercise) ──err──▶ StageSkipped
//!                                          │
//!                                          ▼
//!                                    stage window
//!                                          │
//!              same exercise? ──no──▶ ExerciseChanged (reps = 0)
//!                    │yes
//!                    ▼
//!      window unanimous on a new stage? ──no──▶ Holding
//!                    │yes
//!                    ▼
//!      StageConfirmed (reps += 1 when the stage is the rep stage)
//! ```

use super::error::FrameError;
use crate::classifier::{ClassifierError, Label};
use crate::debounce::RingBuffer;
use crate::defaults;
use crate::error::{RepTrackError, Result};
use serde::Serialize;

/// Stage-handling rules for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Confirmed arrival at this stage counts one repetition.
    pub rep_stage: Label,
    /// Clear the stage window and current stage when the exercise changes.
    ///
    /// Off by default: stage history then carries across an exercise change.
    pub reset_stage_on_exercise_change: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            rep_stage: Label::from(defaults::REP_STAGE),
            reset_stage_on_exercise_change: false,
        }
    }
}

/// The externally visible result: confirmed exercise and its rep count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    /// `None` until the first exercise is confirmed.
    pub exercise: Option<Label>,
    pub reps: u32,
}

/// What a single frame did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Aborted before any buffer was touched.
    Skipped(FrameError),
    /// The newest exercise prediction disagrees with the window majority.
    ExerciseUnsettled,
    /// Exercise settled but no stage could be classified.
    StageSkipped(FrameError),
    /// Nothing changed.
    Holding,
    /// The stage window agreed unanimously on a new stage.
    StageConfirmed { stage: Label, rep_counted: bool },
    /// A different exercise was confirmed; the rep count restarted at zero.
    ExerciseChanged {
        previous: Option<Label>,
        current: Label,
    },
}

impl FrameOutcome {
    /// True when frame processing aborted before reaching the exercise window.
    pub fn is_skipped(&self) -> bool {
        matches!(self, FrameOutcome::Skipped(_))
    }
}

/// Mutable state of one tracking session.
#[derive(Debug, Clone)]
pub struct SessionState {
    current_exercise: Option<Label>,
    current_stage: Option<Label>,
    rep_count: u32,
    exercise_window: RingBuffer<Label>,
    stage_window: RingBuffer<Label>,
    policy: SessionPolicy,
}

impl SessionState {
    pub fn new(exercise_window: usize, stage_window: usize, policy: SessionPolicy) -> Result<Self> {
        let window = |key: &str, size: usize| {
            RingBuffer::new(size).map_err(|_| RepTrackError::ConfigInvalidValue {
                key: key.to_string(),
                message: "window must hold at least 1 frame".to_string(),
            })
        };
        Ok(Self {
            current_exercise: None,
            current_stage: None,
            rep_count: 0,
            exercise_window: window("debounce.exercise_window", exercise_window)?,
            stage_window: window("debounce.stage_window", stage_window)?,
            policy,
        })
    }

    /// Advances the state machine with one frame's raw exercise prediction.
    ///
    /// `classify_stage` is only invoked once the exercise has settled, with
    /// the raw exercise label selecting which stage model to run.
    pub fn advance<F>(&mut self, raw_exercise: Label, classify_stage: F) -> FrameOutcome
    where
        F: FnOnce(&Label) -> std::result::Result<Label, ClassifierError>,
    {
        self.exercise_window.push(raw_exercise.clone());
        if self.exercise_window.majority() != Some(&raw_exercise) {
            return FrameOutcome::ExerciseUnsettled;
        }

        let raw_stage = match classify_stage(&raw_exercise) {
            Ok(stage) => stage,
            Err(e) => return FrameOutcome::StageSkipped(FrameError::Stage(e)),
        };
        self.stage_window.push(raw_stage.clone());

        if self.current_exercise.as_ref() != Some(&raw_exercise) {
            let previous = self.current_exercise.replace(raw_exercise.clone());
            self.rep_count = 0;
            if self.policy.reset_stage_on_exercise_change {
                // Keep only the sample that belongs to the new exercise
                self.stage_window.clear();
                self.stage_window.push(raw_stage);
                self.current_stage = None;
            }
            return FrameOutcome::ExerciseChanged {
                previous,
                current: raw_exercise,
            };
        }

        if !self.stage_window.is_unanimous(&raw_stage)
            || self.current_stage.as_ref() == Some(&raw_stage)
        {
            return FrameOutcome::Holding;
        }

        let rep_counted = raw_stage == self.policy.rep_stage;
        if rep_counted {
            self.rep_count = self.rep_count.saturating_add(1);
        }
        self.current_stage = Some(raw_stage.clone());
        FrameOutcome::StageConfirmed {
            stage: raw_stage,
            rep_counted,
        }
    }

    pub fn tally(&self) -> Tally {
        Tally {
            exercise: self.current_exercise.clone(),
            reps: self.rep_count,
        }
    }

    pub fn current_exercise(&self) -> Option<&Label> {
        self.current_exercise.as_ref()
    }

    pub fn current_stage(&self) -> Option<&Label> {
        self.current_stage.as_ref()
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn exercise_window(&self) -> &RingBuffer<Label> {
        &self.exercise_window
    }

    pub fn stage_window(&self) -> &RingBuffer<Label> {
        &self.stage_window
    }

    /// Back to a fresh session: windows emptied, nothing confirmed.
    pub fn reset(&mut self) {
        self.current_exercise = None;
        self.current_stage = None;
        self.rep_count = 0;
        self.exercise_window.clear();
        self.stage_window.clear();
    }
}
