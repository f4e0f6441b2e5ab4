//! Per-frame driver: pose in, debounced (exercise, reps) out.

use super::error::{ErrorReporter, FrameError, LogReporter};
use super::state::{FrameOutcome, SessionState, Tally};
use crate::classifier::{ClassifierSet, Label};
use crate::config::Config;
use crate::error::Result;
use crate::pose::{AngleExtractor, AngleTable, FeatureVector, JointLookup};
use tracing::{debug, info};

/// Owns one tracking session.
///
/// Frames must be fed from a single logical stream; `&mut self` on every
/// entry point is what keeps state updates one at a time.
pub struct PoseProcessor {
    extractor: AngleExtractor,
    classifiers: ClassifierSet,
    state: SessionState,
    reporter: Box<dyn ErrorReporter>,
    frames: u64,
}

impl PoseProcessor {
    /// Wires the pieces together.
    ///
    /// Fails if any classifier expects a different number of features than
    /// the extractor produces.
    pub fn new(
        extractor: AngleExtractor,
        classifiers: ClassifierSet,
        state: SessionState,
    ) -> Result<Self> {
        classifiers.validate(extractor.feature_len())?;
        Ok(Self {
            extractor,
            classifiers,
            state,
            reporter: Box::new(LogReporter),
            frames: 0,
        })
    }

    /// Builds a processor for the reference angle table using config settings.
    pub fn from_config(config: &Config, classifiers: ClassifierSet) -> Result<Self> {
        config.validate()?;
        let extractor = AngleExtractor::new(AngleTable::reference())
            .with_min_confidence(config.pose.min_confidence);
        let state = SessionState::new(
            config.debounce.exercise_window,
            config.debounce.stage_window,
            config.session_policy(),
        )?;
        Self::new(extractor, classifiers, state)
    }

    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Processes one frame and describes what it changed.
    pub fn process_frame<P: JointLookup + ?Sized>(&mut self, pose: &P) -> FrameOutcome {
        let frame = self.frames;
        self.frames += 1;

        let outcome = match self.classify_exercise(pose) {
            Ok((features, raw_exercise)) => {
                let classifiers = &self.classifiers;
                self.state.advance(raw_exercise, |exercise| {
                    classifiers.classify_stage(exercise, &features)
                })
            }
            Err(e) => FrameOutcome::Skipped(e),
        };

        self.log_outcome(frame, &outcome);
        outcome
    }

    /// Processes one frame and returns the current tally.
    ///
    /// `None` only when the frame aborted before classification (no usable
    /// features, or the exercise classifier failed). Frames that change
    /// nothing still return the tally.
    pub fn process_pose<P: JointLookup + ?Sized>(&mut self, pose: &P) -> Option<Tally> {
        if self.process_frame(pose).is_skipped() {
            None
        } else {
            Some(self.state.tally())
        }
    }

    /// Feature vector for a pose, without touching session state.
    pub fn features<P: JointLookup + ?Sized>(
        &self,
        pose: &P,
    ) -> std::result::Result<FeatureVector, FrameError> {
        Ok(self.extractor.extract(pose)?)
    }

    pub fn tally(&self) -> Tally {
        self.state.tally()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Frames seen this session, including skipped ones.
    pub fn frames_seen(&self) -> u64 {
        self.frames
    }

    /// Starts a new session with the same models and settings.
    pub fn reset(&mut self) {
        self.state.reset();
        self.frames = 0;
        debug!("session reset");
    }

    fn classify_exercise<P: JointLookup + ?Sized>(
        &self,
        pose: &P,
    ) -> std::result::Result<(FeatureVector, Label), FrameError> {
        let features = self.extractor.extract(pose)?;
        let raw_exercise = self
            .classifiers
            .classify_exercise(&features)
            .map_err(FrameError::Exercise)?;
        Ok((features, raw_exercise))
    }

    fn log_outcome(&self, frame: u64, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Skipped(e) | FrameOutcome::StageSkipped(e) => {
                self.reporter.report(frame, e);
            }
            FrameOutcome::ExerciseUnsettled | FrameOutcome::Holding => {}
            FrameOutcome::StageConfirmed { stage, rep_counted } => {
                if *rep_counted {
                    info!(
                        frame,
                        exercise = %display_exercise(self.state.current_exercise()),
                        reps = self.state.rep_count(),
                        "repetition"
                    );
                } else {
                    debug!(frame, stage = %stage, "stage confirmed");
                }
            }
            FrameOutcome::ExerciseChanged { previous, current } => {
                info!(
                    frame,
                    from = %display_exercise(previous.as_ref()),
                    to = %current,
                    "exercise changed"
                );
            }
        }
    }
}

fn display_exercise(exercise: Option<&Label>) -> &str {
    exercise.map(Label::as_str).unwrap_or("-")
}

impl std::fmt::Debug for PoseProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseProcessor")
            .field("extractor", &self.extractor)
            .field("classifiers", &self.classifiers)
            .field("state", &self.state)
            .field("frames", &self.frames)
            .finish()
    }
}
