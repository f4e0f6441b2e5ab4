//! Classifier boundary: feature vector in, label out.
//!
//! Two roles share one trait. The exercise classifier picks among the known
//! exercises; each exercise has its own stage classifier picking among that
//! exercise's stages. Models themselves are opaque to the rest of the crate.

pub mod centroid;
pub mod label;
pub mod mock;

pub use centroid::{Centroid, CentroidClassifier, CentroidModel, ModelBundle};
pub use label::Label;
pub use mock::ScriptedClassifier;

use crate::error::{RepTrackError, Result};
use crate::pose::FeatureVector;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Per-frame classifier failure. Recoverable: the frame is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("no stage classifier for exercise {exercise}")]
    NoStageClassifier { exercise: Label },

    #[error("expected {expected} features, got {actual}")]
    FeatureLength { expected: usize, actual: usize },

    #[error("nearest class at distance {distance:.3} exceeds limit {max_distance:.3}")]
    Rejected { distance: f64, max_distance: f64 },

    #[error("inference failed: {message}")]
    Inference { message: String },
}

/// Synchronous label-producing model.
pub trait Classifier: Send + Sync {
    /// Classify one frame's feature vector.
    fn classify(&self, features: &FeatureVector) -> std::result::Result<Label, ClassifierError>;

    /// Number of features the model was trained on.
    fn feature_len(&self) -> usize;

    /// Name for logging.
    fn name(&self) -> &str;
}

impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn classify(&self, features: &FeatureVector) -> std::result::Result<Label, ClassifierError> {
        (**self).classify(features)
    }

    fn feature_len(&self) -> usize {
        (**self).feature_len()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn classify(&self, features: &FeatureVector) -> std::result::Result<Label, ClassifierError> {
        (**self).classify(features)
    }

    fn feature_len(&self) -> usize {
        (**self).feature_len()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// The exercise classifier plus one stage classifier per exercise.
pub struct ClassifierSet {
    exercise: Box<dyn Classifier>,
    stages: HashMap<Label, Box<dyn Classifier>>,
}

impl ClassifierSet {
    pub fn new(exercise: impl Classifier + 'static) -> Self {
        Self {
            exercise: Box::new(exercise),
            stages: HashMap::new(),
        }
    }

    /// Registers the stage classifier used while `exercise` is detected.
    pub fn with_stage(
        mut self,
        exercise: impl Into<Label>,
        classifier: impl Classifier + 'static,
    ) -> Self {
        self.stages.insert(exercise.into(), Box::new(classifier));
        self
    }

    pub fn classify_exercise(
        &self,
        features: &FeatureVector,
    ) -> std::result::Result<Label, ClassifierError> {
        self.exercise.classify(features)
    }

    pub fn classify_stage(
        &self,
        exercise: &Label,
        features: &FeatureVector,
    ) -> std::result::Result<Label, ClassifierError> {
        let classifier =
            self.stages
                .get(exercise)
                .ok_or_else(|| ClassifierError::NoStageClassifier {
                    exercise: exercise.clone(),
                })?;
        classifier.classify(features)
    }

    /// Exercises that have a stage classifier, sorted.
    pub fn staged_exercises(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = self.stages.keys().collect();
        labels.sort();
        labels
    }

    /// Checks every model expects `feature_len` inputs.
    ///
    /// Run once when a session is built; a mismatch is a wiring error and is
    /// never left to surface frame by frame.
    pub fn validate(&self, feature_len: usize) -> Result<()> {
        let check = |role: String, classifier: &dyn Classifier| {
            if classifier.feature_len() != feature_len {
                return Err(RepTrackError::FeatureLengthMismatch {
                    classifier: role,
                    expected: classifier.feature_len(),
                    actual: feature_len,
                });
            }
            Ok(())
        };

        check(
            format!("exercise:{}", self.exercise.name()),
            self.exercise.as_ref(),
        )?;
        for exercise in self.staged_exercises() {
            if let Some(classifier) = self.stages.get(exercise) {
                check(format!("stage:{}", exercise), classifier.as_ref())?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClassifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierSet")
            .field("exercise", &self.exercise.name())
            .field("stages", &self.staged_exercises())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(len: usize) -> FeatureVector {
        FeatureVector::from(vec![0.5; len])
    }

    #[test]
    fn classify_stage_routes_by_exercise() {
        let set = ClassifierSet::new(ScriptedClassifier::constant("exercise", "squat", 12))
            .with_stage("squat", ScriptedClassifier::constant("squat", "start", 12))
            .with_stage("push-up", ScriptedClassifier::constant("push-up", "down", 12));

        let squat = Label::from("squat");
        let pushup = Label::from("push-up");
        assert_eq!(set.classify_stage(&squat, &features(12)).unwrap(), "start");
        assert_eq!(set.classify_stage(&pushup, &features(12)).unwrap(), "down");
    }

    #[test]
    fn missing_stage_classifier_is_an_error() {
        let set = ClassifierSet::new(ScriptedClassifier::constant("exercise", "plank", 12));
        let err = set
            .classify_stage(&Label::from("plank"), &features(12))
            .unwrap_err();
        assert_eq!(
            err,
            ClassifierError::NoStageClassifier {
                exercise: Label::from("plank")
            }
        );
    }

    #[test]
    fn validate_accepts_matching_lengths() {
        let set = ClassifierSet::new(ScriptedClassifier::constant("exercise", "squat", 12))
            .with_stage("squat", ScriptedClassifier::constant("squat", "start", 12));
        assert!(set.validate(12).is_ok());
    }

    #[test]
    fn validate_names_mismatched_stage_model() {
        let set = ClassifierSet::new(ScriptedClassifier::constant("exercise", "squat", 12))
            .with_stage("squat", ScriptedClassifier::constant("squat", "start", 10));
        match set.validate(12) {
            Err(RepTrackError::FeatureLengthMismatch {
                classifier,
                expected,
                actual,
            }) => {
                assert_eq!(classifier, "stage:squat");
                assert_eq!(expected, 10);
                assert_eq!(actual, 12);
            }
            other => panic!("expected FeatureLengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn validate_checks_exercise_model() {
        let set = ClassifierSet::new(ScriptedClassifier::constant("exercise", "squat", 3));
        assert!(set.validate(12).is_err());
    }

    #[test]
    fn arc_classifier_delegates() {
        let shared = Arc::new(ScriptedClassifier::constant("shared", "pull-up", 12));
        let set = ClassifierSet::new(shared.clone());
        assert_eq!(set.classify_exercise(&features(12)).unwrap(), "pull-up");
        assert_eq!(shared.name(), "shared");
    }
}
