//! Scripted classifier for tests and demos.

use super::{Classifier, ClassifierError, Label};
use crate::pose::FeatureVector;
use std::collections::VecDeque;
use std::sync::Mutex;

type Outcome = Result<Label, ClassifierError>;

/// Replays a queue of predetermined outcomes, then repeats a fallback.
///
/// Ignores the feature values; only their count is checked.
#[derive(Debug)]
pub struct ScriptedClassifier {
    name: String,
    feature_len: usize,
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
}

impl ScriptedClassifier {
    pub fn new(name: &str, feature_len: usize) -> Self {
        Self {
            name: name.to_string(),
            feature_len,
            script: Mutex::new(VecDeque::new()),
            fallback: Err(ClassifierError::Inference {
                message: "script exhausted".to_string(),
            }),
        }
    }

    /// Always answers `label`.
    pub fn constant(name: &str, label: &str, feature_len: usize) -> Self {
        Self::new(name, feature_len).with_fallback(label)
    }

    /// Label returned once the script is used up.
    pub fn with_fallback(mut self, label: &str) -> Self {
        self.fallback = Ok(Label::from(label));
        self
    }

    /// Appends `count` copies of `label` to the script.
    pub fn then(self, label: &str, count: usize) -> Self {
        self.push_outcomes(Ok(Label::from(label)), count);
        self
    }

    /// Appends one failing outcome.
    pub fn then_fail(self, message: &str) -> Self {
        self.push_outcomes(
            Err(ClassifierError::Inference {
                message: message.to_string(),
            }),
            1,
        );
        self
    }

    /// Outcomes left before the fallback kicks in.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|script| script.len()).unwrap_or(0)
    }

    fn push_outcomes(&self, outcome: Outcome, count: usize) {
        if let Ok(mut script) = self.script.lock() {
            script.extend(std::iter::repeat_n(outcome, count));
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, features: &FeatureVector) -> Outcome {
        if features.len() != self.feature_len {
            return Err(ClassifierError::FeatureLength {
                expected: self.feature_len,
                actual: features.len(),
            });
        }
        let next = self
            .script
            .lock()
            .map_err(|_| ClassifierError::Inference {
                message: "script lock poisoned".to_string(),
            })?
            .pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn feature_len(&self) -> usize {
        self.feature_len
    }

    fn name(&self) -> &str {
        &self.name
    }
}
