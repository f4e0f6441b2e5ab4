//! Nearest-centroid classifier loaded from a JSON model bundle.
//!
//! Each class is represented by the mean feature vector of its training
//! samples. A frame is assigned the class whose center is closest in
//! Euclidean distance. An optional `max_distance` turns far-away frames into
//! rejections instead of forced guesses.
//!
//! Bundle layout:
//!
//! ```json
//! {
//!   "exercise": { "centroids": [ { "label": "squat", "center": [ ... ] } ] },
//!   "stages": {
//!     "squat": { "centroids": [ ... ], "max_distance": 1.2 }
//!   }
//! }
//! ```

use super::{Classifier, ClassifierError, ClassifierSet, Label};
use crate::error::{RepTrackError, Result};
use crate::pose::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One class center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub label: Label,
    pub center: Vec<f64>,
}

/// Serialized form of a single classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidModel {
    pub centroids: Vec<Centroid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

/// Exercise model plus stage models keyed by exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub exercise: CentroidModel,
    #[serde(default)]
    pub stages: BTreeMap<Label, CentroidModel>,
}

impl ModelBundle {
    /// Read a bundle from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RepTrackError::ModelFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                RepTrackError::Io(e)
            }
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the classifiers. Fails on empty or inconsistent models.
    pub fn into_classifier_set(self) -> Result<ClassifierSet> {
        let exercise = CentroidClassifier::new("exercise", self.exercise)?;
        let mut set = ClassifierSet::new(exercise);
        for (name, model) in self.stages {
            let classifier = CentroidClassifier::new(&format!("{}-stage", name), model)?;
            set = set.with_stage(name, classifier);
        }
        Ok(set)
    }
}

#[derive(Debug, Clone)]
pub struct CentroidClassifier {
    name: String,
    centroids: Vec<Centroid>,
    max_distance: Option<f64>,
    feature_len: usize,
}

impl CentroidClassifier {
    pub fn new(name: &str, model: CentroidModel) -> Result<Self> {
        let invalid = |message: String| RepTrackError::InvalidModel {
            name: name.to_string(),
            message,
        };

        let feature_len = model
            .centroids
            .first()
            .map(|c| c.center.len())
            .ok_or_else(|| invalid("no centroids".to_string()))?;
        if feature_len == 0 {
            return Err(invalid("centroids have no features".to_string()));
        }
        for centroid in &model.centroids {
            if centroid.center.len() != feature_len {
                return Err(invalid(format!(
                    "centroid {} has {} features, expected {}",
                    centroid.label,
                    centroid.center.len(),
                    feature_len
                )));
            }
            if centroid.center.iter().any(|v| !v.is_finite()) {
                return Err(invalid(format!(
                    "centroid {} has non-finite values",
                    centroid.label
                )));
            }
        }
        if let Some(limit) = model.max_distance
            && !(limit > 0.0)
        {
            return Err(invalid(format!("max_distance must be positive, got {}", limit)));
        }

        Ok(Self {
            name: name.to_string(),
            centroids: model.centroids,
            max_distance: model.max_distance,
            feature_len,
        })
    }

    /// Class labels in model order.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.centroids.iter().map(|c| &c.label)
    }

    /// Nearest centroid and its distance. Ties keep the earlier centroid.
    fn nearest(&self, features: &[f64]) -> Option<(&Centroid, f64)> {
        let mut best: Option<(&Centroid, f64)> = None;
        for centroid in &self.centroids {
            let distance = euclidean(&centroid.center, features);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((centroid, distance)),
            }
        }
        best
    }
}

impl Classifier for CentroidClassifier {
    fn classify(&self, features: &FeatureVector) -> std::result::Result<Label, ClassifierError> {
        if features.len() != self.feature_len {
            return Err(ClassifierError::FeatureLength {
                expected: self.feature_len,
                actual: features.len(),
            });
        }
        let (centroid, distance) =
            self.nearest(features.as_slice())
                .ok_or_else(|| ClassifierError::Inference {
                    message: "model has no centroids".to_string(),
                })?;
        if !distance.is_finite() {
            return Err(ClassifierError::Inference {
                message: "non-finite distance".to_string(),
            });
        }
        if let Some(max_distance) = self.max_distance
            && distance > max_distance
        {
            return Err(ClassifierError::Rejected {
                distance,
                max_distance,
            });
        }
        Ok(centroid.label.clone())
    }

    fn feature_len(&self) -> usize {
        self.feature_len
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
