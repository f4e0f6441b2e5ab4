//! Joint-angle feature extraction.
//!
//! Each angle is measured between two limb segments. A segment runs from a
//! tail joint to a head joint; its vector is `head - tail`. The angle is
//! `acos(v1 · v2 / (|v1| |v2|))` in radians, so it lies in `[0, π]`.
//!
//! Extraction is all-or-nothing: if any angle in the table is undefined for
//! a frame, the whole vector is rejected and the classifiers never see it.

use super::joint::Joint;
use super::landmark::JointLookup;
use crate::defaults;
use crate::error::{RepTrackError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Segments shorter than this are treated as zero length.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// A directed limb segment between two joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub tail: Joint,
    pub head: Joint,
}

impl Segment {
    pub const fn new(tail: Joint, head: Joint) -> Self {
        Self { tail, head }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.tail, self.head)
    }
}

/// One named angle: the angle between `first` and `second`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleDefinition {
    pub name: String,
    pub first: Segment,
    pub second: Segment,
}

impl AngleDefinition {
    pub fn new(name: impl Into<String>, first: Segment, second: Segment) -> Self {
        Self {
            name: name.into(),
            first,
            second,
        }
    }
}

/// Why a frame produced no feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("{angle}: joint {joint} missing from pose")]
    MissingJoint { angle: String, joint: Joint },

    #[error("{angle}: joint {joint} confidence {confidence:.2} below threshold")]
    LowConfidence {
        angle: String,
        joint: Joint,
        confidence: f32,
    },

    #[error("{angle}: joint {joint} has non-finite coordinates")]
    NonFinite { angle: String, joint: Joint },

    #[error("{angle}: segment {segment} has zero length")]
    DegenerateSegment { angle: String, segment: Segment },

    #[error("{angle}: segment {segment} is too long to measure")]
    SegmentOverflow { angle: String, segment: Segment },
}

/// Ordered joint-angle values for one frame, in angle-table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Fixed, ordered list of angle definitions.
///
/// The order must match the order the classifiers were trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleTable {
    definitions: Vec<AngleDefinition>,
}

impl AngleTable {
    /// Builds a table, rejecting empty tables and duplicate angle names.
    pub fn new(definitions: Vec<AngleDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(RepTrackError::AngleTable {
                message: "table has no angles".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(RepTrackError::AngleTable {
                    message: format!("duplicate angle {}", def.name),
                });
            }
        }
        Ok(Self { definitions })
    }

    /// The twelve body angles the bundled classifiers are trained on.
    pub fn reference() -> Self {
        use Joint::*;

        let upper_arm_l = Segment::new(LeftShoulder, LeftElbow);
        let upper_arm_r = Segment::new(RightShoulder, RightElbow);
        let forearm_l = Segment::new(LeftElbow, LeftWrist);
        let forearm_r = Segment::new(RightElbow, RightWrist);
        let torso_l = Segment::new(LeftShoulder, LeftHip);
        let torso_r = Segment::new(RightShoulder, RightHip);
        let collarbone = Segment::new(RightShoulder, LeftShoulder);
        let pelvis = Segment::new(RightHip, LeftHip);
        let upper_leg_l = Segment::new(LeftHip, LeftKnee);
        let upper_leg_r = Segment::new(RightHip, RightKnee);
        let lower_leg_l = Segment::new(LeftKnee, LeftAnkle);
        let lower_leg_r = Segment::new(RightKnee, RightAnkle);

        Self {
            definitions: vec![
                AngleDefinition::new("left_shoulder_angle", upper_arm_l, torso_l),
                AngleDefinition::new("right_shoulder_angle", upper_arm_r, torso_r),
                AngleDefinition::new("left_inner_shoulder_angle", collarbone, upper_arm_l),
                AngleDefinition::new("right_inner_shoulder_angle", collarbone, upper_arm_r),
                AngleDefinition::new("left_elbow_angle", upper_arm_l, forearm_l),
                AngleDefinition::new("right_elbow_angle", upper_arm_r, forearm_r),
                AngleDefinition::new("left_hip_angle", torso_l, upper_leg_l),
                AngleDefinition::new("right_hip_angle", torso_r, upper_leg_r),
                AngleDefinition::new("left_inner_hip_angle", pelvis, upper_leg_l),
                AngleDefinition::new("right_inner_hip_angle", pelvis, upper_leg_r),
                AngleDefinition::new("left_knee_angle", upper_leg_l, lower_leg_l),
                AngleDefinition::new("right_knee_angle", upper_leg_r, lower_leg_r),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[AngleDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }
}

impl Default for AngleTable {
    fn default() -> Self {
        Self::reference()
    }
}

/// Turns poses into feature vectors using an [`AngleTable`].
///
/// Holds no per-frame state; `extract` is a pure function of its input.
#[derive(Debug, Clone)]
pub struct AngleExtractor {
    table: AngleTable,
    min_confidence: f32,
}

impl AngleExtractor {
    pub fn new(table: AngleTable) -> Self {
        Self {
            table,
            min_confidence: defaults::MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn table(&self) -> &AngleTable {
        &self.table
    }

    /// Number of values every extracted vector has.
    pub fn feature_len(&self) -> usize {
        self.table.len()
    }

    pub fn extract<P: JointLookup + ?Sized>(
        &self,
        pose: &P,
    ) -> std::result::Result<FeatureVector, ExtractionError> {
        let mut values = Vec::with_capacity(self.table.len());
        for def in &self.table.definitions {
            let first = self.segment_vector(pose, def, def.first)?;
            let second = self.segment_vector(pose, def, def.second)?;
            values.push(angle_between(first, second));
        }
        Ok(FeatureVector(values))
    }

    fn segment_vector<P: JointLookup + ?Sized>(
        &self,
        pose: &P,
        def: &AngleDefinition,
        segment: Segment,
    ) -> std::result::Result<[f64; 3], ExtractionError> {
        let tail = self.position(pose, def, segment.tail)?;
        let head = self.position(pose, def, segment.head)?;
        let v = [head[0] - tail[0], head[1] - tail[1], head[2] - tail[2]];
        if v.iter().any(|c| !c.is_finite()) {
            return Err(ExtractionError::SegmentOverflow {
                angle: def.name.clone(),
                segment,
            });
        }
        if norm(v) < MIN_SEGMENT_LENGTH {
            return Err(ExtractionError::DegenerateSegment {
                angle: def.name.clone(),
                segment,
            });
        }
        Ok(v)
    }

    fn position<P: JointLookup + ?Sized>(
        &self,
        pose: &P,
        def: &AngleDefinition,
        joint: Joint,
    ) -> std::result::Result<[f64; 3], ExtractionError> {
        let landmark = pose
            .landmark(joint)
            .ok_or_else(|| ExtractionError::MissingJoint {
                angle: def.name.clone(),
                joint,
            })?;
        // NaN confidence fails this comparison too
        if !(landmark.confidence >= self.min_confidence) {
            return Err(ExtractionError::LowConfidence {
                angle: def.name.clone(),
                joint,
                confidence: landmark.confidence,
            });
        }
        if !landmark.is_finite() {
            return Err(ExtractionError::NonFinite {
                angle: def.name.clone(),
                joint,
            });
        }
        Ok(landmark.position())
    }
}

impl Default for AngleExtractor {
    fn default() -> Self {
        Self::new(AngleTable::reference())
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// Divides by the largest component so the dot product can't overflow.
fn rescaled(v: [f64; 3]) -> [f64; 3] {
    let largest = v.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    [v[0] / largest, v[1] / largest, v[2] / largest]
}

/// Both vectors must be finite and non-zero. Cosine is clamped so rounding
/// can't push `acos` out of its domain.
fn angle_between(a: [f64; 3], b: [f64; 3]) -> f64 {
    let (a, b) = (rescaled(a), rescaled(b));
    let cos = (dot(a, b) / (norm(a) * norm(b))).clamp(-1.0, 1.0);
    cos.acos()
}
