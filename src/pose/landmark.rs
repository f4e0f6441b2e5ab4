//! Landmarks and the pose lookup capability.

use super::joint::Joint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn full_confidence() -> f32 {
    1.0
}

/// A single 3D joint position with detector confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Detector confidence / in-frame likelihood, 0-1. Missing means certain.
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Read access to named joints of one frame's pose.
///
/// The processing core only ever reads joints through this trait, so any
/// detector output can be adapted without copying into [`Pose`].
pub trait JointLookup {
    /// Returns the landmark for `joint`, or `None` if the detector did not report it.
    fn landmark(&self, joint: Joint) -> Option<Landmark>;
}

impl<T: JointLookup + ?Sized> JointLookup for &T {
    fn landmark(&self, joint: Joint) -> Option<Landmark> {
        (**self).landmark(joint)
    }
}

impl JointLookup for HashMap<Joint, Landmark> {
    fn landmark(&self, joint: Joint) -> Option<Landmark> {
        self.get(&joint).copied()
    }
}

/// Owned pose for one frame: joint name to landmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub landmarks: HashMap<Joint, Landmark>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.landmarks.insert(joint, landmark);
        self
    }

    pub fn insert(&mut self, joint: Joint, landmark: Landmark) -> Option<Landmark> {
        self.landmarks.insert(joint, landmark)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Returns a copy with every position passed through `f`, confidence kept.
    pub fn map_positions(&self, f: impl Fn([f64; 3]) -> [f64; 3]) -> Self {
        let landmarks = self
            .landmarks
            .iter()
            .map(|(joint, lm)| {
                let [x, y, z] = f(lm.position());
                (
                    *joint,
                    Landmark {
                        x,
                        y,
                        z,
                        confidence: lm.confidence,
                    },
                )
            })
            .collect();
        Self { landmarks }
    }
}

impl JointLookup for Pose {
    fn landmark(&self, joint: Joint) -> Option<Landmark> {
        self.landmarks.get(&joint).copied()
    }
}
