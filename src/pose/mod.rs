//! Pose input and joint-angle features.
//!
//! ```text
//! Pose (named 3D joints) ──▶ AngleExtractor ──▶ FeatureVector (12 angles, radians)
//! ```

pub mod angles;
pub mod joint;
pub mod landmark;

pub use angles::{
    AngleDefinition, AngleExtractor, AngleTable, ExtractionError, FeatureVector, Segment,
};
pub use joint::Joint;
pub use landmark::{JointLookup, Landmark, Pose};
