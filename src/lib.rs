//! reptrack - exercise recognition and repetition counting
//!
//! Turns a stream of 3D body poses into a debounced exercise label and a
//! repetition count.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod debounce;
pub mod defaults;
pub mod error;
pub mod pose;
pub mod replay;
pub mod session;
pub mod sink;

// Pose input and features
pub use pose::{AngleExtractor, AngleTable, FeatureVector, Joint, JointLookup, Landmark, Pose};

// Classification
pub use classifier::{Classifier, ClassifierError, ClassifierSet, Label, ModelBundle};

// Session
pub use session::{ErrorReporter, FrameError, FrameOutcome, PoseProcessor, SessionPolicy, Tally};

// Output
pub use sink::{CollectorSink, SinkEvent, StdoutSink, TallySink};

// Error handling
pub use error::{RepTrackError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_only_when_built_from_git() {
        let ver = version_string();
        match option_env!("GIT_HASH") {
            Some(hash) if !hash.is_empty() => assert_eq!(ver.split('+').nth(1), Some(hash)),
            _ => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
