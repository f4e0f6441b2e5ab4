//! Default configuration constants for reptrack.
//!
//! Shared between the config file layer and the library types so both agree
//! on what "default" means.

/// Default exercise debounce window, in frames.
///
/// 120 frames is about four seconds of video at 30 fps. The exercise label
/// has to win the majority over this window (and agree with the newest
/// prediction) before it is acted upon.
pub const EXERCISE_WINDOW: usize = 120;

/// Default stage debounce window, in frames.
///
/// A stage is confirmed only when every prediction in this window agrees.
/// Short enough to follow a fast repetition, long enough to drop single
/// misclassified frames.
pub const STAGE_WINDOW: usize = 5;

/// Minimum landmark confidence for a joint to be used in angle extraction.
///
/// Matches the in-frame likelihood cut-off the pose detector output is
/// usually filtered with.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// Stage whose confirmed arrival counts one repetition.
pub const REP_STAGE: &str = "start";

/// Number of frames the replay reader may run ahead of the processing loop.
pub const REPLAY_CHANNEL_CAPACITY: usize = 256;
