//! Exercise/stage debouncing and repetition counting.

pub mod error;
pub mod processor;
pub mod state;

pub use error::{ErrorReporter, FrameError, LogReporter};
pub use processor::PoseProcessor;
pub use state::{FrameOutcome, SessionPolicy, SessionState, Tally};
