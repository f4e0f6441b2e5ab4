//! Offline replay of a recorded pose stream.
//!
//! Input is JSON lines, one pose per line:
//!
//! ```text
//! {"landmarks": {"left_shoulder": {"x": 0.2, "y": 1.5, "z": 0.0, "confidence": 0.98}, ...}}
//! ```
//!
//! A reader thread parses lines and sends them over a bounded channel; the
//! calling thread is the only one that touches the session.

use crate::defaults;
use crate::error::{RepTrackError, Result};
use crate::pose::Pose;
use crate::session::{FrameOutcome, PoseProcessor, Tally};
use crate::sink::{SinkEvent, TallySink};
use crossbeam_channel::{Receiver, bounded};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    /// 1-based line number in the input.
    pub line: u64,
    pub pose: Pose,
}

/// What the reader thread hands to the processing loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayMessage {
    Frame(PoseFrame),
    /// A line that did not parse. Reported and skipped.
    Malformed { line: u64, message: String },
}

/// Counters for a finished replay.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReplaySummary {
    /// Poses read from the input.
    pub frames: u64,
    /// Frames that reached the exercise window.
    pub processed: u64,
    /// Frames dropped before classification completed.
    pub skipped: u64,
    /// Lines that were not valid pose JSON.
    pub malformed: u64,
    pub tally: Tally,
}

/// Opens `path` for reading; `-` means stdin.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

fn parse_line(line_no: u64, line: &str) -> ReplayMessage {
    match serde_json::from_str::<Pose>(line) {
        Ok(pose) => ReplayMessage::Frame(PoseFrame {
            line: line_no,
            pose,
        }),
        Err(e) => ReplayMessage::Malformed {
            line: line_no,
            message: e.to_string(),
        },
    }
}

/// Parsed frames from a reader thread.
pub struct FrameStream {
    rx: Receiver<ReplayMessage>,
    reader: Option<JoinHandle<Result<()>>>,
}

impl FrameStream {
    /// Starts the reader thread. At most `capacity` parsed lines wait in the
    /// channel at any time.
    pub fn spawn<R: BufRead + Send + 'static>(input: R, capacity: usize) -> Result<Self> {
        let (tx, rx) = bounded(capacity.max(1));
        let reader = thread::Builder::new()
            .name("reptrack-reader".to_string())
            .spawn(move || {
                for (index, bytes) in input.split(b'\n').enumerate() {
                    let line_no = index as u64 + 1;
                    let bytes = bytes?;
                    let message = match std::str::from_utf8(&bytes) {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => parse_line(line_no, line),
                        Err(e) => ReplayMessage::Malformed {
                            line: line_no,
                            message: e.to_string(),
                        },
                    };
                    if tx.send(message).is_err() {
                        // Consumer hung up
                        break;
                    }
                }
                Ok(())
            })?;
        Ok(Self {
            rx,
            reader: Some(reader),
        })
    }

    /// Waits for the reader thread and returns its I/O result.
    pub fn finish(mut self) -> Result<()> {
        self.join_reader()
    }

    fn join_reader(&mut self) -> Result<()> {
        match self.reader.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RepTrackError::Other("reader thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Iterator for FrameStream {
    type Item = ReplayMessage;

    fn next(&mut self) -> Option<ReplayMessage> {
        self.rx.recv().ok()
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        // Unblock the reader before joining it
        let (_, closed) = bounded(0);
        drop(std::mem::replace(&mut self.rx, closed));
        if let Err(e) = self.join_reader() {
            debug!("reader stopped with error: {}", e);
        }
    }
}

/// Feeds every pose in `input` through `processor` and forwards events to
/// `sink`.
///
/// Frame-level failures are counted and reported, never returned. Only I/O
/// errors on the input and sink errors end the replay early.
pub fn run<R: BufRead + Send + 'static>(
    input: R,
    processor: &mut PoseProcessor,
    sink: &mut dyn TallySink,
) -> Result<ReplaySummary> {
    let mut stream = FrameStream::spawn(input, defaults::REPLAY_CHANNEL_CAPACITY)?;
    let mut summary = ReplaySummary::default();

    for message in stream.by_ref() {
        match message {
            ReplayMessage::Frame(frame) => {
                summary.frames += 1;
                let index = processor.frames_seen();
                let outcome = processor.process_frame(&frame.pose);
                if let FrameOutcome::Skipped(_) = outcome {
                    summary.skipped += 1;
                    continue;
                }
                summary.processed += 1;
                for event in SinkEvent::from_outcome(index, &outcome, &processor.tally()) {
                    sink.handle(&event)?;
                }
            }
            ReplayMessage::Malformed { line, message } => {
                summary.malformed += 1;
                warn!(line, "skipping malformed pose: {}", message);
            }
        }
    }
    stream.finish()?;

    summary.tally = processor.tally();
    sink.finish(&summary.tally)?;
    debug!(
        frames = summary.frames,
        skipped = summary.skipped,
        malformed = summary.malformed,
        "replay finished"
    );
    Ok(summary)
}
