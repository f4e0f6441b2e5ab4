//! Pluggable output for session events.
//!
//! The replay loop turns each [`FrameOutcome`] into zero or more
//! [`SinkEvent`]s and hands them to a [`TallySink`].

use crate::classifier::Label;
use crate::error::Result;
use crate::session::{FrameOutcome, Tally};
use serde::Serialize;
use std::io::Write;

/// Something a user would want to see: the exercise or stage changed, or a
/// repetition was counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    ExerciseChanged {
        frame: u64,
        previous: Option<Label>,
        exercise: Label,
    },
    StageChanged {
        frame: u64,
        exercise: Label,
        stage: Label,
    },
    Repetition {
        frame: u64,
        exercise: Label,
        reps: u32,
    },
}

impl SinkEvent {
    /// Events for one frame's outcome. `tally` is the session tally after
    /// the frame was processed.
    pub fn from_outcome(frame: u64, outcome: &FrameOutcome, tally: &Tally) -> Vec<SinkEvent> {
        let Some(exercise) = tally.exercise.clone() else {
            return Vec::new();
        };
        match outcome {
            FrameOutcome::ExerciseChanged { previous, current } => {
                vec![SinkEvent::ExerciseChanged {
                    frame,
                    previous: previous.clone(),
                    exercise: current.clone(),
                }]
            }
            FrameOutcome::StageConfirmed { stage, rep_counted } => {
                let mut events = vec![SinkEvent::StageChanged {
                    frame,
                    exercise: exercise.clone(),
                    stage: stage.clone(),
                }];
                if *rep_counted {
                    events.push(SinkEvent::Repetition {
                        frame,
                        exercise,
                        reps: tally.reps,
                    });
                }
                events
            }
            FrameOutcome::Skipped(_)
            | FrameOutcome::ExerciseUnsettled
            | FrameOutcome::StageSkipped(_)
            | FrameOutcome::Holding => Vec::new(),
        }
    }
}

/// Receives session events.
pub trait TallySink: Send + 'static {
    fn handle(&mut self, event: &SinkEvent) -> Result<()>;

    /// Called once after the last frame.
    fn finish(&mut self, _tally: &Tally) -> Result<()> {
        Ok(())
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// One tally line: exercise name, two spaces, arrow, rep count.
pub fn tally_line(exercise: &Label, reps: u32) -> String {
    format!("{}  -> {}", exercise, reps)
}

/// Writes a tally line whenever the tally changes, or every event as a JSON
/// line in `json` mode.
pub struct StdoutSink<W: Write + Send + 'static = std::io::Stdout> {
    out: W,
    json: bool,
}

impl StdoutSink {
    pub fn new(json: bool) -> Self {
        Self::with_writer(std::io::stdout(), json)
    }
}

impl<W: Write + Send + 'static> StdoutSink<W> {
    pub fn with_writer(out: W, json: bool) -> Self {
        Self { out, json }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> TallySink for StdoutSink<W> {
    fn handle(&mut self, event: &SinkEvent) -> Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, event)?;
            writeln!(self.out)?;
            return Ok(());
        }
        match event {
            SinkEvent::ExerciseChanged { exercise, .. } => {
                writeln!(self.out, "{}", tally_line(exercise, 0))?;
            }
            SinkEvent::Repetition { exercise, reps, .. } => {
                writeln!(self.out, "{}", tally_line(exercise, *reps))?;
            }
            SinkEvent::StageChanged { .. } => {}
        }
        Ok(())
    }

    fn finish(&mut self, _tally: &Tally) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Keeps every event, for tests and library use.
#[derive(Debug, Default)]
pub struct CollectorSink {
    events: Vec<SinkEvent>,
    final_tally: Option<Tally>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Tally passed to `finish`, if it has been called.
    pub fn final_tally(&self) -> Option<&Tally> {
        self.final_tally.as_ref()
    }

    /// Frames at which repetitions were counted.
    pub fn repetition_frames(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Repetition { frame, .. } => Some(*frame),
                _ => None,
            })
            .collect()
    }
}

impl TallySink for CollectorSink {
    fn handle(&mut self, event: &SinkEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn finish(&mut self, tally: &Tally) -> Result<()> {
        self.final_tally = Some(tally.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
