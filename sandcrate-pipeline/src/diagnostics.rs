//! Per-cycle timing log handed back to the host

use std::fmt;
use std::time::{Duration, Instant};

/// Pipeline stages that are timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Blur,
    Averaging,
    PointCloudGeneration,
    Coloring,
    Meshing,
    PointCloudOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Blur => "Blur",
            Stage::Averaging => "Frame averaging",
            Stage::PointCloudGeneration => "Point cloud generation",
            Stage::Coloring => "Coloring",
            Stage::Meshing => "Meshing",
            Stage::PointCloudOutput => "Point cloud output",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

impl fmt::Display for StageTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ms", self.stage, self.elapsed.as_millis())
    }
}

/// What happened during one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub timings: Vec<StageTiming>,
    pub notes: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` and record how long it took
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.timings.push(StageTiming {
            stage,
            elapsed: start.elapsed(),
        });
        out
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn has_note(&self, note: &str) -> bool {
        self.notes.iter().any(|n| n == note)
    }

    pub fn timing(&self, stage: Stage) -> Option<Duration> {
        self.timings.iter().find(|t| t.stage == stage).map(|t| t.elapsed)
    }

    pub fn total(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }

    /// One host-facing line per note and per timed stage
    pub fn lines(&self) -> Vec<String> {
        self.notes
            .iter()
            .cloned()
            .chain(self.timings.iter().map(ToString::to_string))
            .collect()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}
