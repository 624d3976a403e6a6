//! Build report
//!
//! Aggregates step records into a verdict, an exit code for the front-end
//! and a plain-text narrative.

use crate::step::{Outcome, StepKind, StepRecord};
use serde::Serialize;
use std::path::Path;

/// Exit code used when the failing step has no exit code of its own
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Executed steps, in order
    pub steps: Vec<StepRecord>,
    /// Success, or Failure carrying the exit code to propagate
    pub verdict: Outcome,
    /// Step that aborted the sequence
    pub failed_step: Option<StepKind>,
}

impl Default for BuildReport {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildReport {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            verdict: Outcome::Success,
            failed_step: None,
        }
    }

    /// Append a record; the first fatal failure sets the verdict
    pub fn push(&mut self, record: StepRecord) {
        if record.is_fatal() && self.failed_step.is_none() {
            let code = record
                .exit_code()
                .filter(|code| *code != 0)
                .unwrap_or(FAILURE_EXIT_CODE);
            self.verdict = Outcome::Failure(code);
            self.failed_step = Some(record.step);
        }
        self.steps.push(record);
    }

    /// Check if the build succeeded
    pub fn success(&self) -> bool {
        self.verdict.is_success()
    }

    /// Exit code for the invoking process
    pub fn exit_code(&self) -> i32 {
        match self.verdict {
            Outcome::Success => 0,
            Outcome::Failure(code) => code,
            Outcome::NotFound => FAILURE_EXIT_CODE,
        }
    }

    /// Record of a step, if it ran
    pub fn step(&self, kind: StepKind) -> Option<&StepRecord> {
        self.steps.iter().find(|record| record.step == kind)
    }

    pub fn executed(&self, kind: StepKind) -> bool {
        self.step(kind).is_some()
    }

    /// Record that aborted the sequence
    pub fn fatal_failure(&self) -> Option<&StepRecord> {
        self.failed_step.and_then(|kind| self.step(kind))
    }

    /// Advisory failures in step order
    pub fn advisories(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|record| record.is_advisory_failure())
    }

    /// Main executable, when it was located
    pub fn artifact(&self) -> Option<&Path> {
        self.step(StepKind::LocateArtifact)
            .filter(|record| !record.failed())
            .and_then(|record| record.artifact.as_deref())
    }

    /// Final verdict line
    pub fn headline(&self) -> String {
        match self.fatal_failure() {
            Some(record) => format!("Build failed at {}: {}", record.step, record.describe()),
            None => {
                let advisories = self.advisories().count();
                match advisories {
                    0 => "Build succeeded".to_string(),
                    1 => "Build succeeded with 1 advisory failure".to_string(),
                    n => format!("Build succeeded with {} advisory failures", n),
                }
            }
        }
    }

    /// Plain-text narrative: one line per executed step, then the verdict
    pub fn narrative(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .steps
            .iter()
            .map(|record| format!("{}: {}", record.step, record.describe()))
            .collect();
        lines.push(self.headline());
        lines
    }

    /// Machine-readable summary
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success(),
            "exit_code": self.exit_code(),
            "failed_step": self.failed_step,
            "artifact": self.artifact(),
            "advisories": self.advisories().map(|record| record.step).collect::<Vec<_>>(),
            "steps": self.steps,
        })
    }
}
