// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-run inference metrics and outcomes.
//!
//! Execution timing is measured by the pipeline around each execute call
//! purely for reporting — it is not part of the correctness contract.
//! The average is only defined over a complete set of runs: a failed
//! call aborts the loop before any division happens.

use buffer_manager::TransferStats;
use std::time::Duration;

/// The outcome of one per-digit inference run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DigitOutcome {
    /// The digit that was fed in (also the expected label).
    pub digit: usize,
    /// The ten class scores read back from the output binding.
    pub scores: Vec<f32>,
    /// Index of the highest score.
    pub predicted: usize,
    /// Whether `predicted` equals the expected label.
    pub correct: bool,
    /// Wall-clock duration of the execute call alone.
    pub execute_duration: Duration,
}

/// Aggregate results of a complete ten-digit inference session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InferenceReport {
    /// Per-digit outcomes in digit order.
    pub outcomes: Vec<DigitOutcome>,
    /// Sum of all execute durations.
    pub total_execute: Duration,
    /// Host↔device traffic counters.
    #[serde(skip)]
    pub transfers: TransferStats,
}

impl InferenceReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            total_execute: Duration::ZERO,
            transfers: TransferStats::default(),
        }
    }

    /// Records one completed run.
    pub fn record(&mut self, outcome: DigitOutcome) {
        self.total_execute += outcome.execute_duration;
        self.outcomes.push(outcome);
    }

    /// Attaches the final transfer counters.
    pub fn finalise(&mut self, transfers: TransferStats) {
        self.transfers = transfers;
    }

    /// True when every prediction matched its label.
    pub fn all_correct(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.correct)
    }

    /// Mean execute duration across the recorded runs.
    pub fn average_execute(&self) -> Duration {
        if self.outcomes.is_empty() {
            return Duration::ZERO;
        }
        self.total_execute / self.outcomes.len() as u32
    }

    /// Mean execute duration in milliseconds.
    pub fn average_execute_ms(&self) -> f64 {
        self.average_execute().as_secs_f64() * 1000.0
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let correct = self.outcomes.iter().filter(|o| o.correct).count();
        format!(
            "{}/{} digits correct, average {:.3} ms per run, {}",
            correct,
            self.outcomes.len(),
            self.average_execute_ms(),
            self.transfers.summary(),
        )
    }
}

impl Default for InferenceReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(digit: usize, correct: bool, millis: u64) -> DigitOutcome {
        DigitOutcome {
            digit,
            scores: vec![0.1; 10],
            predicted: if correct { digit } else { (digit + 1) % 10 },
            correct,
            execute_duration: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_empty_report() {
        let r = InferenceReport::new();
        assert!(!r.all_correct());
        assert_eq!(r.average_execute(), Duration::ZERO);
    }

    #[test]
    fn test_record_and_average() {
        let mut r = InferenceReport::new();
        r.record(outcome(0, true, 4));
        r.record(outcome(1, true, 6));
        assert_eq!(r.total_execute, Duration::from_millis(10));
        assert_eq!(r.average_execute(), Duration::from_millis(5));
        assert!(r.average_execute_ms() >= 0.0);
    }

    #[test]
    fn test_all_correct() {
        let mut r = InferenceReport::new();
        r.record(outcome(0, true, 1));
        r.record(outcome(1, true, 1));
        assert!(r.all_correct());

        r.record(outcome(2, false, 1));
        assert!(!r.all_correct());
    }

    #[test]
    fn test_summary() {
        let mut r = InferenceReport::new();
        r.record(outcome(0, true, 2));
        r.record(outcome(1, false, 2));
        let s = r.summary();
        assert!(s.contains("1/2 digits correct"));
    }
}
