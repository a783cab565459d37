//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::pass::{IrUnit, PassInstrumentation};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[cfg(feature = "enable-serde")]
use serde::Serialize;

/// Accumulated time for every run of a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize))]
pub struct TimingEntry {
    /// The name of the pass.
    pub pass: String,
    /// How many times the pass ran, failed runs included.
    pub runs: usize,
    /// The total wall-clock time spent in the pass.
    pub total: Duration,
}

impl TimingEntry {
    /// Gets the average time of a single run.
    pub fn average(&self) -> Duration {
        match self.runs {
            0 => Duration::ZERO,
            runs => self.total / runs as u32,
        }
    }
}

/// A shared view of the timing data collected by a [`PassTiming`].
///
/// Passes are listed in the order they first finished. Time spent in a pass that
/// runs other passes (like the function adaptor) includes the nested passes.
#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    entries: Rc<RefCell<Vec<TimingEntry>>>,
}

impl TimingReport {
    /// Gets a copy of every entry.
    pub fn entries(&self) -> Vec<TimingEntry> {
        self.entries.borrow().clone()
    }

    /// Gets how many times `pass` has run.
    pub fn runs(&self, pass: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.pass == pass)
            .map_or(0, |entry| entry.runs)
    }

    /// Gets the total time spent in `pass`.
    pub fn total(&self, pass: &str) -> Duration {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.pass == pass)
            .map_or(Duration::ZERO, |entry| entry.total)
    }

    fn record(&self, pass: &str, elapsed: Duration) {
        let mut entries = self.entries.borrow_mut();

        match entries.iter_mut().find(|entry| entry.pass == pass) {
            Some(entry) => {
                entry.runs += 1;
                entry.total += elapsed;
            }
            None => entries.push(TimingEntry {
                pass: pass.to_owned(),
                runs: 1,
                total: elapsed,
            }),
        }
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();

        writeln!(f, "{}", "=".repeat(64))?;
        writeln!(f, "{:<30} {:>8} {:>12} {:>12}", "Pass", "Runs", "Total Time", "Avg Time")?;
        writeln!(f, "{}", "-".repeat(64))?;

        for entry in entries.iter() {
            writeln!(
                f,
                "{:<30} {:>8} {:>12.3?} {:>12.3?}",
                entry.pass,
                entry.runs,
                entry.total,
                entry.average()
            )?;
        }

        writeln!(f, "{}", "=".repeat(64))
    }
}

/// Measures the wall-clock time of every pass that runs.
///
/// Register it through [`PassManager::enable_timing`](crate::pass::PassManager::enable_timing),
/// which hands back the [`TimingReport`] that it writes into.
#[derive(Debug, Default)]
pub struct PassTiming {
    // passes nest, the innermost running pass is at the top
    running: Vec<Instant>,
    report: TimingReport,
}

impl PassTiming {
    /// Creates a timer with an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a handle to the report this timer writes into.
    pub fn report(&self) -> TimingReport {
        self.report.clone()
    }

    fn finish(&mut self, pass: &str) {
        if let Some(start) = self.running.pop() {
            self.report.record(pass, start.elapsed());
        }
    }
}

impl PassInstrumentation for PassTiming {
    fn before_pass(&mut self, _: &str, _: IrUnit<'_>) {
        self.running.push(Instant::now());
    }

    fn after_pass(&mut self, pass: &str, _: IrUnit<'_>) {
        self.finish(pass);
    }

    fn after_pass_failed(&mut self, pass: &str, _: IrUnit<'_>) {
        self.finish(pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Module;

    #[test]
    fn nested_passes_are_recorded_in_first_finished_order() {
        let m = Module::new("test");
        let mut timing = PassTiming::new();
        let report = timing.report();

        timing.before_pass("outer", IrUnit::Module(&m));
        timing.before_pass("inner", IrUnit::Module(&m));
        timing.after_pass("inner", IrUnit::Module(&m));
        timing.before_pass("inner", IrUnit::Module(&m));
        timing.after_pass_failed("inner", IrUnit::Module(&m));
        timing.after_pass("outer", IrUnit::Module(&m));

        let entries = report.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pass, "inner");
        assert_eq!(entries[0].runs, 2);
        assert_eq!(entries[1].pass, "outer");
        assert!(report.total("outer") >= report.total("inner"));
        assert_eq!(report.runs("missing"), 0);
    }

    #[test]
    fn report_lists_every_pass() {
        let m = Module::new("test");
        let mut timing = PassTiming::new();

        timing.before_pass("dce", IrUnit::Module(&m));
        timing.after_pass("dce", IrUnit::Module(&m));

        let text = timing.report().to_string();

        assert!(text.contains("dce"));
        assert!(text.contains("Total Time"));
    }
}
