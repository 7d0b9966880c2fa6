//! Perf timers (§4.4/§4.5): top-level phases use a `#` label, steps within
//! them use `##`. `BUILD` and `GENERATE` are always recorded; finer-grained
//! timers are only populated when `InputOptions::perf` is enabled.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Timings {
    totals: BTreeMap<String, Duration>,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: &str, elapsed: Duration) {
        *self.totals.entry(label.to_string()).or_default() += elapsed;
    }

    /// `[(label, milliseconds)]`, ordered as the specification's
    /// `getTimings()` returns them: alphabetically by label.
    pub fn as_millis(&self) -> Vec<(String, f64)> {
        self.totals
            .iter()
            .map(|(label, dur)| (label.clone(), dur.as_secs_f64() * 1000.0))
            .collect()
    }
}

/// A running timer for one labeled phase; `finish` records the elapsed
/// time and, when `perf` is disabled, the caller simply drops the guard
/// without ever calling `finish`.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    pub fn finish(self, timings: &mut Timings) {
        timings.record(&self.label, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reports_labeled_durations() {
        let mut timings = Timings::new();
        let timer = Timer::start("# BUILD");
        timer.finish(&mut timings);
        let millis = timings.as_millis();
        assert_eq!(millis.len(), 1);
        assert_eq!(millis[0].0, "# BUILD");
    }

    #[test]
    fn accumulates_repeated_labels() {
        let mut timings = Timings::new();
        Timer::start("## transform").finish(&mut timings);
        Timer::start("## transform").finish(&mut timings);
        assert_eq!(timings.as_millis().len(), 1);
    }
}
