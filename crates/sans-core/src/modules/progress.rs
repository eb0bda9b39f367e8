use crate::domain::ProcessType;
use tracing::debug;

/// Reports progress once per branch level of the correction chain; a process type
/// reaches `index + 1` levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    process: ProcessType,
    reports: usize,
    done: usize,
}

impl Progress {
    pub fn new(process: ProcessType) -> Self {
        Self {
            process,
            reports: process.index() + 1,
            done: 0,
        }
    }

    pub fn report(&mut self, message: &str) {
        self.done = (self.done + 1).min(self.reports);
        debug!(
            process = %self.process,
            fraction = self.fraction(),
            message,
            "reduction progress"
        );
    }

    pub fn reports(&self) -> usize {
        self.reports
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn fraction(&self) -> f64 {
        self.done as f64 / self.reports as f64
    }
}
