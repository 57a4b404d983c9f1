// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

/// Receives upload progress of a sequence load.
///
/// A load calls [`Progress::start`] once with the number of units, then
/// [`Progress::advance`] once per dispatched (slot, channel) and finally
/// [`Progress::finish`] on success.
pub trait Progress {
    fn start(&mut self, total: usize);
    fn advance(&mut self);
    fn finish(&mut self);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _total: usize) {}
    fn advance(&mut self) {}
    fn finish(&mut self) {}
}

/// Reports progress as log records, at most once per `step` percent.
#[derive(Debug, Clone)]
pub struct LogProgress {
    step: usize,
    total: usize,
    done: usize,
    last_reported: usize,
}

impl LogProgress {
    pub fn new(step: usize) -> Self {
        LogProgress {
            step: step.clamp(1, 100),
            total: 0,
            done: 0,
            last_reported: 0,
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.done * 100 / self.total
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        LogProgress::new(10)
    }
}

impl Progress for LogProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.last_reported = 0;
        sequencer_log::info!("Loading sequence: {total} uploads");
    }

    fn advance(&mut self) {
        self.done += 1;
        let percent = self.percent();
        if percent >= self.last_reported + self.step {
            self.last_reported = percent - percent % self.step;
            sequencer_log::info!("Loading sequence: {percent}% ({}/{})", self.done, self.total);
        }
    }

    fn finish(&mut self) {
        sequencer_log::info!("Sequence loaded: {}/{} uploads", self.done, self.total);
    }
}

/// Counts calls; used to check progress accounting.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingProgress {
    pub total: Option<usize>,
    pub advanced: usize,
    pub finished: bool,
}

#[cfg(test)]
impl Progress for CountingProgress {
    fn start(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn advance(&mut self) {
        self.advanced += 1;
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
