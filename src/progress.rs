//! Progress reporting for the country fetch loop
//!
//! The loader reports through a [`ProgressSink`]. The sink can be a plain
//! callback, nothing at all, or the sending half of a tokio channel feeding a
//! display on another task.

use tokio::sync::mpsc;

use crate::loader::LoadReport;

/// How far the fetch loop has got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Countries processed so far, including skipped ones
    pub done: usize,
    pub total: usize,
    /// `floor(done * 100 / total)`, or 100 when there is nothing to do
    pub percent: u8,
}

impl Progress {
    pub fn new(done: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (done.min(total) * 100 / total) as u8
        };
        Self {
            done,
            total,
            percent,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.done >= self.total
    }

    /// Fraction in `0.0..=1.0`, for gauges
    pub fn ratio(&self) -> f64 {
        f64::from(self.percent) / 100.0
    }
}

/// Receives progress updates from a load
pub trait ProgressSink: Send + Sync {
    /// Called after each country
    fn report(&self, progress: Progress);

    /// Called when the load is served from cache and no progress will follow
    fn hide(&self) {}
}

/// Sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: Progress) {}
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}

/// Messages sent from a background load to whoever displays it
#[derive(Debug)]
pub enum LoadEvent {
    /// A country has been processed
    Progress(Progress),
    /// Data came from the cache; no progress will follow
    Hidden,
    /// The load ended, successfully or not
    Finished(Result<LoadReport, String>),
}

impl ProgressSink for mpsc::UnboundedSender<LoadEvent> {
    fn report(&self, progress: Progress) {
        // The receiver may already be gone; the load carries on regardless.
        let _ = self.send(LoadEvent::Progress(progress));
    }

    fn hide(&self) {
        let _ = self.send(LoadEvent::Hidden);
    }
}
