//! Continuous mode: process every report moved into a maildir folder, once.
//!
//! The loop is single-threaded. Each event is handled completely (extract,
//! optional pause, delivery, cleanup) before the next one is read, so the
//! seen set needs no locking.

pub mod event;
pub mod seen;
pub mod source;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_DELETED_MARKER;
use crate::deliver::Deliver;
use crate::processor::{Extract, Extraction};

pub use event::ArrivalEvent;
pub use seen::SeenSet;
pub use source::{ArrivalSource, Interrupter, NotifySource};

/// Watch loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Pause before each delivery.
    pub delay: Duration,
    /// Filename suffix of entries already marked for removal.
    pub deleted_marker: char,
    /// Bound on remembered base identifiers (`None` = unbounded).
    pub seen_capacity: Option<NonZeroUsize>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            deleted_marker: DEFAULT_DELETED_MARKER,
            seen_capacity: None,
        }
    }
}

/// Counters for one watch session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Arrival notifications received.
    pub events: u64,
    /// Notifications for an already seen delivery.
    pub duplicates: u64,
    /// New deliveries skipped because they carry the deletion marker.
    pub deleted: u64,
    /// Files that were not spam reports, or had no original inside.
    pub not_extracted: u64,
    /// Originals extracted.
    pub extracted: u64,
    /// Extracted messages the delivery agent accepted.
    pub delivered: u64,
    /// Deliveries that failed to run or exited non-zero.
    pub delivery_failures: u64,
    /// Files that could not be processed at all.
    pub errors: u64,
}

/// Dedups arrival events and pushes extracted originals to delivery.
pub struct WatchLoop<E, D> {
    dir: PathBuf,
    extractor: E,
    delivery: D,
    options: WatchOptions,
    seen: SeenSet,
    summary: WatchSummary,
}

impl<E: Extract, D: Deliver> WatchLoop<E, D> {
    pub fn new(dir: impl Into<PathBuf>, extractor: E, delivery: D, options: WatchOptions) -> Self {
        let seen = SeenSet::new(options.seen_capacity);
        Self {
            dir: dir.into(),
            extractor,
            delivery,
            options,
            seen,
            summary: WatchSummary::default(),
        }
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn summary(&self) -> &WatchSummary {
        &self.summary
    }

    /// Handle events until `source` runs dry or is interrupted.
    pub fn run<S: ArrivalSource>(&mut self, source: &mut S) -> WatchSummary {
        info!(dir = %self.dir.display(), "Watching for changes");
        while let Some(name) = source.next_name() {
            self.handle(&name);
        }
        info!(
            dir = %self.dir.display(),
            events = self.summary.events,
            extracted = self.summary.extracted,
            delivered = self.summary.delivered,
            failures = self.summary.delivery_failures,
            "Finished watching"
        );
        self.summary.clone()
    }

    /// Handle one arrival. Never fails: problems are logged and counted.
    pub fn handle(&mut self, name: &str) {
        self.summary.events += 1;
        let event = ArrivalEvent::new(name, self.options.deleted_marker);

        if !self.seen.insert(event.base()) {
            debug!(name, base = event.base(), "Already seen");
            self.summary.duplicates += 1;
            return;
        }

        if event.is_deleted() {
            info!(base = event.base(), "Ignoring message marked as deleted");
            self.summary.deleted += 1;
            return;
        }

        let path = self.dir.join(event.name());
        let extracted = match self.extractor.extract(&path) {
            Ok(Extraction::Extracted(p)) => p,
            Ok(outcome) => {
                debug!(path = %path.display(), ?outcome, "Nothing to deliver");
                self.summary.not_extracted += 1;
                return;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to process mail");
                self.summary.errors += 1;
                return;
            }
        };
        self.summary.extracted += 1;

        if !self.options.delay.is_zero() {
            info!(
                secs = self.options.delay.as_secs_f64(),
                "Got a spam mail, sleeping"
            );
            std::thread::sleep(self.options.delay);
        }

        match self.delivery.deliver(&extracted) {
            Ok(report) if report.success() => {
                info!(path = %path.display(), code = ?report.code, "Processed spam mail");
                self.summary.delivered += 1;
            }
            Ok(report) => {
                warn!(path = %path.display(), code = ?report.code, "Delivery agent rejected message");
                self.summary.delivery_failures += 1;
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    kept = %extracted.display(),
                    error = %e,
                    "Delivery failed, keeping extracted message"
                );
                self.summary.delivery_failures += 1;
                return;
            }
        }

        if let Err(e) = std::fs::remove_file(&extracted) {
            warn!(path = %extracted.display(), error = %e, "Failed to remove extracted message");
        }
    }
}
