//! Where arrival notifications come from.
//!
//! [`NotifySource`] listens for files moved into a directory. The backend
//! thread and the interrupt handler both post into one channel, so an
//! interrupt wakes the blocked receive immediately. The interrupt also sets a
//! shared flag, so names already queued are dropped rather than handled.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use crate::error::Result;

/// A blocking stream of directory entry names.
pub trait ArrivalSource {
    /// Next arrived entry name, or `None` once the source is interrupted or closed.
    fn next_name(&mut self) -> Option<String>;
}

enum SourceMessage {
    Fs(notify::Result<Event>),
    Interrupt,
}

/// Stops a [`NotifySource`] from another thread or a signal handler.
#[derive(Clone)]
pub struct Interrupter {
    stop: Arc<AtomicBool>,
    tx: Sender<SourceMessage>,
}

impl Interrupter {
    /// Make the source return `None` from its next call, even if events are queued.
    pub fn interrupt(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.tx.send(SourceMessage::Interrupt);
    }
}

/// Move-into notifications for one directory (non-recursive).
pub struct NotifySource {
    stop: Arc<AtomicBool>,
    tx: Sender<SourceMessage>,
    rx: Receiver<SourceMessage>,
    pending: VecDeque<String>,
    // Dropping the watcher stops the backend.
    _watcher: RecommendedWatcher,
}

impl NotifySource {
    /// Start watching `dir`.
    pub fn new(dir: &Path) -> Result<Self> {
        let (tx, rx) = channel();
        let fs_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = fs_tx.send(SourceMessage::Fs(res));
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        debug!(dir = %dir.display(), "Watching directory");

        Ok(Self {
            stop: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
            pending: VecDeque::new(),
            _watcher: watcher,
        })
    }

    /// Handle for stopping this source, e.g. from a Ctrl-C handler.
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            stop: Arc::clone(&self.stop),
            tx: self.tx.clone(),
        }
    }

    fn interrupted(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

impl ArrivalSource for NotifySource {
    fn next_name(&mut self) -> Option<String> {
        loop {
            if self.interrupted() {
                if !self.pending.is_empty() {
                    debug!(dropped = self.pending.len(), "Interrupted with names queued");
                    self.pending.clear();
                }
                return None;
            }
            if let Some(name) = self.pending.pop_front() {
                return Some(name);
            }
            match self.rx.recv() {
                Ok(SourceMessage::Fs(Ok(event))) => {
                    trace!(?event, "Filesystem event");
                    self.pending.extend(arrived_names(&event));
                }
                Ok(SourceMessage::Fs(Err(e))) => {
                    warn!(error = %e, "Watcher error");
                }
                Ok(SourceMessage::Interrupt) | Err(_) => return None,
            }
        }
    }
}

/// Names of entries moved into the directory by `event`.
fn arrived_names(event: &Event) -> Vec<String> {
    let path = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.first(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.last(),
        _ => None,
    };
    path.and_then(|p| p.file_name())
        .map(|n| vec![n.to_string_lossy().into_owned()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut ev = Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    #[test]
    fn test_moved_to() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/mail/.Junk/cur/msg1:2,S"],
        );
        assert_eq!(arrived_names(&ev), vec!["msg1:2,S".to_string()]);
    }

    #[test]
    fn test_rename_both_uses_destination() {
        let ev = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/mail/.Junk/cur/msg1:2,", "/mail/.Junk/cur/msg1:2,S"],
        );
        assert_eq!(arrived_names(&ev), vec!["msg1:2,S".to_string()]);
    }

    #[test]
    fn test_other_events_ignored() {
        let moved_from = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/mail/cur/msg1:2,S"],
        );
        let created = event(
            EventKind::Create(notify::event::CreateKind::File),
            &["/mail/cur/msg1:2,S"],
        );
        assert!(arrived_names(&moved_from).is_empty());
        assert!(arrived_names(&created).is_empty());
    }

    #[test]
    fn test_interrupt_ends_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = NotifySource::new(tmp.path()).unwrap();
        source.interrupter().interrupt();
        assert_eq!(source.next_name(), None);
    }

    #[test]
    fn test_interrupt_drops_queued_arrivals() {
        let tmp = tempfile::tempdir().unwrap();
        let incoming = tmp.path().join("new");
        let cur = tmp.path().join("cur");
        std::fs::create_dir(&incoming).unwrap();
        std::fs::create_dir(&cur).unwrap();

        let mut source = NotifySource::new(&cur).unwrap();
        for i in 0..3 {
            let from = incoming.join(format!("m{i}"));
            std::fs::write(&from, b"Subject: x\n\n").unwrap();
            std::fs::rename(&from, cur.join(format!("m{i}:2,S"))).unwrap();
        }
        std::thread::sleep(std::time::Duration::from_millis(500));

        source.interrupter().interrupt();
        assert_eq!(source.next_name(), None);
        assert_eq!(source.next_name(), None);
    }

    #[test]
    fn test_interrupt_after_partial_drain() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = NotifySource::new(tmp.path()).unwrap();
        source.pending.extend(["a:2,S".to_string(), "b:2,S".to_string()]);

        assert_eq!(source.next_name().as_deref(), Some("a:2,S"));
        source.interrupter().interrupt();
        assert_eq!(source.next_name(), None);
        assert!(source.pending.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(NotifySource::new(&tmp.path().join("missing")).is_err());
    }
}
