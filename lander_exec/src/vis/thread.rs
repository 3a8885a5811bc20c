//! # Visualisation thread
//!
//! Background thread rendering the latest snapshot from a [`SnapshotSlot`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{error, info, warn};
use serde::Serialize;
use util::logger::LogHandle;

use super::{SnapshotSlot, Visualiser};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct VisThread {
    stop: Arc<AtomicBool>,

    handle: Option<JoinHandle<VisStats>>,

    log: LogHandle,
}

/// Statistics of a finished visualisation thread.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct VisStats {
    /// Snapshots rendered successfully
    pub num_rendered: u64,

    /// Snapshots the visualiser failed to render
    pub num_errors: u64,

    /// Snapshots replaced in the slot before being rendered
    pub num_dropped: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VisThread {
    /// Start rendering snapshots from `slot` with `visualiser`.
    pub fn spawn(
        slot: SnapshotSlot,
        mut visualiser: Box<dyn Visualiser>,
        poll_period: Duration,
        log: LogHandle,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();
        let log_thread = log.clone();

        let handle = thread::spawn(move || {
            let mut stats = VisStats::default();

            while !stop_thread.load(Ordering::Relaxed) {
                let snapshot = match slot.wait_take(poll_period) {
                    Some(s) => s,
                    None => continue,
                };

                // Render errors are reported but never stop the thread
                match visualiser.show(&snapshot) {
                    Ok(()) => stats.num_rendered += 1,
                    Err(e) => {
                        stats.num_errors += 1;
                        warn!(
                            target: log_thread.target(),
                            "Could not show snapshot {}: {}",
                            snapshot.cycle,
                            e
                        );
                    }
                }
            }

            visualiser.close();
            stats.num_dropped = slot.num_overwritten();

            stats
        });

        info!(target: log.target(), "Visualisation thread started");

        Self {
            stop,
            handle: Some(handle),
            log,
        }
    }

    /// Signal the thread to stop and wait for it to finish.
    pub fn stop(mut self) -> VisStats {
        self.stop.store(true, Ordering::Relaxed);

        let stats = match self.handle.take().map(|h| h.join()) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                error!(target: self.log.target(), "Visualisation thread panicked");
                VisStats::default()
            }
            None => VisStats::default(),
        };

        info!(
            target: self.log.target(),
            "Visualisation thread stopped: {} rendered, {} errors, {} dropped",
            stats.num_rendered,
            stats.num_errors,
            stats.num_dropped
        );

        stats
    }
}

impl Drop for VisThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            h.join().ok();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vis::{test_snapshot, Snapshot, VisError};
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    /// A visualiser taking a long time to render, recording what it showed.
    struct SlowVisualiser {
        delay: Duration,
        shown: Arc<Mutex<Vec<u64>>>,
    }

    impl Visualiser for SlowVisualiser {
        fn show(&mut self, snapshot: &Snapshot) -> Result<(), VisError> {
            thread::sleep(self.delay);
            self.shown.lock().unwrap().push(snapshot.cycle);
            Ok(())
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_slow_render_never_blocks_publish() {
        let slot = SnapshotSlot::new();
        let shown = Arc::new(Mutex::new(Vec::new()));

        let vis = VisThread::spawn(
            slot.clone(),
            Box::new(SlowVisualiser {
                delay: Duration::from_millis(100),
                shown: shown.clone(),
            }),
            Duration::from_millis(5),
            LogHandle::detached("vis"),
        );

        // Publishing 200 snapshots would take 20 s if each waited for a render
        let start = Instant::now();
        for i in 0..200 {
            slot.publish(test_snapshot(i));
            thread::sleep(Duration::from_millis(1));
        }
        assert!(start.elapsed() < Duration::from_secs(5));

        // Give the renderer time to pick up the final snapshot
        thread::sleep(Duration::from_millis(300));
        let stats = vis.stop();

        let shown = shown.lock().unwrap();
        assert!(!shown.is_empty());
        assert!(shown.len() < 200);
        assert_eq!(shown.last(), Some(&199));
        assert!(stats.num_dropped > 0);
        assert_eq!(stats.num_rendered, shown.len() as u64);
        assert_eq!(stats.num_rendered + stats.num_dropped, 200);
    }
}
