//! Background Track Preparation
//!
//! Prepares tracks that are likely to play next on one dedicated worker
//! thread, so starting them later doesn't stall the control thread.
//!
//! ## Architecture
//!
//! ```text
//! Control Thread                 Preparation Thread
//!        │                              │
//!        │  enqueue(track)              │
//!        │─────────────────────────────>│
//!        │                              │ TrackPreparer::prepare()
//!        │                              │ (disk I/O, may be slow)
//!        │                              │ track.mark_prepared()
//!        │  prepare_now(track)          │
//!        │─────────────────────────────>│ (after earlier tasks)
//!        │<─────────────────────────────│ Result
//!        │  flush()                     │
//!        │─────────────────────────────>│
//!        │<─────────────────────────────│ (all earlier tasks done)
//! ```
//!
//! One worker means one preparation at a time, so two threads never race
//! on the same file. The control thread's own preparations go through the
//! worker too. Tasks are never cancelled: a superseded task still runs and
//! merely refills already-correct data.

use crate::error::{InvalidTrackError, Result};
use crate::render::TrackPreparer;
use crossbeam_channel::{unbounded, Receiver, Sender};
use segue_core::Track;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

enum PrepTask {
    /// Prepare one track
    Prepare(Arc<Track>),

    /// Prepare one track and reply with the outcome
    PrepareNow(Arc<Track>, Sender<std::result::Result<(), InvalidTrackError>>),

    /// Reply once every earlier task has finished
    Flush(Sender<()>),
}

/// Serial background preparation queue
pub struct PrepQueue {
    /// Closed on drop to stop the worker
    task_tx: Option<Sender<PrepTask>>,

    /// Paths queued but not yet prepared
    pending: Arc<Mutex<HashSet<PathBuf>>>,

    /// Handle to the worker thread
    worker: Option<JoinHandle<()>>,

    /// Used inline if the worker has gone away
    preparer: Arc<dyn TrackPreparer>,
}

impl PrepQueue {
    /// Spawn the worker thread
    pub fn new(preparer: Arc<dyn TrackPreparer>) -> Result<Self> {
        let (task_tx, task_rx) = unbounded::<PrepTask>();
        let pending = Arc::new(Mutex::new(HashSet::new()));
        let worker_pending = pending.clone();
        let worker_preparer = preparer.clone();

        let worker = thread::Builder::new()
            .name("track-prep".to_string())
            .spawn(move || {
                Self::worker_thread(&task_rx, worker_preparer.as_ref(), &worker_pending);
            })?;

        Ok(Self {
            task_tx: Some(task_tx),
            pending,
            worker: Some(worker),
            preparer,
        })
    }

    /// Queue a track for preparation (non-blocking)
    ///
    /// Returns false if the track is already prepared or already queued.
    pub fn enqueue(&self, track: Arc<Track>) -> bool {
        if track.is_prepared() {
            return false;
        }
        let Some(task_tx) = &self.task_tx else {
            return false;
        };

        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if !pending.insert(track.path().to_path_buf()) {
                return false;
            }
        }

        tracing::debug!("Queued {} for preparation", track.path().display());
        let path = track.path().to_path_buf();
        if task_tx.send(PrepTask::Prepare(track)).is_err() {
            tracing::warn!("Preparation worker is gone, dropping {}", path.display());
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&path);
            return false;
        }
        true
    }

    /// Prepare a track on the worker and block until it is done
    ///
    /// Runs after every task queued earlier, so a background preparation of
    /// the same file finishes first and this call then finds the track
    /// prepared.
    pub fn prepare_now(&self, track: &Arc<Track>) -> std::result::Result<(), InvalidTrackError> {
        if track.is_prepared() {
            return Ok(());
        }
        if let Some(task_tx) = &self.task_tx {
            let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
            if task_tx
                .send(PrepTask::PrepareNow(track.clone(), reply_tx))
                .is_ok()
            {
                if let Ok(outcome) = reply_rx.recv() {
                    return outcome;
                }
            }
        }

        tracing::warn!("Preparation worker is gone, preparing {} inline", track.path().display());
        self.preparer.prepare(track)
    }

    /// Number of tracks queued but not yet prepared
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Block until every task queued so far has run
    pub fn flush(&self) {
        let Some(task_tx) = &self.task_tx else {
            return;
        };
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        if task_tx.send(PrepTask::Flush(done_tx)).is_ok() {
            // An error means the worker exited, which also means nothing is left
            let _ = done_rx.recv();
        }
    }

    fn worker_thread(
        task_rx: &Receiver<PrepTask>,
        preparer: &dyn TrackPreparer,
        pending: &Mutex<HashSet<PathBuf>>,
    ) {
        tracing::debug!("Preparation worker started");

        // Ends when every sender is dropped
        for task in task_rx {
            match task {
                PrepTask::Prepare(track) => {
                    if !track.is_prepared() {
                        let start = std::time::Instant::now();
                        match preparer.prepare(&track) {
                            Ok(()) => {
                                track.mark_prepared();
                                tracing::debug!(
                                    "Prepared {} in {}ms",
                                    track.path().display(),
                                    start.elapsed().as_millis()
                                );
                            }
                            Err(e) => {
                                track.mark_invalid();
                                tracing::warn!("Background preparation failed: {}", e);
                            }
                        }
                    }
                    pending
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(track.path());
                }
                PrepTask::PrepareNow(track, reply_tx) => {
                    let outcome = if track.is_prepared() {
                        Ok(())
                    } else {
                        preparer.prepare(&track).map(|()| track.mark_prepared())
                    };
                    let _ = reply_tx.send(outcome);
                }
                PrepTask::Flush(done_tx) => {
                    let _ = done_tx.send(());
                }
            }
        }

        tracing::debug!("Preparation worker exiting");
    }
}

impl Drop for PrepQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued tasks and exit
        self.task_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Preparation worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for PrepQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrepQueue")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
