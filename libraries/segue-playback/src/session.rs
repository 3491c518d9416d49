//! Playback sessions
//!
//! A session is "the current act of playing one track". Every play, every
//! seek that reschedules audio and every loop-boundary change starts a new
//! session with a fresh [`SessionId`]; the previous one goes stale at once.
//! Render-side completion callbacks carry the id they were scheduled under
//! and are dropped when [`SessionRegistry::is_current`] says it's stale.

use segue_core::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Unique, monotonically increasing session identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Raw value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A→B segment loop
///
/// Incomplete while only the start is marked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackLoop {
    /// Loop start in seconds
    pub start_time: f64,

    /// Loop end in seconds, once marked
    pub end_time: Option<f64>,
}

impl PlaybackLoop {
    /// Loop with only its start marked
    pub fn starting_at(start_time: f64) -> Self {
        Self {
            start_time,
            end_time: None,
        }
    }

    /// Complete loop; bounds given in the wrong order are swapped
    pub fn between(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time: start_time.min(end_time),
            end_time: Some(start_time.max(end_time)),
        }
    }

    /// Complete this loop at `end_time`
    #[must_use]
    pub fn completed_at(self, end_time: f64) -> Self {
        Self::between(self.start_time, end_time)
    }

    /// Whether both bounds are marked
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whether `time` lies in `[start, end)` of a complete loop
    pub fn contains(&self, time: f64) -> bool {
        match self.end_time {
            Some(end) => time >= self.start_time && time < end,
            None => false,
        }
    }

    /// Loop length in seconds, once complete
    pub fn duration(&self) -> Option<f64> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// One act of playing a track
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: SessionId,
    track: Arc<Track>,
    started_at: Instant,
    playback_loop: Option<PlaybackLoop>,
}

impl PlaybackSession {
    /// Session identity
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Track being played
    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    /// When the session started
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the session started
    pub fn time_elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Segment loop, if any
    pub fn playback_loop(&self) -> Option<PlaybackLoop> {
        self.playback_loop
    }

    /// Whether a complete loop is defined
    pub fn has_complete_loop(&self) -> bool {
        self.playback_loop.is_some_and(|l| l.is_complete())
    }
}

#[derive(Debug)]
struct RegistryInner {
    next_id: AtomicU64,

    /// Id of the current session, 0 when none
    current_id: AtomicU64,

    current: Mutex<Option<Arc<PlaybackSession>>>,
}

/// The single "current session" slot
///
/// Cheap to clone; clones share the slot. Render threads hold a clone and
/// only ever call [`is_current`](Self::is_current).
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                next_id: AtomicU64::new(1),
                current_id: AtomicU64::new(0),
                current: Mutex::new(None),
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<PlaybackSession>>> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new session, making every earlier one stale
    pub fn start(&self, track: Arc<Track>, playback_loop: Option<PlaybackLoop>) -> Arc<PlaybackSession> {
        let id = SessionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let session = Arc::new(PlaybackSession {
            id,
            track,
            started_at: Instant::now(),
            playback_loop,
        });

        let mut slot = self.slot();
        *slot = Some(session.clone());
        self.inner.current_id.store(id.0, Ordering::Release);
        tracing::debug!("Started session {} for {}", id, session.track.path().display());
        session
    }

    /// Start a new session for the current track, with a different loop
    pub fn restart(&self, playback_loop: Option<PlaybackLoop>) -> Option<Arc<PlaybackSession>> {
        let track = self.current()?.track.clone();
        Some(self.start(track, playback_loop))
    }

    /// Change the current session's loop without invalidating it
    ///
    /// Used when marking a loop start, which does not reschedule audio.
    pub fn update_loop(&self, playback_loop: Option<PlaybackLoop>) -> Option<Arc<PlaybackSession>> {
        let mut slot = self.slot();
        let current = slot.as_ref()?;
        let updated = Arc::new(PlaybackSession {
            id: current.id,
            track: current.track.clone(),
            started_at: current.started_at,
            playback_loop,
        });
        *slot = Some(updated.clone());
        Some(updated)
    }

    /// End the current session; every session is stale afterwards
    pub fn end(&self) {
        let mut slot = self.slot();
        if let Some(session) = slot.take() {
            tracing::debug!("Ended session {}", session.id);
        }
        self.inner.current_id.store(0, Ordering::Release);
    }

    /// Current session
    pub fn current(&self) -> Option<Arc<PlaybackSession>> {
        self.slot().clone()
    }

    /// Id of the current session
    pub fn current_id(&self) -> Option<SessionId> {
        match self.inner.current_id.load(Ordering::Acquire) {
            0 => None,
            id => Some(SessionId(id)),
        }
    }

    /// Whether `id` is still the current session
    pub fn is_current(&self, id: SessionId) -> bool {
        self.inner.current_id.load(Ordering::Acquire) == id.0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// What a seek request turns into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// Seek to `time`
    Seek {
        /// Corrected target in seconds
        time: f64,

        /// Whether the loop had to be removed to honor the request
        loop_removed: bool,
    },

    /// The target is at or past the end of a playing track
    TrackCompleted,
}

/// Correct a requested seek against the track length and the loop
///
/// Inside a complete loop, a target outside `[start, end)` snaps to the loop
/// start unless `can_leave_loop` is set, in which case the loop is dropped.
pub fn correct_seek(
    time: f64,
    duration: Option<f64>,
    playback_loop: Option<&PlaybackLoop>,
    can_leave_loop: bool,
    is_playing: bool,
) -> SeekOutcome {
    let mut time = time.max(0.0);
    if let Some(duration) = duration {
        time = time.min(duration);
    }

    let mut loop_removed = false;
    if let Some(complete) = playback_loop.filter(|l| l.is_complete()) {
        if !complete.contains(time) {
            if can_leave_loop {
                loop_removed = true;
            } else {
                time = complete.start_time;
            }
        }
    }

    match duration {
        Some(duration) if is_playing && time >= duration => SeekOutcome::TrackCompleted,
        _ => SeekOutcome::Seek { time, loop_removed },
    }
}
