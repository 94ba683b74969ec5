//! Idle-expiry timer for the session.
//!
//! `reset` (re)arms the timer; when the duration elapses without another
//! reset, the active flag flips to false from the expiry task. The flag is
//! the only state shared with that task, so atomic loads/stores are the
//! whole synchronization story.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

pub struct IdleTimer {
    duration: Duration,
    active: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl IdleTimer {
    /// Created inactive; nothing is scheduled until the first `reset`.
    pub fn new(duration: Duration) -> Self {
        IdleTimer {
            duration,
            active: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Arm the timer for the full duration from now. A reset supersedes
    /// any previously scheduled expiry via the generation counter, so an
    /// already-running timer is effectively extended.
    pub fn reset(&self) {
        let armed_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.active.store(true, Ordering::SeqCst);

        let active = Arc::clone(&self.active);
        let generation = Arc::clone(&self.generation);
        let duration = self.duration;

        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if generation.load(Ordering::SeqCst) == armed_gen {
                active.store(false, Ordering::SeqCst);
            }
        });
    }
}
