use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters, including waiters whose future was dropped mid-wait.
    users: usize,
}

/// Per-output-path exclusion: at most one concat job per track is in flight.
///
/// Entries are created on demand and dropped again once nobody holds or waits
/// for them, so the map only ever contains paths with work in progress.
#[derive(Clone, Default)]
pub struct JobLocks {
    slots: Arc<Mutex<HashMap<PathBuf, Slot>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other job holds `key`, then holds it until the guard drops.
    pub async fn acquire(&self, key: &Path) -> JobGuard {
        let lock = {
            let mut map = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = map
                .entry(key.to_path_buf())
                .or_insert_with(|| Slot { lock: Arc::default(), users: 0 });
            slot.users += 1;
            slot.lock.clone()
        };
        // Registered before waiting: dropping this future mid-wait still deregisters
        let mut job = JobGuard { key: key.to_path_buf(), locks: self.clone(), guard: None };
        job.guard = Some(lock.lock_owned().await);
        job
    }

    /// Number of paths currently held or waited on.
    pub fn in_flight(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct JobGuard {
    key: PathBuf,
    locks: JobLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = map.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                map.remove(&self.key);
            }
        }
    }
}
