//! Per-tutor mutual exclusion for review writes
//!
//! One async mutex per tutor id, created on first use and removed from the
//! registry when the last holder or waiter lets go. Writes for different
//! tutors never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type Registry = Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>;

/// Keyed lock registry shared through `AppState`
#[derive(Clone, Default)]
pub struct TutorLocks {
    registry: Registry,
}

/// Held for the duration of one tutor's upsert + recompute
pub struct TutorLockGuard {
    tutor_id: Uuid,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
}

fn registry_guard(registry: &Registry) -> MutexGuard<'_, HashMap<Uuid, Arc<AsyncMutex<()>>>> {
    // The map holds no invariants a panicking holder could break
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TutorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `tutor_id`
    pub async fn acquire(&self, tutor_id: Uuid) -> TutorLockGuard {
        let lock = {
            let mut map = registry_guard(&self.registry);
            map.entry(tutor_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = lock.clone().lock_owned().await;

        TutorLockGuard {
            tutor_id,
            lock,
            guard: Some(guard),
            registry: self.registry.clone(),
        }
    }

    /// Number of tutors with a live lock entry
    pub fn active(&self) -> usize {
        registry_guard(&self.registry).len()
    }
}

impl TutorLockGuard {
    pub fn tutor_id(&self) -> Uuid {
        self.tutor_id
    }
}

impl Drop for TutorLockGuard {
    fn drop(&mut self) {
        self.guard.take();

        let mut map = registry_guard(&self.registry);
        // Remaining references: the map entry and `self.lock`. Any waiter
        // cloned the Arc under this same registry mutex, so the count is stable.
        if Arc::strong_count(&self.lock) == 2 {
            if let Some(entry) = map.get(&self.tutor_id) {
                if Arc::ptr_eq(entry, &self.lock) {
                    map.remove(&self.tutor_id);
                }
            }
        }
    }
}
